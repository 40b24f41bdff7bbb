use std::fmt;

/// Server-assigned document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Client-side handle for a file in transfer. Never used as a registry key.
pub type UploadId = u64;

/// Token of one poll subscription; a new subscription for the same id gets a new token.
pub type PollToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    Pending,
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Uploading => "uploading",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }

    /// Parses a server status string. `cancelled` is reported by the server
    /// when processing was aborted and is folded into `Failed`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(DocumentStatus::Pending),
            "uploading" => Some(DocumentStatus::Uploading),
            "processing" => Some(DocumentStatus::Processing),
            "completed" => Some(DocumentStatus::Completed),
            "failed" | "cancelled" => Some(DocumentStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of server-side pipeline progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingSteps {
    pub description: String,
    current_step: u32,
    total_steps: u32,
}

impl ProcessingSteps {
    /// Builds a snapshot, clamping `current_step` to `total_steps`.
    pub fn new(description: impl Into<String>, current_step: u32, total_steps: u32) -> Self {
        Self {
            description: description.into(),
            current_step: current_step.min(total_steps),
            total_steps,
        }
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Percentage of completed pipeline steps, 0 when the total is unknown.
    pub fn percent(&self) -> u8 {
        if self.total_steps == 0 {
            return 0;
        }
        (u64::from(self.current_step) * 100 / u64::from(self.total_steps)) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub uploaded_at: String,
    pub size_label: String,
    pub status: DocumentStatus,
    pub processing_steps: Option<ProcessingSteps>,
    pub chunks_count: Option<u32>,
    pub file_url: String,
}

impl Document {
    /// Drops pipeline progress from documents that have settled.
    pub(crate) fn normalized(mut self) -> Self {
        if self.status.is_terminal() {
            self.processing_steps = None;
        }
        self
    }
}

/// Formats a byte count the way the document list labels sizes.
pub fn size_label(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}
