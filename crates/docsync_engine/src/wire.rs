//! JSON payloads of the document service and their mapping onto core types.

use docsync_core::{Document, DocumentId, DocumentStatus, ProcessingSteps, StatusReport};
use docsync_logging::sync_warn;
use serde::Deserialize;

use crate::{AcceptedUpload, FailureKind, ServiceError};

/// Ids are uuid strings from the server but plain numbers in older listings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(u64),
}

impl From<WireId> for DocumentId {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Text(text) => DocumentId::new(text),
            WireId::Number(number) => DocumentId::new(number.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPayload {
    Wrapped { pdfs: Vec<WireDocument> },
    Bare(Vec<WireDocument>),
}

impl ListPayload {
    /// Converts the listing, skipping records with a status this client does not know.
    pub(crate) fn into_documents(self) -> Vec<Document> {
        let records = match self {
            ListPayload::Wrapped { pdfs } => pdfs,
            ListPayload::Bare(records) => records,
        };
        records
            .into_iter()
            .filter_map(|record| match record.into_document() {
                Ok(doc) => Some(doc),
                Err(err) => {
                    sync_warn!("Skipping listed document: {}", err);
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDocument {
    id: WireId,
    #[serde(alias = "original_name")]
    name: String,
    #[serde(default, alias = "upload_date")]
    date: String,
    #[serde(default)]
    size: String,
    status: String,
    #[serde(rename = "fileUrl", default)]
    file_url: String,
    #[serde(rename = "chunksCount", alias = "chunks_count", default)]
    chunks_count: Option<u32>,
    #[serde(default, alias = "processingSteps")]
    processing_steps: Option<WireSteps>,
}

impl WireDocument {
    fn into_document(self) -> Result<Document, ServiceError> {
        let status = parse_status(&self.status)?;
        Ok(Document {
            id: self.id.into(),
            name: self.name,
            uploaded_at: self.date.chars().take(10).collect(),
            size_label: self.size,
            status,
            processing_steps: self
                .processing_steps
                .filter(|_| !status.is_terminal())
                .map(WireSteps::into_steps),
            chunks_count: self
                .chunks_count
                .filter(|_| status == DocumentStatus::Completed),
            file_url: self.file_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSteps {
    #[serde(default)]
    current_step: u32,
    #[serde(default)]
    total_steps: u32,
    #[serde(default)]
    description: String,
}

impl WireSteps {
    fn into_steps(self) -> ProcessingSteps {
        ProcessingSteps::new(self.description, self.current_step, self.total_steps)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    pub(crate) error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadPayload {
    #[serde(default)]
    success: bool,
    file_id: Option<String>,
    status: Option<String>,
    filename: Option<String>,
    error: Option<String>,
}

impl UploadPayload {
    pub(crate) fn into_accepted(self) -> Result<AcceptedUpload, ServiceError> {
        accepted(self.success, self.file_id, self.status, self.filename, self.error)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchPayload {
    #[serde(default)]
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) results: Vec<BatchItem>,
    pub(crate) error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchItem {
    pub(crate) filename: Option<String>,
    #[serde(default)]
    success: bool,
    file_id: Option<String>,
    status: Option<String>,
    error: Option<String>,
}

impl BatchItem {
    pub(crate) fn into_accepted(self) -> Result<AcceptedUpload, ServiceError> {
        accepted(self.success, self.file_id, self.status, self.filename, self.error)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeletePayload {
    #[serde(default)]
    success: bool,
    error: Option<String>,
}

impl DeletePayload {
    pub(crate) fn into_result(self) -> Result<(), ServiceError> {
        match (self.success, self.error) {
            (_, Some(error)) => Err(ServiceError::new(FailureKind::ServerReported, error)),
            (false, None) => Err(ServiceError::new(
                FailureKind::ServerReported,
                "server did not confirm deletion",
            )),
            (true, None) => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProcessedPayload {
    status: Option<String>,
    #[serde(default)]
    processing_steps: Option<WireSteps>,
    chunks_count: Option<u32>,
    chunks: Option<Vec<serde_json::Value>>,
    error: Option<String>,
}

impl ProcessedPayload {
    pub(crate) fn into_report(self) -> Result<StatusReport, ServiceError> {
        if let Some(error) = self.error {
            return Err(ServiceError::new(FailureKind::ServerReported, error));
        }
        let raw = self
            .status
            .ok_or_else(|| ServiceError::new(FailureKind::Decode, "status missing"))?;
        let status = parse_status(&raw)?;
        let chunks_count = self
            .chunks_count
            .or_else(|| self.chunks.as_ref().map(|chunks| chunks.len() as u32))
            .filter(|_| status == DocumentStatus::Completed);
        Ok(StatusReport {
            status,
            processing_steps: self
                .processing_steps
                .filter(|_| !status.is_terminal())
                .map(WireSteps::into_steps),
            chunks_count,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarkdownPayload {
    #[serde(default)]
    pub(crate) markdown: String,
}

fn accepted(
    success: bool,
    file_id: Option<String>,
    status: Option<String>,
    filename: Option<String>,
    error: Option<String>,
) -> Result<AcceptedUpload, ServiceError> {
    if let Some(error) = error {
        return Err(ServiceError::new(FailureKind::ServerReported, error));
    }
    if !success {
        return Err(ServiceError::new(
            FailureKind::ServerReported,
            "server did not accept the upload",
        ));
    }
    let file_id = file_id
        .ok_or_else(|| ServiceError::new(FailureKind::Decode, "file_id missing"))?;
    let status = match status {
        Some(raw) => parse_status(&raw)?,
        None => DocumentStatus::Uploading,
    };
    Ok(AcceptedUpload {
        document_id: DocumentId::new(file_id),
        status,
        stored_filename: filename,
    })
}

fn parse_status(raw: &str) -> Result<DocumentStatus, ServiceError> {
    DocumentStatus::parse(raw)
        .ok_or_else(|| ServiceError::new(FailureKind::Decode, format!("unknown status {raw:?}")))
}
