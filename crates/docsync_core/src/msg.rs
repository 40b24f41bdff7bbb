use crate::{
    Document, DocumentId, DocumentStatus, FileCandidate, PollToken, ProcessingSteps, UploadId,
};

/// Server acknowledgement of one accepted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub document_id: DocumentId,
    pub status: DocumentStatus,
    /// Name the server stored the file under, when reported.
    pub stored_filename: Option<String>,
    /// Date the upload was accepted, `YYYY-MM-DD`.
    pub uploaded_at: String,
}

/// Authoritative processing state of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: DocumentStatus,
    pub processing_steps: Option<ProcessingSteps>,
    pub chunks_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked files for upload.
    FilesSubmitted(Vec<FileCandidate>),
    /// Byte progress of one file in transfer.
    UploadProgress { upload_id: UploadId, percent: u8 },
    /// Transfer of one file finished, in any order relative to its batch.
    UploadFinished {
        upload_id: UploadId,
        result: Result<UploadReceipt, String>,
    },
    /// User asked for a fresh listing.
    RefreshRequested,
    /// Full listing arrived from the server.
    DocumentListLoaded(Result<Vec<Document>, String>),
    /// The poll interval fired.
    PollTick,
    /// Status poll for one subscription came back.
    StatusPolled {
        id: DocumentId,
        token: PollToken,
        result: Result<StatusReport, String>,
    },
    /// User selected a document.
    DocumentSelected(DocumentId),
    /// Rendered text for a document arrived.
    MarkdownLoaded {
        id: DocumentId,
        result: Result<String, String>,
    },
    /// User confirmed deletion of a document.
    DeleteRequested(DocumentId),
    /// Server answered a deletion.
    DeleteFinished {
        id: DocumentId,
        result: Result<(), String>,
    },
    /// Every outstanding request was abandoned by the engine.
    EngineStopped,
    /// User acknowledged the shown notices.
    NoticesDismissed,
    /// UI/render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
