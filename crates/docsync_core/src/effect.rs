use crate::{DocumentId, FileCandidate, PollToken, UploadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RefreshList,
    UploadOne {
        upload_id: UploadId,
        file: FileCandidate,
    },
    UploadBatch {
        files: Vec<(UploadId, FileCandidate)>,
    },
    PollStatus {
        id: DocumentId,
        token: PollToken,
    },
    CancelPoll {
        id: DocumentId,
    },
    DeleteDocument {
        id: DocumentId,
    },
    FetchMarkdown {
        id: DocumentId,
    },
}
