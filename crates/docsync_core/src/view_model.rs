use crate::{Detail, Document, Notice, SubmitError, SubmitReport, UploadId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub documents: Vec<DocumentRow>,
    pub uploads: Vec<UploadRow>,
    pub selected: Option<SelectedView>,
    pub tracked_count: usize,
    pub notices: Vec<Notice>,
    pub last_submit: Option<Result<SubmitReport, SubmitError>>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents
            .iter()
            .map(|row| &row.document)
            .find(|doc| doc.id.as_str() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub document: Document,
    pub selected: bool,
    /// The poller is still following this document.
    pub tracked: bool,
    pub deleting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRow {
    pub upload_id: UploadId,
    pub name: String,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedView {
    pub document: Document,
    pub detail: Option<Detail>,
}
