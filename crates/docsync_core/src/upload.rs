use std::path::PathBuf;

use thiserror::Error;

use crate::UploadId;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A file the user picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl FileCandidate {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            content_type: None,
            size_bytes,
            path,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// PDF content type or a `.pdf` extension, case-insensitive.
    pub fn is_pdf(&self) -> bool {
        let by_type = self.content_type.as_deref().is_some_and(|ct| {
            let ct = ct.split(';').next().unwrap_or(ct).trim();
            ct.eq_ignore_ascii_case(PDF_CONTENT_TYPE)
        });
        by_type || self.name.to_ascii_lowercase().ends_with(".pdf")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidFileType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFile {
    pub name: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("no valid PDF files among {} candidate(s)", rejected.len())]
    NoValidFiles { rejected: Vec<InvalidFile> },
}

/// Outcome of screening a submission that had at least one valid file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    pub accepted: Vec<UploadId>,
    pub rejected: Vec<InvalidFile>,
}

/// One file mid-transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub upload_id: UploadId,
    pub file: FileCandidate,
    pub percent: u8,
}

/// Splits candidates into PDFs and per-file rejections.
pub fn screen(
    files: Vec<FileCandidate>,
) -> Result<(Vec<FileCandidate>, Vec<InvalidFile>), SubmitError> {
    let (valid, invalid): (Vec<_>, Vec<_>) = files.into_iter().partition(FileCandidate::is_pdf);
    let rejected: Vec<InvalidFile> = invalid
        .into_iter()
        .map(|file| InvalidFile {
            name: file.name,
            reason: RejectReason::InvalidFileType,
        })
        .collect();
    if valid.is_empty() {
        return Err(SubmitError::NoValidFiles { rejected });
    }
    Ok((valid, rejected))
}
