use std::fmt;

use docsync_core::{DocumentId, DocumentStatus};
use thiserror::Error;

/// A file the server accepted for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub document_id: DocumentId,
    pub status: DocumentStatus,
    pub stored_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Network-level failure, as opposed to a failure the server reported.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, FailureKind::Transport | FailureKind::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Transport,
    Timeout,
    HttpStatus(u16),
    ServerReported,
    Decode,
    FileRead,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Transport => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::ServerReported => write!(f, "server reported failure"),
            FailureKind::Decode => write!(f, "unexpected response"),
            FailureKind::FileRead => write!(f, "could not read file"),
        }
    }
}
