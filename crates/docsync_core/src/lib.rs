//! Docsync core: pure document synchronisation state machine and view-model helpers.
mod document;
mod effect;
mod msg;
mod poller;
mod registry;
mod selection;
mod state;
mod update;
mod upload;
mod view_model;

pub use document::{
    size_label, Document, DocumentId, DocumentStatus, PollToken, ProcessingSteps, UploadId,
};
pub use effect::Effect;
pub use msg::{Msg, StatusReport, UploadReceipt};
pub use poller::PollSet;
pub use registry::{Registry, Upsert};
pub use selection::{Detail, Selection};
pub use state::{AppState, Notice};
pub use update::update;
pub use upload::{
    screen, FileCandidate, InvalidFile, RejectReason, SubmitError, SubmitReport, UploadTask,
};
pub use view_model::{AppViewModel, DocumentRow, SelectedView, UploadRow};
