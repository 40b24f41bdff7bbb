//! Docsync engine: document service client, effect execution and the coordinator loop.
mod coordinator;
mod engine;
mod service;
mod timer;
mod types;
mod wire;

pub use coordinator::Coordinator;
pub use engine::{DateSource, EngineConfig, EngineHandle};
pub use service::{
    BatchOutcome, ChannelProgressSink, DocumentService, ProgressSink, ReqwestDocumentService,
    ServiceSettings,
};
pub use timer::PollTimer;
pub use types::{AcceptedUpload, FailureKind, ServiceError};
