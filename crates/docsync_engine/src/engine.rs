use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use docsync_core::{DocumentId, Effect, Msg, UploadReceipt};
use docsync_logging::{sync_debug, sync_warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::service::{ChannelProgressSink, DocumentService, ProgressSink, ServiceSettings};
use crate::{AcceptedUpload, ServiceError};

/// Produces the upload date stamped on newly accepted documents.
pub type DateSource = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    pub settings: ServiceSettings,
    pub today: DateSource,
}

impl EngineConfig {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            settings,
            today: Arc::new(|| Local::now().date_naive().format("%Y-%m-%d").to_string()),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(ServiceSettings::default())
    }
}

/// Executes effects as tokio tasks and feeds their results back as messages.
pub struct EngineHandle {
    service: Arc<dyn DocumentService>,
    msg_tx: UnboundedSender<Msg>,
    today: DateSource,
    root: CancellationToken,
    polls: HashMap<DocumentId, PollTask>,
}

struct PollTask {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EngineHandle {
    pub fn new(
        service: Arc<dyn DocumentService>,
        msg_tx: UnboundedSender<Msg>,
        today: DateSource,
    ) -> Self {
        Self {
            service,
            msg_tx,
            today,
            root: CancellationToken::new(),
            polls: HashMap::new(),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::RefreshList => {
                let service = self.service.clone();
                self.spawn(self.root.child_token(), async move {
                    let result = service.list().await.map_err(|err| err.to_string());
                    vec![Msg::DocumentListLoaded(result)]
                });
            }
            Effect::UploadOne { upload_id, file } => {
                let service = self.service.clone();
                let sink = self.progress_sink();
                let today = self.today.clone();
                self.spawn(self.root.child_token(), async move {
                    let result = service.upload_one(upload_id, &file, sink).await;
                    vec![Msg::UploadFinished {
                        upload_id,
                        result: into_receipt(result, today.as_ref()),
                    }]
                });
            }
            Effect::UploadBatch { files } => {
                let service = self.service.clone();
                let sink = self.progress_sink();
                let today = self.today.clone();
                self.spawn(self.root.child_token(), async move {
                    match service.upload_batch(&files, sink).await {
                        Ok(outcome) => outcome
                            .into_iter()
                            .map(|(upload_id, result)| Msg::UploadFinished {
                                upload_id,
                                result: into_receipt(result, today.as_ref()),
                            })
                            .collect(),
                        Err(err) => {
                            let message = err.to_string();
                            files
                                .iter()
                                .map(|(upload_id, _)| Msg::UploadFinished {
                                    upload_id: *upload_id,
                                    result: Err(message.clone()),
                                })
                                .collect()
                        }
                    }
                });
            }
            Effect::PollStatus { id, token } => {
                let cancel = self.root.child_token();
                let service = self.service.clone();
                let key = id.clone();
                let task = self.spawn(cancel.clone(), async move {
                    let result = service.status(&id).await.map_err(|err| err.to_string());
                    vec![Msg::StatusPolled { id, token, result }]
                });
                if let Some(previous) = self.polls.insert(key, PollTask { cancel, task }) {
                    previous.cancel.cancel();
                }
            }
            Effect::CancelPoll { id } => {
                if let Some(poll) = self.polls.remove(&id) {
                    sync_debug!("Cancelling status poll for {}", id);
                    poll.cancel.cancel();
                }
            }
            Effect::DeleteDocument { id } => {
                let service = self.service.clone();
                self.spawn(self.root.child_token(), async move {
                    let result = service.delete(&id).await.map_err(|err| err.to_string());
                    vec![Msg::DeleteFinished { id, result }]
                });
            }
            Effect::FetchMarkdown { id } => {
                let service = self.service.clone();
                self.spawn(self.root.child_token(), async move {
                    let result = service.markdown(&id).await.map_err(|err| err.to_string());
                    vec![Msg::MarkdownLoaded { id, result }]
                });
            }
        }
    }

    /// Cancels every in-flight request. Effects executed afterwards run normally.
    pub fn shutdown(&mut self) {
        self.root.cancel();
        self.root = CancellationToken::new();
        self.polls.clear();
    }

    /// Status requests that have neither finished nor been cancelled.
    pub fn in_flight_polls(&self) -> usize {
        self.polls
            .values()
            .filter(|poll| !poll.cancel.is_cancelled() && !poll.task.is_finished())
            .count()
    }

    fn progress_sink(&self) -> Arc<dyn ProgressSink> {
        Arc::new(ChannelProgressSink::new(self.msg_tx.clone()))
    }

    fn spawn<F>(&self, cancel: CancellationToken, task: F) -> JoinHandle<()>
    where
        F: Future<Output = Vec<Msg>> + Send + 'static,
    {
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                msgs = task => {
                    for msg in msgs {
                        if msg_tx.send(msg).is_err() {
                            sync_warn!("Coordinator gone; dropping engine result");
                            break;
                        }
                    }
                }
            }
        })
    }
}

fn into_receipt(
    result: Result<AcceptedUpload, ServiceError>,
    today: &(dyn Fn() -> String + Send + Sync),
) -> Result<UploadReceipt, String> {
    result
        .map(|accepted| UploadReceipt {
            document_id: accepted.document_id,
            status: accepted.status,
            stored_filename: accepted.stored_filename,
            uploaded_at: today(),
        })
        .map_err(|err| err.to_string())
}
