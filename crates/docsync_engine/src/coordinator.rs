use std::sync::Arc;
use std::time::Duration;

use docsync_core::{
    update, AppState, AppViewModel, DocumentId, FileCandidate, Msg, SubmitError, SubmitReport,
};
use docsync_logging::{sync_debug, sync_info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::engine::{EngineConfig, EngineHandle};
use crate::service::{DocumentService, ReqwestDocumentService};
use crate::timer::PollTimer;
use crate::ServiceError;

/// Owns the document state and drives it: every message goes through
/// `docsync_core::update` here, and the resulting effects go to the engine.
///
/// All methods must be called from within a tokio runtime.
pub struct Coordinator {
    state: AppState,
    engine: EngineHandle,
    msg_tx: UnboundedSender<Msg>,
    msg_rx: UnboundedReceiver<Msg>,
    timer: Option<PollTimer>,
    poll_interval: Duration,
}

impl Coordinator {
    pub fn new(config: EngineConfig, service: Arc<dyn DocumentService>) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let engine = EngineHandle::new(service, msg_tx.clone(), config.today.clone());
        Self {
            state: AppState::new(),
            engine,
            msg_tx,
            msg_rx,
            timer: None,
            poll_interval: config.settings.poll_interval,
        }
    }

    /// Builds a coordinator talking HTTP to `config.settings.base_url`.
    pub fn connect(config: EngineConfig) -> Result<Self, ServiceError> {
        let service = ReqwestDocumentService::new(config.settings.clone())?;
        Ok(Self::new(config, Arc::new(service)))
    }

    /// Loads the document list and starts the poll timer.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        sync_info!("Starting document sync, polling every {:?}", self.poll_interval);
        self.dispatch(Msg::RefreshRequested);
        self.timer = Some(PollTimer::start(self.poll_interval, self.msg_tx.clone()));
    }

    /// Stops the poll timer and cancels every in-flight request.
    ///
    /// Polls that were in flight are polled again after the next `start`;
    /// cancelled uploads are reported as failed.
    pub fn stop(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
            sync_info!("Stopped document sync");
        }
        self.engine.shutdown();
        // Results of cancelled requests still queued would refer to abandoned work.
        while self.msg_rx.try_recv().is_ok() {}
        self.dispatch(Msg::EngineStopped);
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(PollTimer::is_running)
    }

    /// Applies one message and executes the effects it produced.
    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            sync_debug!("Executing {:?}", effect);
            self.engine.execute(effect);
        }
    }

    /// Screens and submits files for upload. Rejections are reported here, before any request.
    pub fn submit(&mut self, files: Vec<FileCandidate>) -> Result<SubmitReport, SubmitError> {
        self.dispatch(Msg::FilesSubmitted(files));
        match self.state.last_submit() {
            Some(outcome) => outcome.clone(),
            None => Err(SubmitError::NoValidFiles {
                rejected: Vec::new(),
            }),
        }
    }

    pub fn select(&mut self, id: DocumentId) {
        self.dispatch(Msg::DocumentSelected(id));
    }

    /// Deletes a document the user has already confirmed.
    pub fn delete(&mut self, id: DocumentId) {
        self.dispatch(Msg::DeleteRequested(id));
    }

    pub fn refresh(&mut self) {
        self.dispatch(Msg::RefreshRequested);
    }

    pub fn dismiss_notices(&mut self) {
        self.dispatch(Msg::NoticesDismissed);
    }

    /// Runs one poll round now, independent of the timer.
    pub fn tick_now(&mut self) {
        self.dispatch(Msg::PollTick);
    }

    /// Applies every message already queued. Returns how many were applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
            applied += 1;
        }
        applied
    }

    /// Waits for the next message and applies it.
    pub async fn next(&mut self) -> bool {
        match self.msg_rx.recv().await {
            Some(msg) => {
                self.dispatch(msg);
                true
            }
            None => false,
        }
    }

    /// Applies messages until `done` holds for the state or `timeout` passes.
    pub async fn run_until(
        &mut self,
        timeout: Duration,
        mut done: impl FnMut(&AppState) -> bool,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        self.process_pending();
        while !done(&self.state) {
            match tokio::time::timeout_at(deadline, self.msg_rx.recv()).await {
                Ok(Some(msg)) => self.dispatch(msg),
                Ok(None) | Err(_) => return false,
            }
        }
        true
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    pub fn in_flight_polls(&self) -> usize {
        self.engine.in_flight_polls()
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}
