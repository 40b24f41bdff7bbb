use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use docsync_logging::sync_debug;

use crate::view_model::{AppViewModel, DocumentRow, SelectedView, UploadRow};
use crate::{
    Detail, Document, DocumentId, FileCandidate, PollSet, Registry, Selection, SubmitError,
    SubmitReport, UploadId, UploadTask,
};

/// A user-visible failure of a user-initiated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    UploadFailed { name: String, message: String },
    DeleteFailed { id: DocumentId, message: String },
    RefreshFailed { message: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UploadFailed { name, message } => {
                write!(f, "upload of {name} failed: {message}")
            }
            Notice::DeleteFailed { id, message } => write!(f, "delete of {id} failed: {message}"),
            Notice::RefreshFailed { message } => {
                write!(f, "refreshing the list failed: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) registry: Registry,
    pub(crate) polls: PollSet,
    pub(crate) selection: Selection,
    uploads: BTreeMap<UploadId, UploadTask>,
    next_upload_id: UploadId,
    deleting: HashSet<DocumentId>,
    removed: HashSet<DocumentId>,
    /// Accepted uploads not yet confirmed by a listing, with the number of
    /// listing requests issued before their acceptance.
    fresh: HashMap<DocumentId, u64>,
    refreshes_issued: u64,
    listings_received: u64,
    notices: Vec<Notice>,
    last_submit: Option<Result<SubmitReport, SubmitError>>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn polls(&self) -> &PollSet {
        &self.polls
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn uploads(&self) -> impl Iterator<Item = &UploadTask> + '_ {
        self.uploads.values()
    }

    /// Result of screening the most recent submission.
    pub fn last_submit(&self) -> Option<&Result<SubmitReport, SubmitError>> {
        self.last_submit.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn view(&self) -> AppViewModel {
        let documents = self
            .registry
            .iter()
            .map(|doc| DocumentRow {
                selected: self.selection.is_selected(&doc.id),
                tracked: self.polls.contains(&doc.id),
                deleting: self.deleting.contains(&doc.id),
                document: doc.clone(),
            })
            .collect();
        let uploads = self
            .uploads
            .values()
            .map(|task| UploadRow {
                upload_id: task.upload_id,
                name: task.file.name.clone(),
                percent: task.percent,
            })
            .collect();
        let selected = self
            .selection
            .current()
            .and_then(|id| self.registry.get(id))
            .map(|doc| SelectedView {
                document: doc.clone(),
                detail: self.selection.detail().cloned(),
            });

        AppViewModel {
            documents,
            uploads,
            selected,
            tracked_count: self.polls.len(),
            notices: self.notices.clone(),
            last_submit: self.last_submit.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn record_submission(&mut self, outcome: Result<SubmitReport, SubmitError>) {
        self.last_submit = Some(outcome);
        self.mark_dirty();
    }

    pub(crate) fn start_upload(&mut self, file: FileCandidate) -> UploadId {
        self.next_upload_id += 1;
        let upload_id = self.next_upload_id;
        self.uploads.insert(
            upload_id,
            UploadTask {
                upload_id,
                file,
                percent: 0,
            },
        );
        self.mark_dirty();
        upload_id
    }

    pub(crate) fn set_upload_progress(&mut self, upload_id: UploadId, percent: u8) {
        let Some(task) = self.uploads.get_mut(&upload_id) else {
            return;
        };
        let percent = percent.min(100);
        if percent > task.percent {
            task.percent = percent;
            self.dirty = true;
        }
    }

    pub(crate) fn take_upload(&mut self, upload_id: UploadId) -> Option<UploadTask> {
        let task = self.uploads.remove(&upload_id);
        if task.is_some() {
            self.mark_dirty();
        }
        task
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
        self.mark_dirty();
    }

    pub(crate) fn clear_notices(&mut self) {
        if !self.notices.is_empty() {
            self.notices.clear();
            self.mark_dirty();
        }
    }

    /// Records an outgoing delete. Returns `false` when one is already in flight.
    pub(crate) fn begin_delete(&mut self, id: &DocumentId) -> bool {
        if !self.deleting.insert(id.clone()) {
            return false;
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn end_delete(&mut self, id: &DocumentId) {
        self.deleting.remove(id);
        self.mark_dirty();
    }

    /// Removes a deleted document everywhere and remembers its id so late
    /// responses cannot bring it back. Returns whether a poll was cancelled.
    pub(crate) fn forget_document(&mut self, id: &DocumentId) -> bool {
        self.registry.remove(id);
        self.removed.insert(id.clone());
        self.fresh.remove(id);
        self.selection.clear_if_removed(id);
        self.mark_dirty();
        self.polls.cancel(id)
    }

    pub(crate) fn note_refreshes(&mut self, count: usize) {
        self.refreshes_issued += count as u64;
    }

    pub(crate) fn note_listing_failed(&mut self) {
        self.listings_received += 1;
    }

    /// Remembers an accepted upload so listings requested before it cannot drop it.
    pub(crate) fn mark_fresh(&mut self, id: DocumentId) {
        self.fresh.insert(id, self.refreshes_issued);
    }

    /// Counts an arrived listing and returns the fresh documents it may not know
    /// about yet, in display order. Listings are assumed to answer in request order.
    pub(crate) fn unlisted_fresh(&mut self, listed: &HashSet<&DocumentId>) -> Vec<Document> {
        self.listings_received += 1;
        let received = self.listings_received;
        self.fresh
            .retain(|id, issued_before| !listed.contains(id) && received <= *issued_before);
        self.registry
            .iter()
            .filter(|doc| self.fresh.contains_key(&doc.id))
            .cloned()
            .collect()
    }

    /// Forgets outstanding requests after the engine abandoned them. Abandoned
    /// polls become due again; pending uploads turn into notices.
    pub(crate) fn abandon_requests(&mut self) {
        let reset = self.polls.reset_in_flight();
        if reset > 0 {
            sync_debug!("Re-arming {} abandoned status polls", reset);
        }
        for (_, task) in std::mem::take(&mut self.uploads) {
            self.notices.push(Notice::UploadFailed {
                name: task.file.name,
                message: "upload cancelled".to_string(),
            });
        }
        self.deleting.clear();
        if matches!(self.selection.detail(), Some(Detail::Loading)) {
            self.selection
                .set_detail(Detail::Unavailable("request cancelled".to_string()));
        }
        self.listings_received = self.refreshes_issued;
        self.mark_dirty();
    }

    pub(crate) fn is_removed(&self, id: &DocumentId) -> bool {
        self.removed.contains(id)
    }

    pub(crate) fn set_detail(&mut self, detail: Detail) {
        self.selection.set_detail(detail);
        self.mark_dirty();
    }
}
