use std::collections::HashSet;

use docsync_logging::{sync_debug, sync_info, sync_warn};

use crate::upload::screen;
use crate::{
    size_label, AppState, Detail, Document, DocumentId, DocumentStatus, Effect, FileCandidate,
    Msg, Notice, PollToken, StatusReport, SubmitReport, UploadId, UploadReceipt, Upsert,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesSubmitted(files) => submit_files(&mut state, files),
        Msg::UploadProgress { upload_id, percent } => {
            state.set_upload_progress(upload_id, percent);
            Vec::new()
        }
        Msg::UploadFinished { upload_id, result } => finish_upload(&mut state, upload_id, result),
        Msg::RefreshRequested => vec![Effect::RefreshList],
        Msg::DocumentListLoaded(Ok(documents)) => apply_listing(&mut state, documents),
        Msg::DocumentListLoaded(Err(message)) => {
            sync_warn!("Document list refresh failed: {}", message);
            state.note_listing_failed();
            state.push_notice(Notice::RefreshFailed { message });
            Vec::new()
        }
        Msg::PollTick => {
            let registry = &state.registry;
            state
                .polls
                .due(|id| registry.contains(id))
                .into_iter()
                .map(|(id, token)| Effect::PollStatus { id, token })
                .collect()
        }
        Msg::StatusPolled { id, token, result } => apply_poll(&mut state, id, token, result),
        Msg::DocumentSelected(id) => select_document(&mut state, id),
        Msg::MarkdownLoaded { id, result } => {
            if state.selection.is_selected(&id) {
                let detail = match result {
                    Ok(markdown) => Detail::Markdown(markdown),
                    Err(message) => {
                        sync_warn!("Rendered text for {} unavailable: {}", id, message);
                        Detail::Unavailable(message)
                    }
                };
                state.set_detail(detail);
            }
            Vec::new()
        }
        Msg::DeleteRequested(id) => {
            if state.registry.contains(&id) && state.begin_delete(&id) {
                vec![Effect::DeleteDocument { id }]
            } else {
                Vec::new()
            }
        }
        Msg::DeleteFinished { id, result } => finish_delete(&mut state, id, result),
        Msg::EngineStopped => {
            state.abandon_requests();
            Vec::new()
        }
        Msg::NoticesDismissed => {
            state.clear_notices();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    let refreshes = effects
        .iter()
        .filter(|effect| matches!(effect, Effect::RefreshList))
        .count();
    state.note_refreshes(refreshes);
    (state, effects)
}

fn submit_files(state: &mut AppState, files: Vec<FileCandidate>) -> Vec<Effect> {
    let (valid, rejected) = match screen(files) {
        Ok(split) => split,
        Err(err) => {
            sync_warn!("Submission rejected: {}", err);
            state.record_submission(Err(err));
            return Vec::new();
        }
    };
    for invalid in &rejected {
        sync_info!("Skipping non-PDF file {}", invalid.name);
    }

    let mut queued: Vec<(UploadId, FileCandidate)> = valid
        .into_iter()
        .map(|file| (state.start_upload(file.clone()), file))
        .collect();
    state.record_submission(Ok(SubmitReport {
        accepted: queued.iter().map(|(upload_id, _)| *upload_id).collect(),
        rejected,
    }));

    if queued.len() == 1 {
        if let Some((upload_id, file)) = queued.pop() {
            return vec![Effect::UploadOne { upload_id, file }];
        }
    }
    vec![Effect::UploadBatch { files: queued }]
}

fn finish_upload(
    state: &mut AppState,
    upload_id: UploadId,
    result: Result<UploadReceipt, String>,
) -> Vec<Effect> {
    let Some(task) = state.take_upload(upload_id) else {
        sync_debug!("Ignoring result for unknown upload {}", upload_id);
        return Vec::new();
    };

    let receipt = match result {
        Ok(receipt) => receipt,
        Err(message) => {
            sync_warn!("Upload of {} failed: {}", task.file.name, message);
            state.push_notice(Notice::UploadFailed {
                name: task.file.name,
                message,
            });
            return Vec::new();
        }
    };

    let stored = receipt
        .stored_filename
        .unwrap_or_else(|| task.file.name.clone());
    let document = Document {
        id: receipt.document_id.clone(),
        name: task.file.name,
        uploaded_at: receipt.uploaded_at,
        size_label: size_label(task.file.size_bytes),
        status: receipt.status,
        processing_steps: None,
        chunks_count: None,
        file_url: format!("/uploads/{stored}"),
    };
    sync_info!(
        "Registered {} as {} ({})",
        document.name,
        document.id,
        document.status
    );
    state.registry.upsert(document);
    state.mark_fresh(receipt.document_id.clone());
    state.mark_dirty();

    match receipt.status {
        DocumentStatus::Completed => vec![Effect::RefreshList],
        DocumentStatus::Failed => Vec::new(),
        _ => {
            state.polls.track(receipt.document_id);
            Vec::new()
        }
    }
}

fn apply_listing(state: &mut AppState, documents: Vec<Document>) -> Vec<Effect> {
    let documents: Vec<Document> = documents
        .into_iter()
        .filter(|doc| !state.is_removed(&doc.id))
        .collect();
    let listed: HashSet<&DocumentId> = documents.iter().map(|doc| &doc.id).collect();
    let unlisted = state.unlisted_fresh(&listed);
    state.registry.replace_all(documents);
    // Uploads accepted after this listing was requested go back on top.
    for doc in unlisted.into_iter().rev() {
        sync_debug!("Keeping {} accepted after the listing was requested", doc.id);
        state.registry.upsert(doc);
    }
    state.mark_dirty();

    if let Some(selected) = state.selection.current().cloned() {
        if !state.registry.contains(&selected) {
            state.selection.clear_if_removed(&selected);
        }
    }

    let unsettled = state.registry.unsettled_ids();
    let finished: Vec<DocumentId> = state
        .polls
        .ids()
        .filter(|id| !unsettled.contains(id))
        .cloned()
        .collect();
    let mut effects = Vec::with_capacity(finished.len());
    for id in finished {
        state.polls.cancel(&id);
        effects.push(Effect::CancelPoll { id });
    }
    for id in unsettled {
        state.polls.track(id);
    }
    effects
}

fn apply_poll(
    state: &mut AppState,
    id: DocumentId,
    token: PollToken,
    result: Result<StatusReport, String>,
) -> Vec<Effect> {
    if !state.polls.accepts(&id, token) || !state.registry.contains(&id) {
        sync_debug!("Discarding stale status response for {}", id);
        return Vec::new();
    }
    state.polls.settle(&id, token);

    let report = match result {
        Ok(report) => report,
        Err(message) => {
            sync_warn!("Status poll for {} failed, retrying: {}", id, message);
            return Vec::new();
        }
    };
    let Some(mut next) = state.registry.get(&id).cloned() else {
        return Vec::new();
    };

    next.status = report.status;
    if report.status.is_terminal() {
        next.processing_steps = None;
        if report.chunks_count.is_some() {
            next.chunks_count = report.chunks_count;
        }
    } else {
        next.processing_steps = report.processing_steps;
    }
    let outcome = state.registry.upsert(next);
    state.mark_dirty();

    if !report.status.is_terminal() && outcome != Upsert::Ignored {
        return Vec::new();
    }

    sync_info!("Document {} settled as {}", id, report.status);
    state.polls.cancel(&id);
    let mut effects = vec![Effect::CancelPoll { id: id.clone() }];
    if outcome == Upsert::Settled(DocumentStatus::Completed) {
        effects.push(Effect::RefreshList);
        if state.selection.is_selected(&id) && state.selection.detail().is_none() {
            state.set_detail(Detail::Loading);
            effects.push(Effect::FetchMarkdown { id });
        }
    }
    effects
}

fn select_document(state: &mut AppState, id: DocumentId) -> Vec<Effect> {
    let Some(status) = state.registry.get(&id).map(|doc| doc.status) else {
        sync_debug!("Ignoring selection of unknown document {}", id);
        return Vec::new();
    };
    if !state.selection.select(id.clone()) {
        return Vec::new();
    }
    state.mark_dirty();
    if status == DocumentStatus::Completed {
        state.set_detail(Detail::Loading);
        return vec![Effect::FetchMarkdown { id }];
    }
    Vec::new()
}

fn finish_delete(state: &mut AppState, id: DocumentId, result: Result<(), String>) -> Vec<Effect> {
    state.end_delete(&id);
    match result {
        Ok(()) => {
            sync_info!("Deleted document {}", id);
            if state.forget_document(&id) {
                vec![Effect::CancelPoll { id }]
            } else {
                Vec::new()
            }
        }
        Err(message) => {
            sync_warn!("Delete of {} failed: {}", id, message);
            state.push_notice(Notice::DeleteFailed { id, message });
            Vec::new()
        }
    }
}
