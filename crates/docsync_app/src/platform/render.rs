use docsync_core::{AppViewModel, Detail, Document, DocumentStatus, SelectedView, SubmitReport};

/// Renders the document table, pending uploads and notices as terminal lines.
pub(crate) fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if view.documents.is_empty() {
        lines.push("No documents.".to_string());
    }
    for row in &view.documents {
        let marker = if row.selected { '>' } else { ' ' };
        let mut line = format!("{marker} {}", document_line(&row.document));
        if row.deleting {
            line.push_str(" [deleting]");
        }
        lines.push(line);
    }

    for upload in &view.uploads {
        lines.push(format!(
            "  uploading {} {}",
            upload.name,
            progress_bar(upload.percent)
        ));
    }

    lines.push(format!(
        "Documents: {} | Following: {}",
        view.documents.len(),
        view.tracked_count
    ));
    lines.extend(view.notices.iter().map(|notice| format!("! {notice}")));
    lines
}

pub(crate) fn document_line(doc: &Document) -> String {
    format!(
        "{:<12} {:<32} {:<10} {:>8}  {}",
        doc.id.as_str(),
        doc.name,
        doc.uploaded_at,
        doc.size_label,
        status_text(doc)
    )
}

pub(crate) fn status_text(doc: &Document) -> String {
    match (doc.status, &doc.processing_steps) {
        (DocumentStatus::Completed, _) => match doc.chunks_count {
            Some(chunks) => format!("completed ({chunks} chunks)"),
            None => "completed".to_string(),
        },
        (status, Some(steps)) => format!(
            "{status} {}/{} {} ({}%)",
            steps.current_step(),
            steps.total_steps(),
            steps.description,
            steps.percent()
        ),
        (status, None) => status.to_string(),
    }
}

/// Full description of the selected document, followed by its rendered text when loaded.
pub(crate) fn render_selected(selected: &SelectedView) -> Vec<String> {
    let doc = &selected.document;
    let mut lines = vec![
        format!("Id:       {}", doc.id),
        format!("Name:     {}", doc.name),
        format!("Uploaded: {}", doc.uploaded_at),
        format!("Size:     {}", doc.size_label),
        format!("File:     {}", doc.file_url),
        format!("Status:   {}", status_text(doc)),
    ];
    match &selected.detail {
        Some(Detail::Markdown(text)) => {
            lines.push(String::new());
            lines.extend(text.lines().map(str::to_string));
        }
        Some(Detail::Unavailable(message)) => {
            lines.push(format!("Processed text unavailable: {message}"));
        }
        Some(Detail::Loading) | None => {}
    }
    lines
}

pub(crate) fn render_submit(report: &SubmitReport) -> Vec<String> {
    let mut lines = vec![format!("Uploading {} file(s)", report.accepted.len())];
    lines.extend(
        report
            .rejected
            .iter()
            .map(|invalid| format!("Skipped {}: only PDF files are accepted", invalid.name)),
    );
    lines
}

fn progress_bar(percent: u8) -> String {
    const WIDTH: usize = 20;
    let filled = usize::from(percent.min(100)) * WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_core::{
        DocumentId, DocumentRow, InvalidFile, Notice, ProcessingSteps, RejectReason, UploadRow,
    };
    use pretty_assertions::assert_eq;

    fn doc(status: DocumentStatus) -> Document {
        Document {
            id: DocumentId::new("42"),
            name: "wooden-cup.pdf".to_string(),
            uploaded_at: "2025-02-13".to_string(),
            size_label: "3.1 MB".to_string(),
            status,
            processing_steps: None,
            chunks_count: None,
            file_url: "/uploads/wooden-cup.pdf".to_string(),
        }
    }

    #[test]
    fn status_shows_pipeline_progress() {
        let mut processing = doc(DocumentStatus::Processing);
        processing.processing_steps = Some(ProcessingSteps::new("parsing", 2, 5));
        assert_eq!(status_text(&processing), "processing 2/5 parsing (40%)");

        let mut done = doc(DocumentStatus::Completed);
        done.chunks_count = Some(12);
        assert_eq!(status_text(&done), "completed (12 chunks)");
        assert_eq!(status_text(&doc(DocumentStatus::Failed)), "failed");
    }

    #[test]
    fn empty_view_says_so() {
        let lines = render(&AppViewModel::default());
        assert_eq!(
            lines,
            vec![
                "No documents.".to_string(),
                "Documents: 0 | Following: 0".to_string()
            ]
        );
    }

    #[test]
    fn rows_mark_selection_uploads_and_notices() {
        let view = AppViewModel {
            documents: vec![DocumentRow {
                document: doc(DocumentStatus::Uploading),
                selected: true,
                tracked: true,
                deleting: true,
            }],
            uploads: vec![UploadRow {
                upload_id: 0,
                name: "steel-cup.pdf".to_string(),
                percent: 50,
            }],
            tracked_count: 1,
            notices: vec![Notice::RefreshFailed {
                message: "timeout".to_string(),
            }],
            ..AppViewModel::default()
        };

        let lines = render(&view);
        assert!(lines[0].starts_with("> 42"));
        assert!(lines[0].ends_with("uploading [deleting]"));
        assert_eq!(
            lines[1],
            "  uploading steel-cup.pdf [##########----------]  50%"
        );
        assert_eq!(lines[2], "Documents: 1 | Following: 1");
        assert_eq!(lines[3], "! refreshing the list failed: timeout");
    }

    #[test]
    fn selected_view_appends_markdown() {
        let selected = SelectedView {
            document: doc(DocumentStatus::Completed),
            detail: Some(Detail::Markdown("# Cup\nbody".to_string())),
        };
        let lines = render_selected(&selected);
        assert_eq!(lines[0], "Id:       42");
        assert_eq!(&lines[lines.len() - 2..], ["# Cup", "body"]);
    }

    #[test]
    fn submit_report_lists_skipped_files() {
        let report = SubmitReport {
            accepted: vec![0, 1],
            rejected: vec![InvalidFile {
                name: "notes.txt".to_string(),
                reason: RejectReason::InvalidFileType,
            }],
        };
        assert_eq!(
            render_submit(&report),
            vec![
                "Uploading 2 file(s)".to_string(),
                "Skipped notes.txt: only PDF files are accepted".to_string()
            ]
        );
    }
}
