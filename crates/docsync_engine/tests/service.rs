use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docsync_core::{DocumentId, DocumentStatus, FileCandidate, Msg};
use docsync_engine::{
    DocumentService, FailureKind, ProgressSink, ReqwestDocumentService, ServiceSettings,
};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<Msg>>,
}

impl TestSink {
    fn percents(&self) -> Vec<u8> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|msg| match msg {
                Msg::UploadProgress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, msg: Msg) {
        self.events.lock().unwrap().push(msg);
    }
}

fn service_for(server: &MockServer) -> ReqwestDocumentService {
    ReqwestDocumentService::new(ServiceSettings {
        base_url: server.uri(),
        upload_chunk_size: 64 * 1024,
        ..ServiceSettings::default()
    })
    .expect("service")
}

fn pdf_file(name: &str, len: usize) -> (NamedTempFile, FileCandidate) {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(&vec![b'%'; len]).unwrap();
    let candidate = FileCandidate {
        name: name.to_string(),
        content_type: Some("application/pdf".to_string()),
        size_bytes: len as u64,
        path: tmp.path().to_path_buf(),
    };
    (tmp, candidate)
}

#[tokio::test]
async fn lists_wrapped_payload_and_skips_unknown_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pdf-list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "pdfs": [
                {
                    "id": "a1", "name": "steel-cup.pdf", "date": "2025-02-14",
                    "size": "1.8 MB", "status": "completed",
                    "fileUrl": "/uploads/steel-cup.pdf", "chunksCount": 12
                },
                {
                    "id": 3, "name": "wooden-cup.pdf", "date": "2025-02-13",
                    "size": "3.1 MB", "status": "processing",
                    "fileUrl": "/uploads/wooden-cup.pdf", "chunksCount": 0,
                    "processing_steps": {
                        "current_step": 2, "total_steps": 5, "description": "parsing"
                    }
                },
                {
                    "id": "x", "name": "odd.pdf", "status": "archived"
                }
            ]
        })))
        .mount(&server)
        .await;

    let docs = service_for(&server).list().await.expect("list ok");

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, DocumentId::new("a1"));
    assert_eq!(docs[0].chunks_count, Some(12));
    assert_eq!(docs[1].id, DocumentId::new("3"));
    assert_eq!(docs[1].status, DocumentStatus::Processing);
    assert_eq!(docs[1].chunks_count, None);
    assert_eq!(
        docs[1].processing_steps.as_ref().unwrap().current_step(),
        2
    );
}

#[tokio::test]
async fn lists_bare_array_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pdf-list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "b", "name": "bag.pdf", "status": "pending"}
        ])))
        .mount(&server)
        .await;

    let docs = service_for(&server).list().await.expect("list ok");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].status, DocumentStatus::Pending);
}

#[tokio::test]
async fn single_upload_reports_progress_and_acceptance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "accepted",
            "filename": "manual.pdf",
            "file_id": "f-1",
            "status": "uploading"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_tmp, file) = pdf_file("manual.pdf", 200 * 1024);
    let sink = Arc::new(TestSink::default());
    let accepted = service_for(&server)
        .upload_one(1, &file, sink.clone())
        .await
        .expect("upload ok");

    assert_eq!(accepted.document_id, DocumentId::new("f-1"));
    assert_eq!(accepted.status, DocumentStatus::Uploading);
    assert_eq!(accepted.stored_filename.as_deref(), Some("manual.pdf"));

    let percents = sink.percents();
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(percents.len() >= 4);
}

#[tokio::test]
async fn rejected_upload_is_a_server_reported_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-pdf"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "only PDF files"})),
        )
        .mount(&server)
        .await;

    let (_tmp, file) = pdf_file("manual.pdf", 10);
    let err = service_for(&server)
        .upload_one(1, &file, Arc::new(TestSink::default()))
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::ServerReported);
    assert_eq!(err.message, "only PDF files");
    assert!(!err.is_transport());
}

#[tokio::test]
async fn unreadable_file_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let file = FileCandidate::new("/definitely/not/here.pdf", 10);
    let err = service_for(&server)
        .upload_one(1, &file, Arc::new(TestSink::default()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::FileRead);
}

#[tokio::test]
async fn batch_results_are_judged_per_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-pdfs-batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "results": [
                {"filename": "a.pdf", "success": true, "file_id": "id-a", "status": "uploading"},
                {"filename": "b.pdf", "success": false, "error": "disk full"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_a, file_a) = pdf_file("a.pdf", 10);
    let (_b, file_b) = pdf_file("b.pdf", 10);
    let outcome = service_for(&server)
        .upload_batch(&[(7, file_a), (8, file_b)], Arc::new(TestSink::default()))
        .await
        .expect("batch ok");

    assert_eq!(outcome.len(), 2);
    assert_eq!(outcome[0].0, 7);
    assert_eq!(
        outcome[0].1.as_ref().unwrap().document_id,
        DocumentId::new("id-a")
    );
    assert_eq!(outcome[1].0, 8);
    let err = outcome[1].1.as_ref().unwrap_err();
    assert_eq!(err.kind, FailureKind::ServerReported);
    assert_eq!(err.message, "disk full");
}

#[tokio::test]
async fn batch_results_pair_by_filename_when_counts_differ() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-pdfs-batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "results": [
                {"filename": "b.pdf", "success": true, "file_id": "id-b", "status": "uploading"}
            ]
        })))
        .mount(&server)
        .await;

    let (_a, file_a) = pdf_file("a.pdf", 10);
    let (_b, file_b) = pdf_file("b.pdf", 10);
    let outcome = service_for(&server)
        .upload_batch(&[(1, file_a), (2, file_b)], Arc::new(TestSink::default()))
        .await
        .expect("batch ok");

    assert!(outcome[0].1.is_err());
    assert_eq!(
        outcome[1].1.as_ref().unwrap().document_id,
        DocumentId::new("id-b")
    );
}

#[tokio::test]
async fn delete_checks_payload_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/delete-pdf/ok"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/delete-pdf/locked"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"success": false, "error": "locked"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/delete-pdf/gone"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"error": "file not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/delete-pdf/boom"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let service = service_for(&server);
    service.delete(&DocumentId::new("ok")).await.expect("deleted");

    let err = service.delete(&DocumentId::new("locked")).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::ServerReported);
    assert_eq!(err.message, "locked");

    let err = service.delete(&DocumentId::new("gone")).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::ServerReported);
    assert_eq!(err.message, "file not found");

    let err = service.delete(&DocumentId::new("boom")).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(502));
}

#[tokio::test]
async fn status_reports_steps_and_chunk_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/processed/busy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "busy",
            "status": "processing",
            "processing_steps": {"current_step": 3, "total_steps": 5, "description": "converting"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/processed/done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "done",
            "status": "completed",
            "processing_steps": {"current_step": 5, "total_steps": 5, "description": "stored"},
            "chunks": [{"text": "a"}, {"text": "b"}, {"text": "c"}]
        })))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let busy = service.status(&DocumentId::new("busy")).await.expect("status");
    assert_eq!(busy.status, DocumentStatus::Processing);
    let steps = busy.processing_steps.unwrap();
    assert_eq!((steps.current_step(), steps.total_steps()), (3, 5));
    assert_eq!(steps.description, "converting");

    let done = service.status(&DocumentId::new("done")).await.expect("status");
    assert_eq!(done.status, DocumentStatus::Completed);
    assert_eq!(done.processing_steps, None);
    assert_eq!(done.chunks_count, Some(3));
}

#[tokio::test]
async fn fetches_rendered_markdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/processed/doc/markdown"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"markdown": "# Title"})),
        )
        .mount(&server)
        .await;

    let markdown = service_for(&server)
        .markdown(&DocumentId::new("doc"))
        .await
        .expect("markdown");
    assert_eq!(markdown, "# Title");
}

#[tokio::test]
async fn slow_status_times_out_as_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/processed/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(serde_json::json!({"status": "processing"})),
        )
        .mount(&server)
        .await;

    let service = ReqwestDocumentService::new(ServiceSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ServiceSettings::default()
    })
    .unwrap();

    let err = service.status(&DocumentId::new("slow")).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(err.is_transport());
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestDocumentService::new(ServiceSettings {
        base_url: "not a url".to_string(),
        ..ServiceSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
