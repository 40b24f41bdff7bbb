use docsync_core::{Document, DocumentId, DocumentStatus, ProcessingSteps, Registry, Upsert};

fn doc(id: &str, status: DocumentStatus) -> Document {
    Document {
        id: DocumentId::new(id),
        name: format!("{id}.pdf"),
        uploaded_at: "2025-02-15".to_string(),
        size_label: "1.0 MB".to_string(),
        status,
        processing_steps: None,
        chunks_count: None,
        file_url: format!("/uploads/{id}.pdf"),
    }
}

#[test]
fn replace_all_keeps_server_order_and_drops_duplicates() {
    let mut registry = Registry::new();
    let mut duplicate = doc("a", DocumentStatus::Failed);
    duplicate.name = "other.pdf".to_string();
    registry.replace_all(vec![
        doc("b", DocumentStatus::Completed),
        doc("a", DocumentStatus::Pending),
        duplicate,
    ]);

    let ids: Vec<_> = registry.iter().map(|d| d.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.get(&DocumentId::new("a")).unwrap().status,
        DocumentStatus::Pending
    );
}

#[test]
fn upsert_inserts_new_documents_first() {
    let mut registry = Registry::new();
    registry.replace_all(vec![doc("old", DocumentStatus::Completed)]);

    assert_eq!(
        registry.upsert(doc("new", DocumentStatus::Uploading)),
        Upsert::Inserted
    );
    let ids: Vec<_> = registry.iter().map(|d| d.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[test]
fn upsert_of_terminal_document_stores_it_exactly() {
    let mut registry = Registry::new();
    let mut processing = doc("42", DocumentStatus::Processing);
    processing.processing_steps = Some(ProcessingSteps::new("chunking", 2, 5));
    registry.upsert(processing);

    let mut completed = doc("42", DocumentStatus::Completed);
    completed.chunks_count = Some(17);
    assert_eq!(
        registry.upsert(completed.clone()),
        Upsert::Settled(DocumentStatus::Completed)
    );
    assert_eq!(registry.get(&completed.id), Some(&completed));
}

#[test]
fn terminal_documents_never_regress() {
    let mut registry = Registry::new();
    registry.upsert(doc("a", DocumentStatus::Failed));

    assert_eq!(
        registry.upsert(doc("a", DocumentStatus::Processing)),
        Upsert::Ignored
    );
    assert_eq!(
        registry.get(&DocumentId::new("a")).unwrap().status,
        DocumentStatus::Failed
    );

    registry.replace_all(vec![doc("a", DocumentStatus::Uploading)]);
    assert_eq!(
        registry.get(&DocumentId::new("a")).unwrap().status,
        DocumentStatus::Failed
    );
}

#[test]
fn terminal_documents_never_carry_steps() {
    let mut registry = Registry::new();
    let mut completed = doc("a", DocumentStatus::Completed);
    completed.processing_steps = Some(ProcessingSteps::new("done", 5, 5));
    registry.upsert(completed);

    assert_eq!(
        registry.get(&DocumentId::new("a")).unwrap().processing_steps,
        None
    );
}

#[test]
fn remove_is_idempotent() {
    let mut registry = Registry::new();
    registry.upsert(doc("a", DocumentStatus::Uploading));
    let id = DocumentId::new("a");

    assert!(registry.remove(&id));
    let after_first = registry.clone();
    assert!(!registry.remove(&id));
    assert_eq!(registry, after_first);
    assert!(registry.get(&id).is_none());
    assert!(registry.is_empty());
}
