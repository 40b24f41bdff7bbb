use std::collections::{HashMap, HashSet};

use crate::{Document, DocumentId, DocumentStatus};

/// Result of [`Registry::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
    /// The entry moved from a non-terminal status into `status`.
    Settled(DocumentStatus),
    /// The update would have moved a settled document back to a non-terminal status.
    Ignored,
}

/// Authoritative mapping of document id to document, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registry {
    order: Vec<DocumentId>,
    docs: HashMap<DocumentId, Document>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the registry with a server listing. Later duplicates of an id are dropped.
    ///
    /// A listing never moves a settled entry back to a non-terminal status; the
    /// settled entry is kept instead.
    pub fn replace_all(&mut self, documents: Vec<Document>) {
        let mut previous = std::mem::take(&mut self.docs);
        self.order.clear();
        let mut seen = HashSet::with_capacity(documents.len());
        for doc in documents {
            if !seen.insert(doc.id.clone()) {
                continue;
            }
            let doc = match previous.remove(&doc.id) {
                Some(old) if old.status.is_terminal() && !doc.status.is_terminal() => old,
                _ => doc.normalized(),
            };
            self.order.push(doc.id.clone());
            self.docs.insert(doc.id.clone(), doc);
        }
    }

    /// Inserts a new document at the front, or overwrites the entry with the same id.
    pub fn upsert(&mut self, document: Document) -> Upsert {
        let document = document.normalized();
        match self.docs.get_mut(&document.id) {
            None => {
                self.order.insert(0, document.id.clone());
                self.docs.insert(document.id.clone(), document);
                Upsert::Inserted
            }
            Some(existing) => {
                let was_terminal = existing.status.is_terminal();
                if was_terminal && !document.status.is_terminal() {
                    return Upsert::Ignored;
                }
                let status = document.status;
                *existing = document;
                if !was_terminal && status.is_terminal() {
                    Upsert::Settled(status)
                } else {
                    Upsert::Updated
                }
            }
        }
    }

    /// Removes a document. Returns whether an entry was present.
    pub fn remove(&mut self, id: &DocumentId) -> bool {
        if self.docs.remove(id).is_none() {
            return false;
        }
        self.order.retain(|existing| existing != id);
        true
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.docs.get(id)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.docs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Documents in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> + '_ {
        self.order.iter().filter_map(|id| self.docs.get(id))
    }

    /// Ids of documents whose status is not terminal.
    pub fn unsettled_ids(&self) -> Vec<DocumentId> {
        self.iter()
            .filter(|doc| !doc.status.is_terminal())
            .map(|doc| doc.id.clone())
            .collect()
    }
}
