use crate::DocumentId;

/// Rendered text fetched for the selected document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detail {
    Loading,
    Markdown(String),
    Unavailable(String),
}

/// The single currently-viewed document, held by id only.
///
/// Reads resolve through the registry, so poller updates show up without
/// being pushed here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    current: Option<DocumentId>,
    detail: Option<Detail>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `id`. Returns `false` when it was already selected.
    pub fn select(&mut self, id: DocumentId) -> bool {
        if self.current.as_ref() == Some(&id) {
            return false;
        }
        self.current = Some(id);
        self.detail = None;
        true
    }

    /// Clears the selection when it points at a removed document.
    pub fn clear_if_removed(&mut self, id: &DocumentId) -> bool {
        if self.current.as_ref() != Some(id) {
            return false;
        }
        self.current = None;
        self.detail = None;
        true
    }

    pub fn current(&self) -> Option<&DocumentId> {
        self.current.as_ref()
    }

    pub fn is_selected(&self, id: &DocumentId) -> bool {
        self.current.as_ref() == Some(id)
    }

    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    pub(crate) fn set_detail(&mut self, detail: Detail) {
        self.detail = Some(detail);
    }
}
