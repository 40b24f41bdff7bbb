use std::collections::BTreeMap;

use crate::{DocumentId, PollToken};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Subscription {
    token: PollToken,
    in_flight: bool,
}

/// Poll subscriptions keyed by document id.
///
/// Every subscription carries a token; a response is only applied when it
/// names the token of the live subscription for its id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollSet {
    subscriptions: BTreeMap<DocumentId, Subscription>,
    next_token: PollToken,
}

impl PollSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `id`. An existing subscription is kept as is.
    pub fn track(&mut self, id: DocumentId) -> PollToken {
        if let Some(existing) = self.subscriptions.get(&id) {
            return existing.token;
        }
        self.next_token += 1;
        let token = self.next_token;
        self.subscriptions.insert(
            id,
            Subscription {
                token,
                in_flight: false,
            },
        );
        token
    }

    /// Stops tracking `id`. Returns whether a subscription existed.
    pub fn cancel(&mut self, id: &DocumentId) -> bool {
        self.subscriptions.remove(id).is_some()
    }

    /// Marks every idle subscription accepted by `filter` as in flight and returns them.
    pub fn due(
        &mut self,
        mut filter: impl FnMut(&DocumentId) -> bool,
    ) -> Vec<(DocumentId, PollToken)> {
        let mut due = Vec::new();
        for (id, sub) in self.subscriptions.iter_mut() {
            if sub.in_flight || !filter(id) {
                continue;
            }
            sub.in_flight = true;
            due.push((id.clone(), sub.token));
        }
        due
    }

    /// Re-issues the token of every in-flight subscription and marks it idle.
    ///
    /// Used when outstanding requests were abandoned; any answer still on its
    /// way then carries an old token and is discarded.
    pub fn reset_in_flight(&mut self) -> usize {
        let mut reset = 0;
        for sub in self.subscriptions.values_mut().filter(|sub| sub.in_flight) {
            self.next_token += 1;
            sub.token = self.next_token;
            sub.in_flight = false;
            reset += 1;
        }
        reset
    }

    /// Whether a response for `(id, token)` belongs to the live subscription.
    pub fn accepts(&self, id: &DocumentId, token: PollToken) -> bool {
        self.subscriptions
            .get(id)
            .is_some_and(|sub| sub.token == token)
    }

    /// Marks the live subscription idle again so the next tick re-polls it.
    pub fn settle(&mut self, id: &DocumentId, token: PollToken) {
        if let Some(sub) = self.subscriptions.get_mut(id) {
            if sub.token == token {
                sub.in_flight = false;
            }
        }
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.subscriptions.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocumentId> + '_ {
        self.subscriptions.keys()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
