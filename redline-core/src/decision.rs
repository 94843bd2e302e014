//! Per-block accept/reject state as an immutable value.
//!
//! Every transition returns a new [`DecisionState`]. The two sets are kept
//! disjoint by the transitions themselves: moving an id into one set always
//! removes it from the other.

use std::collections::BTreeSet;

/// Where a single block stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected,
    /// No decision yet. Previews show both sides of the block.
    Pending,
}

/// A reviewer action, as dispatched by a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Accept(String),
    Reject(String),
    Undo(String),
    AcceptAll,
    RejectAll,
    UndoAll,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionState {
    accepted: BTreeSet<String>,
    rejected: BTreeSet<String>,
}

impl DecisionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from two sets read back from storage.
    ///
    /// Storage keeps the sets under separate keys, so a crash between two
    /// writes can leave an id in both. Rejection wins in that case.
    pub fn from_sets(accepted: BTreeSet<String>, rejected: BTreeSet<String>) -> Self {
        let accepted = accepted.difference(&rejected).cloned().collect();
        Self { accepted, rejected }
    }

    pub fn accepted(&self) -> &BTreeSet<String> {
        &self.accepted
    }

    pub fn rejected(&self) -> &BTreeSet<String> {
        &self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.rejected.is_empty()
    }

    pub fn decision(&self, id: &str) -> Decision {
        if self.rejected.contains(id) {
            Decision::Rejected
        } else if self.accepted.contains(id) {
            Decision::Accepted
        } else {
            Decision::Pending
        }
    }

    pub fn is_rejected(&self, id: &str) -> bool {
        self.rejected.contains(id)
    }

    pub fn accept(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.rejected.remove(id);
        next.accepted.insert(id.to_owned());
        next
    }

    pub fn reject(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.accepted.remove(id);
        next.rejected.insert(id.to_owned());
        next
    }

    /// Returns the block to pending, whichever set it was in.
    pub fn undo(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.accepted.remove(id);
        next.rejected.remove(id);
        next
    }

    /// Accepts every block in `ids` that has not been rejected.
    ///
    /// Explicit rejections survive; the accepted set is replaced outright.
    pub fn accept_all<'a, I>(&self, ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let accepted = ids
            .into_iter()
            .filter(|id| !self.rejected.contains(*id))
            .map(str::to_owned)
            .collect();
        Self {
            accepted,
            rejected: self.rejected.clone(),
        }
    }

    /// Rejects every block in `ids` and clears all acceptances.
    pub fn reject_all<'a, I>(&self, ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            accepted: BTreeSet::new(),
            rejected: ids.into_iter().map(str::to_owned).collect(),
        }
    }

    pub fn undo_all(&self) -> Self {
        Self::new()
    }

    /// Applies `action`. `all_ids` is the full block list, used by the
    /// accept-all and reject-all actions.
    pub fn apply(&self, action: &Action, all_ids: &[String]) -> Self {
        let ids = all_ids.iter().map(String::as_str);
        match action {
            Action::Accept(id) => self.accept(id),
            Action::Reject(id) => self.reject(id),
            Action::Undo(id) => self.undo(id),
            Action::AcceptAll => self.accept_all(ids),
            Action::RejectAll => self.reject_all(ids),
            Action::UndoAll => self.undo_all(),
        }
    }
}
