//! Approval set.
//!
//! Tracks which items the user has marked ready for commit. Membership is
//! independent of pending edits; executing the approved items is left to the
//! host.

use std::collections::HashSet;

use crate::domain::EmailId;

/// Set of approved item IDs.
#[derive(Debug, Clone, Default)]
pub struct ApprovalSet {
    approved: HashSet<EmailId>,
}

impl ApprovalSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership. Returns the new state.
    pub fn toggle(&mut self, id: &EmailId) -> bool {
        if self.approved.remove(id) {
            false
        } else {
            self.approved.insert(id.clone());
            true
        }
    }

    /// Marks an item approved. Returns false if it already was.
    pub fn approve(&mut self, id: EmailId) -> bool {
        self.approved.insert(id)
    }

    /// Clears approval. Returns false if the item was not approved.
    pub fn unapprove(&mut self, id: &EmailId) -> bool {
        self.approved.remove(id)
    }

    pub fn is_approved(&self, id: &EmailId) -> bool {
        self.approved.contains(id)
    }

    pub fn count(&self) -> usize {
        self.approved.len()
    }

    /// Approved IDs in stable order.
    pub fn ids(&self) -> Vec<EmailId> {
        let mut ids: Vec<EmailId> = self.approved.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Drops approvals for items that are no longer listed.
    pub fn retain(&mut self, mut listed: impl FnMut(&EmailId) -> bool) {
        self.approved.retain(|id| listed(id));
    }
}
