//! Item store and pending edit ledger.
//!
//! The store holds the canonical records as last fetched from the backend.
//! Each record carries exactly one lifecycle phase, and the user's
//! uncommitted edit lives inside that phase, so an item that is animating out
//! cannot also hold a pending edit.
//!
//! ```text
//! Stable { pending } --begin--> InFlight { op, pending } --success--> AnimatingOut { op } --timer--> (removed)
//!                                     |
//!                                     +--failure--> Stable { pending }   (rollback)
//! ```

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{EmailId, EmailItem, EmailPatch, OperationId};

/// Errors raised by store mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No item with this ID is listed.
    #[error("email not found: {0}")]
    UnknownItem(EmailId),

    /// The item already has an operation in flight.
    #[error("email {0} has an operation in flight")]
    Busy(EmailId),

    /// The item is leaving the list.
    #[error("email {0} is being removed")]
    Retiring(EmailId),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Lifecycle phase of one listed item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPhase {
    /// Interactive; may hold an uncommitted edit.
    Stable {
        /// Local edit not yet sent.
        pending: Option<EmailPatch>,
    },
    /// A side-effecting call for this item has not resolved yet.
    InFlight {
        /// The operation that owns the item.
        op: OperationId,
        /// Local edit carried through the call, restored on failure.
        pending: Option<EmailPatch>,
    },
    /// The backend committed the change; the item is visually leaving.
    AnimatingOut {
        /// The operation whose success retired the item.
        op: OperationId,
    },
}

impl Default for ItemPhase {
    fn default() -> Self {
        Self::Stable { pending: None }
    }
}

impl ItemPhase {
    /// The uncommitted edit held in this phase.
    pub fn pending(&self) -> Option<&EmailPatch> {
        match self {
            Self::Stable { pending } | Self::InFlight { pending, .. } => pending.as_ref(),
            Self::AnimatingOut { .. } => None,
        }
    }

    /// Read-side summary of the phase.
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Stable { .. } => PhaseKind::Stable,
            Self::InFlight { .. } => PhaseKind::InFlight,
            Self::AnimatingOut { .. } => PhaseKind::AnimatingOut,
        }
    }
}

/// Phase as exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Interactive.
    Stable,
    /// Controls disabled while a call resolves.
    InFlight,
    /// Playing the exit animation.
    AnimatingOut,
}

/// One row of the merged (store + ledger) projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemView {
    /// The record with any pending edit overlaid.
    pub item: EmailItem,
    /// Current lifecycle phase.
    pub phase: PhaseKind,
    /// Whether an uncommitted edit is overlaid.
    pub has_pending_edit: bool,
}

/// What a [`ItemStore::load`] replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Items now listed.
    pub loaded: usize,
    /// IDs that disappeared from the store.
    pub removed: Vec<EmailId>,
    /// IDs whose pending edits were dropped because the item disappeared.
    pub dropped_edits: Vec<EmailId>,
}

#[derive(Debug, Clone)]
struct Slot {
    seq: u64,
    item: EmailItem,
    phase: ItemPhase,
}

/// Canonical item records plus the pending edit ledger.
#[derive(Debug, Default)]
pub struct ItemStore {
    slots: HashMap<EmailId, Slot>,
    next_seq: u64,
}

impl ItemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the store contents with a fresh fetch.
    ///
    /// Pending edits and in-flight phases survive for IDs present in `items`;
    /// edits for IDs that vanished are dropped. Items still playing their exit
    /// animation stay listed until their timer fires, even if the backend no
    /// longer reports them.
    pub fn load(&mut self, items: Vec<EmailItem>) -> LoadOutcome {
        let mut previous = std::mem::take(&mut self.slots);
        let mut outcome = LoadOutcome::default();
        self.next_seq = 0;

        for item in items {
            if self.slots.contains_key(&item.id) {
                tracing::warn!(email_id = %item.id, "duplicate email in fetch, keeping first");
                continue;
            }
            let phase = previous
                .remove(&item.id)
                .map(|slot| slot.phase)
                .unwrap_or_default();
            let seq = self.bump_seq();
            self.slots.insert(item.id.clone(), Slot { seq, item, phase });
        }
        outcome.loaded = self.slots.len();

        let mut leftovers: Vec<(EmailId, Slot)> = previous.into_iter().collect();
        leftovers.sort_by_key(|(_, slot)| slot.seq);
        for (id, mut slot) in leftovers {
            match slot.phase {
                ItemPhase::AnimatingOut { .. } => {
                    slot.seq = self.bump_seq();
                    self.slots.insert(id, slot);
                }
                ItemPhase::Stable { ref pending } | ItemPhase::InFlight { ref pending, .. } => {
                    if pending.is_some() {
                        outcome.dropped_edits.push(id.clone());
                    }
                    outcome.removed.push(id);
                }
            }
        }

        if !outcome.dropped_edits.is_empty() {
            tracing::debug!(
                count = outcome.dropped_edits.len(),
                "dropped pending edits for emails no longer listed"
            );
        }
        outcome
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn slot_mut(&mut self, id: &EmailId) -> StoreResult<&mut Slot> {
        self.slots
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownItem(id.clone()))
    }

    /// Returns true if the item is listed.
    pub fn contains(&self, id: &EmailId) -> bool {
        self.slots.contains_key(id)
    }

    /// Number of listed items, including those animating out.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing is listed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The authoritative record, without pending edits.
    pub fn get(&self, id: &EmailId) -> Option<&EmailItem> {
        self.slots.get(id).map(|slot| &slot.item)
    }

    /// The record as the user sees it: store value overridden by the ledger.
    pub fn effective(&self, id: &EmailId) -> Option<EmailItem> {
        self.slots.get(id).map(|slot| match slot.phase.pending() {
            Some(patch) => patch.apply_to(&slot.item),
            None => slot.item.clone(),
        })
    }

    /// Current phase of an item.
    pub fn phase(&self, id: &EmailId) -> Option<&ItemPhase> {
        self.slots.get(id).map(|slot| &slot.phase)
    }

    /// Merges `patch` into the ledger entry for `id`.
    pub fn apply_local_edit(&mut self, id: &EmailId, patch: EmailPatch) -> StoreResult<()> {
        let slot = self.slot_mut(id)?;
        match &mut slot.phase {
            ItemPhase::Stable { pending } => {
                match pending {
                    Some(existing) => existing.merge(patch),
                    None => *pending = Some(patch),
                }
                if pending.as_ref().is_some_and(EmailPatch::is_empty) {
                    *pending = None;
                }
                Ok(())
            }
            ItemPhase::InFlight { .. } => Err(StoreError::Busy(id.clone())),
            ItemPhase::AnimatingOut { .. } => Err(StoreError::Retiring(id.clone())),
        }
    }

    /// The uncommitted edit for `id`.
    pub fn pending_edit(&self, id: &EmailId) -> Option<&EmailPatch> {
        self.slots.get(id).and_then(|slot| slot.phase.pending())
    }

    /// Number of items with an uncommitted edit.
    pub fn pending_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.phase.pending().is_some())
            .count()
    }

    /// IDs with an uncommitted edit, in list order.
    pub fn pending_ids(&self) -> Vec<EmailId> {
        self.ordered()
            .filter(|(_, slot)| slot.phase.pending().is_some())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Throws away the uncommitted edit for a stable item.
    pub fn discard_edit(&mut self, id: &EmailId) -> StoreResult<Option<EmailPatch>> {
        let slot = self.slot_mut(id)?;
        match &mut slot.phase {
            ItemPhase::Stable { pending } => Ok(pending.take()),
            ItemPhase::InFlight { .. } => Err(StoreError::Busy(id.clone())),
            ItemPhase::AnimatingOut { .. } => Err(StoreError::Retiring(id.clone())),
        }
    }

    /// Clears the ledger entry for `id` after a successful send.
    ///
    /// Never touches the authoritative record; see [`patch`](Self::patch).
    pub fn commit(&mut self, id: &EmailId) -> Option<EmailPatch> {
        let slot = self.slots.get_mut(id)?;
        match &mut slot.phase {
            ItemPhase::Stable { pending } | ItemPhase::InFlight { pending, .. } => pending.take(),
            ItemPhase::AnimatingOut { .. } => None,
        }
    }

    /// Replaces the authoritative record for an already-listed item.
    pub fn patch(&mut self, item: EmailItem) -> bool {
        match self.slots.get_mut(&item.id) {
            Some(slot) => {
                slot.item = item;
                true
            }
            None => false,
        }
    }

    /// Marks a stable item as owned by `op`. Returns the prior phase for rollback.
    pub fn mark_in_flight(&mut self, id: &EmailId, op: OperationId) -> StoreResult<ItemPhase> {
        let slot = self.slot_mut(id)?;
        match &slot.phase {
            ItemPhase::Stable { pending } => {
                let pending = pending.clone();
                let prior = std::mem::replace(&mut slot.phase, ItemPhase::InFlight { op, pending });
                Ok(prior)
            }
            ItemPhase::InFlight { .. } => Err(StoreError::Busy(id.clone())),
            ItemPhase::AnimatingOut { .. } => Err(StoreError::Retiring(id.clone())),
        }
    }

    /// Checks that an item could be marked in flight, without changing it.
    pub fn ensure_stable(&self, id: &EmailId) -> StoreResult<()> {
        match self.phase(id) {
            None => Err(StoreError::UnknownItem(id.clone())),
            Some(ItemPhase::Stable { .. }) => Ok(()),
            Some(ItemPhase::InFlight { .. }) => Err(StoreError::Busy(id.clone())),
            Some(ItemPhase::AnimatingOut { .. }) => Err(StoreError::Retiring(id.clone())),
        }
    }

    /// Restores a phase captured by [`mark_in_flight`](Self::mark_in_flight),
    /// provided `op` still owns the item.
    pub fn restore(&mut self, id: &EmailId, op: OperationId, prior: ItemPhase) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) if matches!(slot.phase, ItemPhase::InFlight { op: owner, .. } if owner == op) => {
                slot.phase = prior;
                true
            }
            _ => false,
        }
    }

    /// Returns an in-flight item owned by `op` to the stable phase, keeping
    /// whatever edit it still holds.
    pub fn settle(&mut self, id: &EmailId, op: OperationId) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => match &mut slot.phase {
                ItemPhase::InFlight { op: owner, pending } if *owner == op => {
                    let pending = pending.take();
                    slot.phase = ItemPhase::Stable { pending };
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    /// Starts the exit animation for an item owned by `op`. Any pending edit
    /// is discarded with it.
    pub fn begin_exit(&mut self, id: &EmailId, op: OperationId) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) if matches!(slot.phase, ItemPhase::InFlight { op: owner, .. } if owner == op) => {
                slot.phase = ItemPhase::AnimatingOut { op };
                true
            }
            _ => false,
        }
    }

    /// Removes an item whose exit animation belongs to `op`.
    pub fn retire(&mut self, id: &EmailId, op: OperationId) -> Option<EmailItem> {
        let owned = matches!(
            self.slots.get(id),
            Some(slot) if slot.phase == ItemPhase::AnimatingOut { op }
        );
        if !owned {
            return None;
        }
        self.slots.remove(id).map(|slot| slot.item)
    }

    /// IDs currently playing the exit animation.
    pub fn animating_out(&self) -> Vec<EmailId> {
        self.ordered()
            .filter(|(_, slot)| slot.phase.kind() == PhaseKind::AnimatingOut)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// IDs of every listed item, in fetch order.
    pub fn ids(&self) -> Vec<EmailId> {
        self.ordered().map(|(id, _)| id.clone()).collect()
    }

    /// The merged projection, in fetch order.
    pub fn projection(&self) -> Vec<ItemView> {
        self.ordered()
            .map(|(_, slot)| {
                let pending = slot.phase.pending();
                ItemView {
                    item: pending.map_or_else(|| slot.item.clone(), |p| p.apply_to(&slot.item)),
                    phase: slot.phase.kind(),
                    has_pending_edit: pending.is_some(),
                }
            })
            .collect()
    }

    fn ordered(&self) -> impl Iterator<Item = (&EmailId, &Slot)> {
        let mut slots: Vec<(&EmailId, &Slot)> = self.slots.iter().collect();
        slots.sort_by_key(|(_, slot)| slot.seq);
        slots.into_iter()
    }
}
