//! Two-phase guard for irreversible category-wide actions.
//!
//! `initiate` only records the request. Nothing reaches the backend until
//! `confirm` hands the request back to the caller for execution.

use thiserror::Error;

use crate::config::BatchSettings;
use crate::domain::{BatchAction, BatchActionRequest, Category, CategoryId};

/// Errors raised by the batch action gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// `confirm` was called with nothing pending.
    #[error("no batch action awaiting confirmation")]
    NoPendingRequest,

    /// The category is not allowed for this action.
    #[error("category {category_id} is not eligible for batch {action}")]
    NotEligible {
        /// Requested category.
        category_id: CategoryId,
        /// Requested action.
        action: BatchAction,
    },
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;

/// Holds at most one batch action awaiting confirmation.
#[derive(Debug, Clone, Default)]
pub struct BatchActionGate {
    eligibility: BatchSettings,
    pending: Option<BatchActionRequest>,
}

impl BatchActionGate {
    /// Creates a gate with the given eligibility lists.
    pub fn new(eligibility: BatchSettings) -> Self {
        Self {
            eligibility,
            pending: None,
        }
    }

    /// Returns true if `action` may be requested for `category`.
    pub fn is_eligible(&self, category: &Category, action: BatchAction) -> bool {
        let allowed = match action {
            BatchAction::Move => &self.eligibility.move_categories,
            BatchAction::Delete => &self.eligibility.delete_categories,
        };
        allowed
            .as_ref()
            .map_or(true, |numbers| numbers.contains(&category.number))
    }

    /// Records a request, replacing any other pending one. Returns the
    /// replaced request.
    pub fn initiate(
        &mut self,
        category: &Category,
        action: BatchAction,
    ) -> GateResult<Option<BatchActionRequest>> {
        if !self.is_eligible(category, action) {
            return Err(GateError::NotEligible {
                category_id: category.id.clone(),
                action,
            });
        }

        let request = BatchActionRequest {
            category_id: category.id.clone(),
            label: category.label.clone(),
            action,
        };
        tracing::debug!(category_id = %request.category_id, %action, "batch action awaiting confirmation");
        Ok(self.pending.replace(request))
    }

    /// Takes the pending request for execution. The gate is cleared whether
    /// or not the caller's execution later succeeds.
    pub fn confirm(&mut self) -> GateResult<BatchActionRequest> {
        self.pending.take().ok_or(GateError::NoPendingRequest)
    }

    /// Drops the pending request without side effects.
    pub fn cancel(&mut self) -> Option<BatchActionRequest> {
        self.pending.take()
    }

    /// The request awaiting confirmation.
    pub fn pending(&self) -> Option<&BatchActionRequest> {
        self.pending.as_ref()
    }
}
