//! Application layer: the triage page and its engine.
//!
//! [`TriageEngine`] owns the page state and every service, talks to the
//! backend through [`TriageApi`](crate::providers::backend::TriageApi), and
//! publishes [`TriageEvent`]s for the renderer.

mod engine;
mod events;
mod state;

use thiserror::Error;

use crate::domain::{CategoryId, EmailId};
use crate::providers::backend::ApiError;
use crate::services::{GateError, StoreError, TransitionError};

pub use engine::{EditRoute, TriageEngine};
pub use events::{EventBus, EventHandler, Notice, NoticeId, NoticeLevel, SubscriberId, TriageEvent};
pub use state::{PageState, PageStatus};

/// Errors surfaced by engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriageError {
    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A transition could not start or finish.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The batch action gate refused.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// An item cannot be edited right now.
    #[error(transparent)]
    Item(#[from] StoreError),

    /// The category ID is not in the catalog.
    #[error("unknown category: {0}")]
    UnknownCategory(CategoryId),

    /// A cross-bucket move was combined with other field changes.
    #[error("email {0} is moving to another bucket; edit other fields separately")]
    MixedEdit(EmailId),

    /// The page has not loaded successfully.
    #[error("page is not ready")]
    NotReady,
}

/// Result type for engine operations.
pub type TriageResult<T> = Result<T, TriageError>;
