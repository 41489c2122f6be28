//! Reconciliation services.
//!
//! This module holds the client-side state machines that keep the displayed
//! list consistent with the backend, the user's unsent edits, and the timed
//! UI states that sit between them.
//!
//! # Architecture
//!
//! Services sit between the application layer and the backend provider:
//!
//! ```text
//! Application Layer (TriageEngine, PageState, Events)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//!   Provider (TriageApi)
//! ```
//!
//! # Services Overview
//!
//! - [`ItemStore`]: Canonical records, pending edit ledger, per-item phase
//! - [`group_by_category`]: Ordered category groups over the merged projection
//! - [`ApprovalSet`]: Items marked ready for commit
//! - [`BatchActionGate`]: Confirm/cancel guard for category-wide actions
//! - [`TransitionController`]: Side effects, rollback, exit animation, summary panel
//! - [`Scheduler`]: Cancellable timers on `tokio::time`

mod approval;
mod batch_gate;
mod grouping;
mod item_store;
mod scheduler;
mod transition;

pub use approval::ApprovalSet;
pub use batch_gate::{BatchActionGate, GateError, GateResult};
pub use grouping::{group_by_category, CategoryGroup, GroupKey, Groupable};
pub use item_store::{ItemPhase, ItemStore, ItemView, LoadOutcome, PhaseKind, StoreError, StoreResult};
pub use scheduler::{Scheduler, TaskId};
pub use transition::{
    ApiCall, ApiResponse, Completion, Fired, Ticket, Timer, TransitionController,
    TransitionError, TransitionResult,
};
