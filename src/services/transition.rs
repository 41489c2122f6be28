//! Transition controller.
//!
//! Runs side-effecting operations as command values. [`TransitionController::begin_reclassify`]
//! and its siblings validate the request, move the affected items to the
//! in-flight phase, remember how to undo that, and hand back a [`Ticket`]
//! naming the backend call. Once the call resolves,
//! [`TransitionController::finish`] either rolls the items back or starts
//! their exit animation. Items leave the store only when the animation timer
//! fires in [`TransitionController::fire_due`].
//!
//! The controller never calls the backend itself, so several tickets for
//! distinct items can be outstanding at once.

use std::collections::HashMap;

use thiserror::Error;
use tokio::time::Instant;

use crate::config::TimingSettings;
use crate::domain::{
    BatchAction, BatchActionRequest, Bucket, CategoryId, ConfirmSummary, Correction, EmailId,
    EmailItem, OperationId,
};
use crate::providers::backend::{ApiError, ApiResult, DeleteResult, MoveResult, TriageApi};

use super::item_store::{ItemPhase, ItemStore, PhaseKind, StoreError};
use super::scheduler::{Scheduler, TaskId};

/// Errors raised while starting or finishing a transition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    /// An affected item cannot take part right now.
    #[error(transparent)]
    Item(#[from] StoreError),

    /// The item has no pending category change to send.
    #[error("email {0} has no pending category change")]
    NothingToSubmit(EmailId),

    /// Nothing is listed to act on.
    #[error("no emails to confirm")]
    EmptyBatch,

    /// `finish` was called for an operation that is not in flight.
    #[error("unknown operation: {0}")]
    UnknownOperation(OperationId),

    /// The backend answered with a response for a different call.
    #[error("unexpected response for operation {0}")]
    UnexpectedResponse(OperationId),
}

/// Result type for transition operations.
pub type TransitionResult<T> = Result<T, TransitionError>;

/// A backend call a ticket asks the caller to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    /// Move one item into a category outside the viewed bucket.
    Reclassify {
        email_id: EmailId,
        category_id: CategoryId,
    },
    /// Send a pending same-bucket correction for one item.
    SubmitEdit {
        email_id: EmailId,
        category_id: CategoryId,
    },
    /// Confirm every listed item, carrying unsent corrections.
    ConfirmAll {
        bucket: Bucket,
        corrections: Vec<Correction>,
    },
    /// Move every item of a category to its folder.
    BatchMove { category_id: CategoryId },
    /// Delete every item of a category.
    BatchDelete { category_id: CategoryId },
}

impl ApiCall {
    /// Performs the call against `api`.
    pub async fn dispatch<A: TriageApi + ?Sized>(&self, api: &A) -> ApiResult<ApiResponse> {
        match self {
            Self::Reclassify {
                email_id,
                category_id,
            }
            | Self::SubmitEdit {
                email_id,
                category_id,
            } => api
                .reclassify_email(email_id, category_id)
                .await
                .map(ApiResponse::Reclassified),
            Self::ConfirmAll {
                bucket,
                corrections,
            } => api
                .confirm_all_in_view(bucket, corrections)
                .await
                .map(ApiResponse::Confirmed),
            Self::BatchMove { category_id } => api
                .batch_move_to_folder(category_id)
                .await
                .map(ApiResponse::Moved),
            Self::BatchDelete { category_id } => api
                .batch_delete_category(category_id)
                .await
                .map(ApiResponse::Deleted),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Reclassify { .. } => "reclassify",
            Self::SubmitEdit { .. } => "submit_edit",
            Self::ConfirmAll { .. } => "confirm_all",
            Self::BatchMove { .. } => "batch_move",
            Self::BatchDelete { .. } => "batch_delete",
        }
    }
}

/// Successful backend answer to an [`ApiCall`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Reclassified(EmailItem),
    Confirmed(ConfirmSummary),
    Moved(MoveResult),
    Deleted(DeleteResult),
}

/// A started operation: the call to perform and the handle to finish it with.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub op: OperationId,
    pub call: ApiCall,
}

/// How a finished operation changed the list.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The backend committed the change; these items are animating out.
    Exiting {
        op: OperationId,
        ids: Vec<EmailId>,
        /// Present for a bulk confirm.
        summary: Option<ConfirmSummary>,
        /// Affected count reported by a batch move or delete.
        affected: Option<u32>,
        retire_at: Instant,
    },
    /// A correction was accepted; the item stays listed with the new record.
    Committed { op: OperationId, item: EmailItem },
    /// The call failed; items are back in the phase they had before.
    RolledBack {
        op: OperationId,
        error: ApiError,
        restored: Vec<EmailId>,
    },
}

/// Timed work owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Exit animation window for an operation's items has elapsed.
    Retire(OperationId),
    /// Summary panel display window has elapsed.
    ClearSummary,
    /// A transient notice has been shown long enough.
    ExpireNotice(u64),
}

/// Result of a timer firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fired {
    /// Items removed from the store.
    Retired {
        op: OperationId,
        ids: Vec<EmailId>,
    },
    /// The summary panel was cleared.
    SummaryCleared,
    /// A notice expired.
    NoticeExpired(u64),
}

#[derive(Debug)]
struct InFlight {
    call: ApiCall,
    rollback: Vec<(EmailId, ItemPhase)>,
}

#[derive(Debug, Clone, Copy)]
struct SummaryPanel {
    summary: ConfirmSummary,
    timer: TaskId,
}

/// Sequences side effects, rollback and exit animation.
#[derive(Debug)]
pub struct TransitionController {
    timing: TimingSettings,
    next_op: u64,
    in_flight: HashMap<OperationId, InFlight>,
    exiting: HashMap<OperationId, Vec<EmailId>>,
    summary: Option<SummaryPanel>,
    timers: Scheduler<Timer>,
}

impl TransitionController {
    /// Creates a controller using the given animation and display windows.
    pub fn new(timing: TimingSettings) -> Self {
        Self {
            timing,
            next_op: 1,
            in_flight: HashMap::new(),
            exiting: HashMap::new(),
            summary: None,
            timers: Scheduler::new(),
        }
    }

    fn allocate_op(&mut self) -> OperationId {
        let op = OperationId(self.next_op);
        self.next_op += 1;
        op
    }

    fn start(
        &mut self,
        store: &mut ItemStore,
        targets: Vec<EmailId>,
        call: ApiCall,
    ) -> TransitionResult<Ticket> {
        for id in &targets {
            store.ensure_stable(id)?;
        }

        let op = self.allocate_op();
        let mut rollback = Vec::with_capacity(targets.len());
        for id in targets {
            let prior = store.mark_in_flight(&id, op)?;
            rollback.push((id, prior));
        }

        tracing::info!(%op, call = call.name(), items = rollback.len(), "operation started");
        self.in_flight.insert(
            op,
            InFlight {
                call: call.clone(),
                rollback,
            },
        );
        Ok(Ticket { op, call })
    }

    /// Starts an immediate reclassify of one item. No optimistic change is
    /// applied; the item stays where it is until the backend answers.
    pub fn begin_reclassify(
        &mut self,
        store: &mut ItemStore,
        email_id: EmailId,
        category_id: CategoryId,
    ) -> TransitionResult<Ticket> {
        let call = ApiCall::Reclassify {
            email_id: email_id.clone(),
            category_id,
        };
        self.start(store, vec![email_id], call)
    }

    /// Starts sending the pending category change of one item.
    pub fn begin_submit(
        &mut self,
        store: &mut ItemStore,
        email_id: EmailId,
    ) -> TransitionResult<Ticket> {
        store.ensure_stable(&email_id)?;
        let category_id = store
            .pending_edit(&email_id)
            .and_then(|patch| patch.target_category())
            .cloned()
            .ok_or_else(|| TransitionError::NothingToSubmit(email_id.clone()))?;

        let call = ApiCall::SubmitEdit {
            email_id: email_id.clone(),
            category_id,
        };
        self.start(store, vec![email_id], call)
    }

    /// Starts confirming every listed item that is not already leaving.
    /// Pending category edits travel with the request as corrections.
    pub fn begin_confirm_all(
        &mut self,
        store: &mut ItemStore,
        bucket: Bucket,
    ) -> TransitionResult<Ticket> {
        let targets: Vec<EmailId> = store
            .ids()
            .into_iter()
            .filter(|id| {
                store
                    .phase(id)
                    .is_some_and(|phase| phase.kind() != PhaseKind::AnimatingOut)
            })
            .collect();
        if targets.is_empty() {
            return Err(TransitionError::EmptyBatch);
        }

        let corrections = targets
            .iter()
            .filter_map(|id| {
                let category_id = store.pending_edit(id)?.target_category()?.clone();
                Some(Correction {
                    email_id: id.clone(),
                    category_id,
                })
            })
            .collect();

        self.start(
            store,
            targets,
            ApiCall::ConfirmAll {
                bucket,
                corrections,
            },
        )
    }

    /// Starts a confirmed batch action over every listed item whose effective
    /// category is the request's category.
    pub fn begin_batch(
        &mut self,
        store: &mut ItemStore,
        request: &BatchActionRequest,
    ) -> TransitionResult<Ticket> {
        // The backend acts on stored categories, not queued corrections.
        let targets: Vec<EmailId> = store
            .ids()
            .into_iter()
            .filter(|id| {
                !matches!(store.phase(id), Some(ItemPhase::AnimatingOut { .. }))
                    && store
                        .get(id)
                        .is_some_and(|item| item.category_id.as_ref() == Some(&request.category_id))
            })
            .collect();

        let category_id = request.category_id.clone();
        let call = match request.action {
            BatchAction::Move => ApiCall::BatchMove { category_id },
            BatchAction::Delete => ApiCall::BatchDelete { category_id },
        };
        self.start(store, targets, call)
    }

    /// Applies the outcome of a ticket's backend call.
    pub fn finish(
        &mut self,
        store: &mut ItemStore,
        op: OperationId,
        outcome: ApiResult<ApiResponse>,
        now: Instant,
    ) -> TransitionResult<Completion> {
        let InFlight { call, rollback } = self
            .in_flight
            .remove(&op)
            .ok_or(TransitionError::UnknownOperation(op))?;

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%op, call = call.name(), error = %error, "operation failed, rolling back");
                return Ok(Self::roll_back(store, op, rollback, error));
            }
        };

        let (summary, affected) = match (&call, response) {
            (ApiCall::SubmitEdit { email_id, .. }, ApiResponse::Reclassified(item)) => {
                store.commit(email_id);
                store.patch(item.clone());
                store.settle(email_id, op);
                tracing::info!(%op, email_id = %email_id, "correction committed");
                return Ok(Completion::Committed { op, item });
            }
            (ApiCall::Reclassify { .. }, ApiResponse::Reclassified(_)) => (None, None),
            (ApiCall::ConfirmAll { .. }, ApiResponse::Confirmed(summary)) => (Some(summary), None),
            (ApiCall::BatchMove { .. }, ApiResponse::Moved(result)) => (None, Some(result.moved)),
            (ApiCall::BatchDelete { .. }, ApiResponse::Deleted(result)) => {
                (None, Some(result.deleted))
            }
            _ => {
                let error = ApiError::Request("unexpected response".to_string());
                Self::roll_back(store, op, rollback, error);
                return Err(TransitionError::UnexpectedResponse(op));
            }
        };

        if let Some(summary) = summary {
            self.show_summary(summary, now);
        }
        let ids: Vec<EmailId> = rollback
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| store.begin_exit(id, op))
            .collect();

        let retire_at = now + self.timing.exit_animation();
        if !ids.is_empty() {
            self.exiting.insert(op, ids.clone());
            self.timers.schedule(retire_at, Timer::Retire(op));
        }
        tracing::info!(%op, call = call.name(), items = ids.len(), "operation committed");

        Ok(Completion::Exiting {
            op,
            ids,
            summary,
            affected,
            retire_at,
        })
    }

    fn roll_back(
        store: &mut ItemStore,
        op: OperationId,
        rollback: Vec<(EmailId, ItemPhase)>,
        error: ApiError,
    ) -> Completion {
        let restored = rollback
            .into_iter()
            .filter_map(|(id, prior)| store.restore(&id, op, prior).then_some(id))
            .collect();
        Completion::RolledBack {
            op,
            error,
            restored,
        }
    }

    fn show_summary(&mut self, summary: ConfirmSummary, now: Instant) {
        if let Some(previous) = self.summary.take() {
            self.timers.cancel(previous.timer);
        }
        let timer = self
            .timers
            .schedule(now + self.timing.summary_display(), Timer::ClearSummary);
        self.summary = Some(SummaryPanel { summary, timer });
    }

    /// Summary panel content, while shown.
    pub fn summary(&self) -> Option<ConfirmSummary> {
        self.summary.map(|panel| panel.summary)
    }

    /// Clears the summary panel and its pending auto-clear. Returns false if
    /// nothing was shown.
    pub fn dismiss_summary(&mut self) -> bool {
        match self.summary.take() {
            Some(panel) => {
                self.timers.cancel(panel.timer);
                true
            }
            None => false,
        }
    }

    /// Schedules expiry of a transient notice.
    pub fn schedule_notice_expiry(&mut self, notice: u64, at: Instant) -> TaskId {
        self.timers.schedule(at, Timer::ExpireNotice(notice))
    }

    /// Cancels a timer started by [`schedule_notice_expiry`](Self::schedule_notice_expiry).
    pub fn cancel_timer(&mut self, task: TaskId) -> bool {
        self.timers.cancel(task).is_some()
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Fires every timer due at `now`.
    pub fn fire_due(&mut self, store: &mut ItemStore, now: Instant) -> Vec<Fired> {
        let mut fired = Vec::new();
        for (task, timer) in self.timers.take_due(now) {
            match timer {
                Timer::Retire(op) => {
                    let ids: Vec<EmailId> = self
                        .exiting
                        .remove(&op)
                        .unwrap_or_default()
                        .into_iter()
                        .filter(|id| store.retire(id, op).is_some())
                        .collect();
                    tracing::debug!(%op, items = ids.len(), "exit animation finished");
                    fired.push(Fired::Retired { op, ids });
                }
                Timer::ClearSummary => {
                    if self.summary.is_some_and(|panel| panel.timer == task) {
                        self.summary = None;
                        tracing::debug!("summary auto-cleared");
                        fired.push(Fired::SummaryCleared);
                    }
                }
                Timer::ExpireNotice(notice) => fired.push(Fired::NoticeExpired(notice)),
            }
        }
        fired
    }

    /// Returns true if `op` has been started and not yet finished.
    pub fn is_in_flight(&self, op: OperationId) -> bool {
        self.in_flight.contains_key(&op)
    }

    /// Number of operations awaiting their backend call.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}
