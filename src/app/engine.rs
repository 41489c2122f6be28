//! The triage engine.
//!
//! Wires the item store, grouping, approvals, batch gate and transition
//! controller to the backend and the page state. Every method runs on the
//! caller's task; the async ones suspend only at the backend call.
//!
//! Side-effecting operations come in two forms. The `async` methods
//! (`reclassify`, `confirm_all`, ...) begin a transition, await the backend
//! and finish it in one go. Hosts that want operations on distinct items to
//! overlap can instead take the [`Ticket`] from a `begin_*` method, run
//! [`ApiCall::dispatch`](crate::services::ApiCall::dispatch) themselves, and
//! hand the outcome to [`TriageEngine::complete`].

use tokio::time::Instant;

use crate::config::{ReclassifyDispatch, Settings};
use crate::domain::{
    BatchAction, BatchActionRequest, Bucket, Category, CategoryCatalog, CategoryId,
    ConfirmSummary, EmailId, EmailItem, EmailPatch, Folder, OperationId, RecentAction,
};
use crate::providers::backend::{ApiError, ApiResult, EmailFilter, TriageApi};
use crate::services::{
    group_by_category, ApiResponse, ApprovalSet, BatchActionGate, CategoryGroup, Completion,
    Fired, GateError, GroupKey, ItemStore, ItemView, PhaseKind, StoreError, Ticket,
    TransitionController, TransitionError,
};

use super::events::{EventBus, Notice, NoticeId, TriageEvent};
use super::state::{PageState, PageStatus};
use super::{TriageError, TriageResult};

/// How a local edit was routed.
#[derive(Debug, Clone, PartialEq)]
pub enum EditRoute {
    /// Held in the pending edit ledger.
    Queued,
    /// Moves the item out of the viewed bucket; must be sent now.
    Dispatch(Ticket),
}

/// Client-side reconciliation engine for one triage page.
#[derive(Debug)]
pub struct TriageEngine<A: TriageApi> {
    api: A,
    settings: Settings,
    page: PageState,
    store: ItemStore,
    approvals: ApprovalSet,
    gate: BatchActionGate,
    transitions: TransitionController,
    events: EventBus,
}

impl<A: TriageApi> TriageEngine<A> {
    /// Creates an engine for the bucket named in `settings`.
    pub fn new(api: A, settings: Settings) -> Self {
        Self {
            api,
            page: PageState::new(settings.view.bucket.clone()),
            store: ItemStore::new(),
            approvals: ApprovalSet::new(),
            gate: BatchActionGate::new(settings.batch.clone()),
            transitions: TransitionController::new(settings.timing),
            events: EventBus::new(),
            settings,
        }
    }

    /// The event bus. Clone it to subscribe from another component.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Page-level state.
    pub fn page(&self) -> &PageState {
        &self.page
    }

    /// Engine settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The backend client.
    pub fn api(&self) -> &A {
        &self.api
    }

    // Loading

    /// Checks the session, fetches the item list, then categories and
    /// folders.
    ///
    /// A failed item fetch is fatal and leaves the page in
    /// [`PageStatus::Failed`]. Categories and folders degrade to empty.
    pub async fn load_page(&mut self) -> TriageResult<()> {
        self.page.status = PageStatus::Loading;

        let auth = match self.api.check_auth().await {
            Ok(auth) => auth,
            Err(e) => return Err(self.fail_load(e)),
        };
        if !auth.authenticated {
            self.require_auth();
            return Ok(());
        }
        self.page.identity = auth.identity;

        let page = match self.api.fetch_emails(&self.filter()).await {
            Ok(page) => page,
            Err(e) => return Err(self.fail_load(e)),
        };

        let (categories, folders) =
            futures::join!(self.api.fetch_categories(None), self.api.fetch_folders());
        self.page.categories = CategoryCatalog::new(categories.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load categories, continuing without");
            Vec::new()
        }));
        self.page.folders = folders.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load folders, continuing without");
            Vec::new()
        });

        self.page.total = page.total;
        self.replace_items(page.items);
        Ok(())
    }

    /// Re-fetches the item list, keeping categories and folders.
    pub async fn refresh(&mut self) -> TriageResult<()> {
        if !self.page.is_ready() {
            return Err(TriageError::NotReady);
        }
        let page = match self.api.fetch_emails(&self.filter()).await {
            Ok(page) => page,
            Err(e) => return Err(self.fail_load(e)),
        };
        self.page.total = page.total;
        self.replace_items(page.items);
        Ok(())
    }

    fn filter(&self) -> EmailFilter {
        let api = &self.settings.api;
        let mut filter = EmailFilter::with_limit(api.fetch_limit);
        filter.folder = api.folder.clone();
        filter.status = api.status.clone();
        filter
    }

    fn fail_load(&mut self, error: ApiError) -> TriageError {
        if error == ApiError::AuthRequired {
            self.require_auth();
        } else {
            tracing::error!(error = %error, "failed to load emails");
            self.page.status = PageStatus::Failed {
                message: error.to_string(),
            };
        }
        TriageError::Api(error)
    }

    fn require_auth(&mut self) {
        tracing::info!("no session, account connection required");
        self.page.status = PageStatus::AuthRequired;
        self.page.identity = None;
        self.events.publish(TriageEvent::AuthRequired);
    }

    /// Keeps items that belong to the viewed bucket, plus any whose category
    /// cannot be resolved so nothing silently disappears.
    fn in_view(&self, item: &EmailItem) -> bool {
        if self.page.categories.is_empty() {
            return true;
        }
        match item
            .category_id
            .as_ref()
            .and_then(|id| self.page.categories.bucket_of(id))
        {
            Some(bucket) => bucket == &self.page.bucket,
            None => true,
        }
    }

    fn replace_items(&mut self, items: Vec<EmailItem>) {
        let items: Vec<EmailItem> = items.into_iter().filter(|i| self.in_view(i)).collect();
        let outcome = self.store.load(items);

        let store = &self.store;
        self.approvals.retain(|id| store.contains(id));
        if let Some(open) = self.page.open_detail.clone() {
            if !self.store.contains(&open) {
                self.close_detail();
            }
        }

        self.page.status = PageStatus::Ready;
        tracing::info!(
            items = outcome.loaded,
            dropped_edits = outcome.dropped_edits.len(),
            bucket = %self.page.bucket,
            "view loaded"
        );
        self.events.publish(TriageEvent::ViewLoaded {
            items: self.store.len(),
            categories: self.page.categories.all().len(),
            folders: self.page.folders.len(),
        });
    }

    // Read access

    /// Listed items grouped by category, with pending edits overlaid.
    pub fn groups(&self) -> Vec<CategoryGroup<ItemView>> {
        let catalog = &self.page.categories;
        let categories: Vec<Category> = catalog.in_bucket(&self.page.bucket).cloned().collect();
        let mut groups = group_by_category(&categories, self.store.projection());

        // A queued edit may point into another bucket; label it properly.
        for group in &mut groups {
            let known = match &group.key {
                GroupKey::Unrecognized(id) => catalog.get(id).cloned(),
                _ => None,
            };
            if let Some(category) = known {
                group.key = GroupKey::Known(category);
            }
        }
        groups
    }

    /// Listed items in fetch order, with pending edits overlaid.
    pub fn items(&self) -> Vec<ItemView> {
        self.store.projection()
    }

    /// One item as the user sees it.
    pub fn item(&self, id: &EmailId) -> Option<EmailItem> {
        self.store.effective(id)
    }

    /// Phase of one item.
    pub fn phase(&self, id: &EmailId) -> Option<PhaseKind> {
        self.store.phase(id).map(|phase| phase.kind())
    }

    /// Items playing their exit animation.
    pub fn animating_out(&self) -> Vec<EmailId> {
        self.store.animating_out()
    }

    /// Number of items with an uncommitted edit.
    pub fn pending_count(&self) -> usize {
        self.store.pending_count()
    }

    /// The uncommitted edit for an item.
    pub fn pending_edit(&self, id: &EmailId) -> Option<&EmailPatch> {
        self.store.pending_edit(id)
    }

    pub fn is_approved(&self, id: &EmailId) -> bool {
        self.approvals.is_approved(id)
    }

    pub fn approval_count(&self) -> usize {
        self.approvals.count()
    }

    /// Approved items, for the host's execute-approved flow.
    pub fn approved_ids(&self) -> Vec<EmailId> {
        self.approvals.ids()
    }

    /// Batch action awaiting confirmation.
    pub fn pending_batch(&self) -> Option<&BatchActionRequest> {
        self.gate.pending()
    }

    /// Summary panel content, while shown.
    pub fn summary(&self) -> Option<ConfirmSummary> {
        self.transitions.summary()
    }

    /// Known folders.
    pub fn folders(&self) -> &[Folder] {
        &self.page.folders
    }

    // Edits and transitions

    fn dispatches_immediately(&self, target: &Bucket) -> bool {
        if target == &self.page.bucket {
            return false;
        }
        match self.settings.view.reclassify_dispatch {
            ReclassifyDispatch::IntoWorkOnly => target.is_work(),
            ReclassifyDispatch::AnyDirection => true,
        }
    }

    /// Routes a local edit: into the ledger, or, when it moves the item out
    /// of the viewed bucket, into an immediate reclassify.
    pub fn stage_edit(&mut self, id: &EmailId, patch: EmailPatch) -> TriageResult<EditRoute> {
        if let Some(target) = patch.target_category() {
            let bucket = self
                .page
                .categories
                .bucket_of(target)
                .ok_or_else(|| TriageError::UnknownCategory(target.clone()))?;

            if self.dispatches_immediately(bucket) {
                if !patch.without_category().is_empty() {
                    return Err(TriageError::MixedEdit(id.clone()));
                }
                tracing::debug!(email_id = %id, category_id = %target, "cross-bucket edit, dispatching now");
                let target = target.clone();
                return self
                    .begin_reclassify(id, &target)
                    .map(EditRoute::Dispatch);
            }
        }

        self.store.apply_local_edit(id, patch)?;
        Ok(EditRoute::Queued)
    }

    /// Applies a local edit, sending it at once if it crosses buckets.
    pub async fn apply_local_edit(
        &mut self,
        id: &EmailId,
        patch: EmailPatch,
    ) -> TriageResult<EditRoute> {
        let route = self.stage_edit(id, patch)?;
        if let EditRoute::Dispatch(ticket) = &route {
            self.run(ticket.clone()).await?;
        }
        Ok(route)
    }

    /// Drops the uncommitted edit for an item.
    pub fn discard_edit(&mut self, id: &EmailId) -> TriageResult<Option<EmailPatch>> {
        Ok(self.store.discard_edit(id)?)
    }

    /// Starts an immediate reclassify of one item.
    pub fn begin_reclassify(
        &mut self,
        id: &EmailId,
        category_id: &CategoryId,
    ) -> TriageResult<Ticket> {
        if self.page.categories.get(category_id).is_none() {
            return Err(TriageError::UnknownCategory(category_id.clone()));
        }
        Ok(self
            .transitions
            .begin_reclassify(&mut self.store, id.clone(), category_id.clone())?)
    }

    /// Reclassifies one item now; on success it animates out of the list.
    pub async fn reclassify(
        &mut self,
        id: &EmailId,
        category_id: &CategoryId,
    ) -> TriageResult<Completion> {
        let ticket = self.begin_reclassify(id, category_id)?;
        self.run(ticket).await
    }

    /// Starts sending an item's pending category change.
    pub fn begin_submit(&mut self, id: &EmailId) -> TriageResult<Ticket> {
        Ok(self.transitions.begin_submit(&mut self.store, id.clone())?)
    }

    /// Sends an item's pending category change; the item stays listed.
    pub async fn submit_edit(&mut self, id: &EmailId) -> TriageResult<Completion> {
        let ticket = self.begin_submit(id)?;
        self.run(ticket).await
    }

    /// Starts confirming every listed item.
    pub fn begin_confirm_all(&mut self) -> TriageResult<Ticket> {
        if !self.page.is_ready() {
            return Err(TriageError::NotReady);
        }
        let bucket = self.page.bucket.clone();
        Ok(self.transitions.begin_confirm_all(&mut self.store, bucket)?)
    }

    /// Confirms every listed item. On success they animate out together and
    /// the summary panel is shown.
    pub async fn confirm_all(&mut self) -> TriageResult<Completion> {
        let ticket = self.begin_confirm_all()?;
        self.run(ticket).await
    }

    /// Asks for confirmation of a batch action on one category.
    pub fn initiate_batch(
        &mut self,
        category_id: &CategoryId,
        action: BatchAction,
    ) -> TriageResult<BatchActionRequest> {
        let category = self
            .page
            .categories
            .get(category_id)
            .cloned()
            .ok_or_else(|| TriageError::UnknownCategory(category_id.clone()))?;

        self.gate.initiate(&category, action)?;
        let request = self
            .gate
            .pending()
            .cloned()
            .ok_or(GateError::NoPendingRequest)?;
        self.events
            .publish(TriageEvent::BatchRequested(request.clone()));
        Ok(request)
    }

    /// Drops the pending batch action.
    pub fn cancel_batch(&mut self) -> Option<BatchActionRequest> {
        let cancelled = self.gate.cancel();
        if cancelled.is_some() {
            self.events.publish(TriageEvent::BatchCancelled);
        }
        cancelled
    }

    /// Starts the pending batch action.
    ///
    /// If the items cannot be claimed the request stays pending and an error
    /// notice is raised. Once started, the request is cleared whatever the
    /// backend answers.
    pub fn begin_batch(&mut self) -> TriageResult<Ticket> {
        let request = self
            .gate
            .pending()
            .cloned()
            .ok_or(GateError::NoPendingRequest)?;
        match self.transitions.begin_batch(&mut self.store, &request) {
            Ok(ticket) => {
                let _ = self.gate.confirm();
                Ok(ticket)
            }
            Err(e) => {
                tracing::warn!(category_id = %request.category_id, error = %e, "batch action refused");
                self.raise_error(format!("Cannot {} \"{}\" yet: {e}", request.action, request.label));
                Err(e.into())
            }
        }
    }

    /// Executes the pending batch action.
    pub async fn confirm_batch(&mut self) -> TriageResult<Completion> {
        let ticket = self.begin_batch()?;
        self.run(ticket).await
    }

    async fn run(&mut self, ticket: Ticket) -> TriageResult<Completion> {
        let outcome = ticket.call.dispatch(&self.api).await;
        self.complete(ticket.op, outcome)
    }

    /// Applies the backend's answer for a ticket.
    ///
    /// A failed call is rolled back, surfaced, and returned as an error.
    pub fn complete(
        &mut self,
        op: OperationId,
        outcome: ApiResult<ApiResponse>,
    ) -> TriageResult<Completion> {
        let completion = match self
            .transitions
            .finish(&mut self.store, op, outcome, Instant::now())
        {
            Ok(completion) => completion,
            Err(TransitionError::UnexpectedResponse(op)) => {
                let error = ApiError::Request("unexpected response from backend".to_string());
                self.surface_error(Some(op), error);
                return Err(TransitionError::UnexpectedResponse(op).into());
            }
            Err(e) => return Err(e.into()),
        };

        match &completion {
            Completion::Exiting {
                op, ids, summary, ..
            } => {
                self.events.publish(TriageEvent::ItemsAnimating {
                    op: *op,
                    ids: ids.clone(),
                });
                if let Some(summary) = summary {
                    self.events.publish(TriageEvent::SummaryShown(*summary));
                }
            }
            Completion::Committed { item, .. } => {
                self.events
                    .publish(TriageEvent::EditCommitted(item.id.clone()));
            }
            Completion::RolledBack { op, error, .. } => {
                self.surface_error(Some(*op), error.clone());
                return Err(TriageError::Api(error.clone()));
            }
        }
        Ok(completion)
    }

    fn surface_error(&mut self, op: Option<OperationId>, error: ApiError) {
        self.events.publish(TriageEvent::RequestFailed {
            op,
            message: error.to_string(),
        });
        if error == ApiError::AuthRequired {
            self.require_auth();
        } else {
            self.raise_error(error.to_string());
        }
    }

    // Approval and detail view

    /// Flips an item's approval and closes its detail view. Returns the new
    /// state.
    pub fn toggle_approval(&mut self, id: &EmailId) -> TriageResult<bool> {
        if !self.store.contains(id) {
            return Err(StoreError::UnknownItem(id.clone()).into());
        }
        let approved = self.approvals.toggle(id);
        if self.page.close_detail_for(id) {
            self.events.publish(TriageEvent::DetailClosed);
        }
        self.events.publish(TriageEvent::ApprovalChanged {
            email_id: id.clone(),
            approved,
        });
        Ok(approved)
    }

    /// Opens the detail view for a listed item.
    pub fn open_detail(&mut self, id: &EmailId) -> TriageResult<()> {
        if !self.store.contains(id) {
            return Err(StoreError::UnknownItem(id.clone()).into());
        }
        self.page.open_detail = Some(id.clone());
        self.events.publish(TriageEvent::DetailOpened(id.clone()));
        Ok(())
    }

    /// Closes the detail view. Returns false if none was open.
    pub fn close_detail(&mut self) -> bool {
        if self.page.open_detail.take().is_some() {
            self.events.publish(TriageEvent::DetailClosed);
            true
        } else {
            false
        }
    }

    // Folders and undo

    /// Creates a routing folder.
    pub async fn create_folder(&mut self, name: &str) -> TriageResult<Folder> {
        match self.api.create_folder(name).await {
            Ok(folder) => {
                tracing::info!(folder = %folder.name, "folder created");
                self.page.folders.push(folder.clone());
                self.raise_success(format!("Folder \"{}\" created", folder.name));
                self.events.publish(TriageEvent::FolderCreated(folder.clone()));
                Ok(folder)
            }
            Err(e) => {
                self.surface_error(None, e.clone());
                Err(e.into())
            }
        }
    }

    /// Recent undoable actions. Degrades to empty on failure.
    pub async fn recent_actions(&self, limit: u32) -> Vec<RecentAction> {
        self.api.recent_actions(limit).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load recent actions");
            Vec::new()
        })
    }

    /// Reverts a recent action, then re-fetches the list.
    pub async fn undo(&mut self, action_id: &str) -> TriageResult<()> {
        if let Err(e) = self.api.undo_action(action_id).await {
            self.surface_error(None, e.clone());
            return Err(e.into());
        }
        tracing::info!(action_id, "action undone");
        self.raise_success("Action undone".to_string());
        self.refresh().await
    }

    // Notices, summary and timers

    fn raise_error(&mut self, message: String) -> NoticeId {
        let id = self.page.next_notice_id();
        let notice = Notice::error(id, message);
        self.page.push_notice(notice.clone(), None);
        self.events.publish(TriageEvent::NoticeRaised(notice));
        id
    }

    fn raise_success(&mut self, message: String) -> NoticeId {
        let id = self.page.next_notice_id();
        let display = self.settings.timing.notice_display();
        let notice = Notice::success(id, message, display);
        let expiry = self
            .transitions
            .schedule_notice_expiry(id.0, Instant::now() + display);
        self.page.push_notice(notice.clone(), Some(expiry));
        self.events.publish(TriageEvent::NoticeRaised(notice));
        id
    }

    /// Removes a notice and cancels its auto-dismiss. Returns false if it was
    /// already gone.
    pub fn dismiss_notice(&mut self, id: NoticeId) -> bool {
        match self.page.remove_notice(id) {
            Some((_, expiry)) => {
                if let Some(task) = expiry {
                    self.transitions.cancel_timer(task);
                }
                self.events.publish(TriageEvent::NoticeDismissed(id));
                true
            }
            None => false,
        }
    }

    /// Clears the summary panel and its auto-clear timer.
    pub fn dismiss_summary(&mut self) -> bool {
        let dismissed = self.transitions.dismiss_summary();
        if dismissed {
            self.events.publish(TriageEvent::SummaryCleared);
        }
        dismissed
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.transitions.next_deadline()
    }

    /// Fires every timer due at `now`.
    pub fn fire_due(&mut self, now: Instant) -> Vec<Fired> {
        let fired = self.transitions.fire_due(&mut self.store, now);
        for event in &fired {
            match event {
                Fired::Retired { op, ids } => {
                    for id in ids {
                        self.approvals.unapprove(id);
                        if self.page.close_detail_for(id) {
                            self.events.publish(TriageEvent::DetailClosed);
                        }
                    }
                    self.events.publish(TriageEvent::ItemsRetired {
                        op: *op,
                        ids: ids.clone(),
                    });
                }
                Fired::SummaryCleared => self.events.publish(TriageEvent::SummaryCleared),
                Fired::NoticeExpired(raw) => {
                    let id = NoticeId(*raw);
                    if self.page.remove_notice(id).is_some() {
                        self.events.publish(TriageEvent::NoticeDismissed(id));
                    }
                }
            }
        }
        fired
    }

    /// Sleeps until the next timer deadline, then fires what is due. Returns
    /// immediately with nothing when no timer is pending.
    pub async fn run_due_timers(&mut self) -> Vec<Fired> {
        match self.next_deadline() {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.fire_due(Instant::now())
            }
            None => Vec::new(),
        }
    }
}
