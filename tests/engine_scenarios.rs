//! End-to-end scenarios for the triage engine.
//!
//! These tests drive [`TriageEngine`] through an in-memory backend and check
//! the reconciliation rules across module boundaries: the pending edit
//! ledger, cross-bucket dispatch, batch actions, bulk confirm and the timed
//! exit animation and summary panel. Timers run on paused tokio time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::time::Instant;

use triage::app::{NoticeLevel, TriageEngine, TriageError, TriageEvent};
use triage::config::{ReclassifyDispatch, Settings};
use triage::domain::{
    BatchAction, Bucket, Category, CategoryId, ConfirmSummary, Correction, EmailId, EmailItem,
    EmailPatch, Folder, RecentAction,
};
use triage::providers::backend::{
    ApiError, ApiResult, AuthStatus, DeleteResult, EmailFilter, EmailPage, MoveResult, TriageApi,
};
use triage::services::{
    ApiResponse, Fired, GateError, PhaseKind, StoreError, TransitionError,
};

// ============================================================================
// Fake backend
// ============================================================================

#[derive(Default)]
struct Backend {
    items: Vec<EmailItem>,
    categories: Vec<Category>,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    confirm_summary: ConfirmSummary,
    confirm_corrections: Vec<Correction>,
}

#[derive(Clone, Default)]
struct FakeApi {
    backend: Arc<Mutex<Backend>>,
}

impl FakeApi {
    fn new(items: Vec<EmailItem>) -> Self {
        let api = Self::default();
        {
            let mut backend = api.backend.lock().unwrap();
            backend.items = items;
            backend.categories = categories();
        }
        api
    }

    fn fail(&self, call: &'static str) {
        self.backend.lock().unwrap().failing.insert(call);
    }

    fn set_items(&self, items: Vec<EmailItem>) {
        self.backend.lock().unwrap().items = items;
    }

    fn calls(&self) -> Vec<String> {
        self.backend.lock().unwrap().calls.clone()
    }

    fn record(&self, call: &'static str, detail: String) -> ApiResult<()> {
        let mut backend = self.backend.lock().unwrap();
        backend.calls.push(format!("{}({})", call, detail));
        if backend.failing.contains(call) {
            return Err(ApiError::Request(format!("{} failed", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl TriageApi for FakeApi {
    async fn check_auth(&self) -> ApiResult<AuthStatus> {
        Ok(AuthStatus {
            authenticated: true,
            identity: None,
        })
    }

    async fn fetch_emails(&self, _filter: &EmailFilter) -> ApiResult<EmailPage> {
        self.record("fetch_emails", String::new())?;
        let items = self.backend.lock().unwrap().items.clone();
        let total = items.len() as u32;
        Ok(EmailPage { items, total })
    }

    async fn fetch_categories(&self, _bucket: Option<Bucket>) -> ApiResult<Vec<Category>> {
        Ok(self.backend.lock().unwrap().categories.clone())
    }

    async fn fetch_folders(&self) -> ApiResult<Vec<Folder>> {
        Ok(Vec::new())
    }

    async fn create_folder(&self, name: &str) -> ApiResult<Folder> {
        self.record("create_folder", name.to_string())?;
        Ok(Folder {
            id: name.into(),
            name: name.to_string(),
        })
    }

    async fn reclassify_email(
        &self,
        id: &EmailId,
        category_id: &CategoryId,
    ) -> ApiResult<EmailItem> {
        self.record("reclassify", format!("{}, {}", id, category_id))?;
        Ok(EmailItem::new(id.clone()).with_category(category_id.clone()))
    }

    async fn confirm_all_in_view(
        &self,
        bucket: &Bucket,
        corrections: &[Correction],
    ) -> ApiResult<ConfirmSummary> {
        self.record("confirm_all", bucket.to_string())?;
        let mut backend = self.backend.lock().unwrap();
        backend.confirm_corrections = corrections.to_vec();
        Ok(backend.confirm_summary)
    }

    async fn batch_move_to_folder(&self, category_id: &CategoryId) -> ApiResult<MoveResult> {
        self.record("batch_move", category_id.to_string())?;
        Ok(MoveResult { moved: 1 })
    }

    async fn batch_delete_category(&self, category_id: &CategoryId) -> ApiResult<DeleteResult> {
        self.record("batch_delete", category_id.to_string())?;
        let mut backend = self.backend.lock().unwrap();
        let before = backend.items.len();
        backend
            .items
            .retain(|item| item.category_id.as_ref() != Some(category_id));
        Ok(DeleteResult {
            deleted: (before - backend.items.len()) as u32,
        })
    }

    async fn recent_actions(&self, _limit: u32) -> ApiResult<Vec<RecentAction>> {
        Ok(Vec::new())
    }

    async fn undo_action(&self, action_id: &str) -> ApiResult<()> {
        self.record("undo", action_id.to_string())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn categories() -> Vec<Category> {
    vec![
        Category::new("1", 1, "Urgent", Bucket::work()),
        Category::new("2", 2, "Waiting", Bucket::work()),
        Category::new("9", 9, "Newsletters", Bucket::other()),
        Category::new("10", 10, "Promotions", Bucket::other()),
        Category::new("11", 11, "Spam", Bucket::other()),
    ]
}

fn item(id: &str, category: &str, confidence: f64) -> EmailItem {
    EmailItem::new(id)
        .with_category(category)
        .with_confidence(confidence)
}

fn other_view() -> Vec<EmailItem> {
    vec![
        item("40", "9", 0.4),
        item("41", "9", 0.9),
        item("42", "9", 0.6),
        item("43", "10", 0.8),
        item("44", "11", 0.7),
    ]
}

async fn engine_with(api: &FakeApi, settings: Settings) -> TriageEngine<FakeApi> {
    let mut engine = TriageEngine::new(api.clone(), settings);
    engine.load_page().await.unwrap();
    engine
}

async fn engine(api: &FakeApi) -> TriageEngine<FakeApi> {
    engine_with(api, Settings::default()).await
}

fn ids(list: &[&str]) -> Vec<EmailId> {
    list.iter().map(|id| EmailId::from(*id)).collect()
}

fn record_events(engine: &TriageEngine<FakeApi>) -> Arc<Mutex<Vec<TriageEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.events().subscribe(move |event| {
        sink.lock().unwrap().push(event.clone());
    });
    seen
}

// ============================================================================
// Pending edit ledger
// ============================================================================

#[tokio::test]
async fn refresh_drops_edits_for_vanished_items() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;

    for id in ["40", "42", "44"] {
        engine
            .apply_local_edit(&EmailId::from(id), EmailPatch::category("10"))
            .await
            .unwrap();
    }
    assert_eq!(engine.pending_count(), 3);

    api.set_items(vec![item("42", "9", 0.6), item("43", "10", 0.8)]);
    engine.refresh().await.unwrap();

    assert_eq!(engine.pending_count(), 1);
    assert!(engine.pending_edit(&EmailId::from("40")).is_none());
    assert!(engine.pending_edit(&EmailId::from("44")).is_none());
    assert_eq!(
        engine.pending_edit(&EmailId::from("42")),
        Some(&EmailPatch::category("10"))
    );
}

#[tokio::test]
async fn pending_edit_regroups_before_commit() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;

    engine
        .apply_local_edit(&EmailId::from("41"), EmailPatch::category("11"))
        .await
        .unwrap();

    let spam = engine
        .groups()
        .into_iter()
        .find(|g| g.key.label() == "Spam")
        .unwrap();
    let members: Vec<&str> = spam.items.iter().map(|v| v.item.id.0.as_str()).collect();
    assert_eq!(members, vec!["41", "44"]);
    assert!(spam.items[0].has_pending_edit);
    assert!(api.calls().iter().all(|c| !c.starts_with("reclassify")));
}

#[tokio::test]
async fn submit_edit_commits_and_keeps_item() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;
    let id = EmailId::from("40");

    engine
        .apply_local_edit(&id, EmailPatch::category("10"))
        .await
        .unwrap();
    engine.submit_edit(&id).await.unwrap();

    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.phase(&id), Some(PhaseKind::Stable));
    assert_eq!(
        engine.item(&id).unwrap().category_id,
        Some(CategoryId::from("10"))
    );
    assert!(api.calls().contains(&"reclassify(40, 10)".to_string()));
}

// ============================================================================
// Grouping
// ============================================================================

#[tokio::test]
async fn grouping_orders_by_confidence() {
    let api = FakeApi::new(other_view());
    let engine = engine(&api).await;

    let groups = engine.groups();
    let newsletters: Vec<Option<f64>> = groups[0].items.iter().map(|v| v.item.confidence).collect();

    assert_eq!(newsletters, vec![Some(0.9), Some(0.6), Some(0.4)]);
    let total: usize = groups.iter().map(|g| g.len()).sum();
    assert_eq!(total, 5);
}

#[tokio::test]
async fn unknown_category_items_stay_visible() {
    let mut items = other_view();
    items.push(item("90", "77", 0.2));
    items.push(EmailItem::new("91"));
    let api = FakeApi::new(items);
    let engine = engine(&api).await;

    let groups = engine.groups();
    let labels: Vec<String> = groups.iter().map(|g| g.key.label()).collect();

    assert_eq!(
        labels,
        vec!["Newsletters", "Promotions", "Spam", "Category 77", "Uncategorized"]
    );
}

// ============================================================================
// Cross-bucket reclassify
// ============================================================================

#[tokio::test(start_paused = true)]
async fn cross_bucket_edit_skips_ledger_and_retires() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;
    let events = record_events(&engine);
    let id = EmailId::from("42");

    engine
        .apply_local_edit(&id, EmailPatch::category("1"))
        .await
        .unwrap();

    assert_eq!(engine.pending_count(), 0);
    assert!(engine.pending_edit(&id).is_none());
    assert!(api.calls().contains(&"reclassify(42, 1)".to_string()));
    assert_eq!(engine.animating_out(), vec![id.clone()]);
    // Still listed while the animation plays.
    assert!(engine.item(&id).is_some());

    let start = Instant::now();
    tokio::time::advance(Duration::from_millis(299)).await;
    assert!(engine.fire_due(Instant::now()).is_empty());

    tokio::time::advance(Duration::from_millis(1)).await;
    let fired = engine.fire_due(Instant::now());
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    assert!(matches!(fired.as_slice(), [Fired::Retired { ids, .. }] if ids == &vec![id.clone()]));
    assert!(engine.item(&id).is_none());

    let events = events.lock().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, TriageEvent::ItemsAnimating { ids, .. } if ids.contains(&id))));
    assert!(events
        .iter()
        .any(|e| matches!(e, TriageEvent::ItemsRetired { ids, .. } if ids.contains(&id))));
}

#[tokio::test]
async fn work_to_other_edit_is_queued_by_default() {
    let api = FakeApi::new(vec![item("60", "1", 0.5), item("61", "2", 0.5)]);
    let mut settings = Settings::default();
    settings.view.bucket = Bucket::work();
    let mut engine = engine_with(&api, settings).await;

    engine
        .apply_local_edit(&EmailId::from("60"), EmailPatch::category("9"))
        .await
        .unwrap();

    assert_eq!(engine.pending_count(), 1);
    assert!(engine.animating_out().is_empty());
}

#[tokio::test]
async fn any_direction_dispatches_work_to_other() {
    let api = FakeApi::new(vec![item("60", "1", 0.5), item("61", "2", 0.5)]);
    let mut settings = Settings::default();
    settings.view.bucket = Bucket::work();
    settings.view.reclassify_dispatch = ReclassifyDispatch::AnyDirection;
    let mut engine = engine_with(&api, settings).await;

    engine
        .apply_local_edit(&EmailId::from("60"), EmailPatch::category("9"))
        .await
        .unwrap();

    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.animating_out(), ids(&["60"]));
}

#[tokio::test]
async fn failed_reclassify_restores_item() {
    let api = FakeApi::new(other_view());
    api.fail("reclassify");
    let mut engine = engine(&api).await;
    let id = EmailId::from("42");

    let result = engine
        .apply_local_edit(&id, EmailPatch::category("1"))
        .await;

    assert!(matches!(result, Err(TriageError::Api(ApiError::Request(_)))));
    assert_eq!(engine.phase(&id), Some(PhaseKind::Stable));
    assert_eq!(
        engine.item(&id).unwrap().category_id,
        Some(CategoryId::from("9"))
    );
    assert_eq!(engine.pending_count(), 0);
    let notice = engine.page().notices().next().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.auto_dismiss.is_none());
}

#[tokio::test]
async fn cross_bucket_edit_with_other_fields_is_rejected() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;
    let id = EmailId::from("41");
    let patch = EmailPatch {
        floor_override: Some(true),
        ..EmailPatch::category("1")
    };

    let result = engine.apply_local_edit(&id, patch).await;

    assert_eq!(result, Err(TriageError::MixedEdit(id.clone())));
    assert!(engine.pending_edit(&id).is_none());
    assert_eq!(engine.phase(&id), Some(PhaseKind::Stable));
    assert!(api.calls().iter().all(|c| !c.starts_with("reclassify")));
}

#[tokio::test]
async fn mismatched_response_is_surfaced_and_rolled_back() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;
    let events = record_events(&engine);
    let ticket = engine
        .begin_reclassify(&EmailId::from("40"), &CategoryId::from("1"))
        .unwrap();

    let result = engine.complete(ticket.op, Ok(ApiResponse::Moved(MoveResult { moved: 1 })));

    assert_eq!(
        result,
        Err(TriageError::Transition(TransitionError::UnexpectedResponse(ticket.op)))
    );
    assert_eq!(engine.phase(&EmailId::from("40")), Some(PhaseKind::Stable));
    let notices: Vec<NoticeLevel> = engine.page().notices().map(|n| n.level).collect();
    assert_eq!(notices, vec![NoticeLevel::Error]);
    assert!(events.lock().unwrap().iter().any(|e| matches!(
        e,
        TriageEvent::RequestFailed { op: Some(op), .. } if *op == ticket.op
    )));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(start_paused = true)]
async fn distinct_items_overlap_and_resolve_in_any_order() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;

    let first = engine
        .begin_reclassify(&EmailId::from("40"), &CategoryId::from("1"))
        .unwrap();
    let second = engine
        .begin_reclassify(&EmailId::from("43"), &CategoryId::from("2"))
        .unwrap();

    let busy = engine.begin_reclassify(&EmailId::from("40"), &CategoryId::from("2"));
    assert_eq!(
        busy,
        Err(TriageError::Transition(TransitionError::Item(
            StoreError::Busy(EmailId::from("40"))
        )))
    );
    assert!(matches!(
        engine.apply_local_edit(&EmailId::from("43"), EmailPatch::category("9")).await,
        Err(TriageError::Item(StoreError::Busy(_)))
    ));

    let outcome = second.call.dispatch(&api).await;
    engine.complete(second.op, outcome).unwrap();
    let outcome = first.call.dispatch(&api).await;
    engine.complete(first.op, outcome).unwrap();

    assert_eq!(engine.animating_out(), ids(&["40", "43"]));
    engine.run_due_timers().await;
    assert!(engine.animating_out().is_empty());
    assert_eq!(engine.items().len(), 3);
}

// ============================================================================
// Batch actions
// ============================================================================

#[tokio::test]
async fn confirm_without_pending_batch_fails() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;

    let result = engine.confirm_batch().await;

    assert_eq!(
        result,
        Err(TriageError::Gate(GateError::NoPendingRequest))
    );
    assert!(api.calls().iter().all(|c| !c.starts_with("batch")));
}

#[tokio::test]
async fn initiate_makes_no_call_and_cancel_clears() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;

    let request = engine
        .initiate_batch(&CategoryId::from("9"), BatchAction::Move)
        .unwrap();
    assert_eq!(request.prompt(), "Move all \"Newsletters\" emails to their folder?");
    engine
        .initiate_batch(&CategoryId::from("11"), BatchAction::Delete)
        .unwrap();
    assert_eq!(engine.pending_batch().unwrap().label, "Spam");

    assert!(engine.cancel_batch().is_some());
    assert!(engine.pending_batch().is_none());
    assert!(api.calls().iter().all(|c| !c.starts_with("batch")));
}

#[tokio::test(start_paused = true)]
async fn batch_delete_removes_only_its_category() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;

    engine
        .initiate_batch(&CategoryId::from("9"), BatchAction::Delete)
        .unwrap();
    engine.confirm_batch().await.unwrap();

    assert_eq!(engine.animating_out(), ids(&["40", "41", "42"]));
    engine.run_due_timers().await;

    let remaining: Vec<EmailItem> = engine.items().into_iter().map(|v| v.item).collect();
    assert!(remaining
        .iter()
        .all(|i| i.category_id != Some(CategoryId::from("9"))));
    assert_eq!(remaining, vec![item("43", "10", 0.8), item("44", "11", 0.7)]);
    assert!(engine.pending_batch().is_none());
}

#[tokio::test]
async fn failed_batch_move_clears_request_and_keeps_state() {
    let api = FakeApi::new(other_view());
    api.fail("batch_move");
    let mut engine = engine(&api).await;
    engine
        .apply_local_edit(&EmailId::from("43"), EmailPatch::category("11"))
        .await
        .unwrap();
    let before = engine.items();

    engine
        .initiate_batch(&CategoryId::from("9"), BatchAction::Move)
        .unwrap();
    let result = engine.confirm_batch().await;

    assert!(matches!(result, Err(TriageError::Api(_))));
    assert!(engine.pending_batch().is_none());
    assert!(engine.animating_out().is_empty());
    assert_eq!(engine.items(), before);
    assert_eq!(engine.pending_count(), 1);
    assert_eq!(engine.page().notices().count(), 1);
    assert!(engine.next_deadline().is_none());
}

#[tokio::test(start_paused = true)]
async fn batch_delete_acts_on_stored_categories_not_queued_edits() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;
    // 41 is stored in 9 but queued into 10, 43 the other way round.
    engine
        .apply_local_edit(&EmailId::from("41"), EmailPatch::category("10"))
        .await
        .unwrap();
    engine
        .apply_local_edit(&EmailId::from("43"), EmailPatch::category("9"))
        .await
        .unwrap();

    engine
        .initiate_batch(&CategoryId::from("9"), BatchAction::Delete)
        .unwrap();
    engine.confirm_batch().await.unwrap();

    assert_eq!(engine.animating_out(), ids(&["40", "41", "42"]));
    assert_eq!(engine.phase(&EmailId::from("43")), Some(PhaseKind::Stable));
    engine.run_due_timers().await;

    let listed: Vec<EmailId> = engine.items().into_iter().map(|v| v.item.id).collect();
    assert_eq!(listed, ids(&["43", "44"]));
    assert_eq!(
        engine.pending_edit(&EmailId::from("43")),
        Some(&EmailPatch::category("9"))
    );

    // The server agrees with what is shown.
    engine.refresh().await.unwrap();
    let listed: Vec<EmailId> = engine.items().into_iter().map(|v| v.item.id).collect();
    assert_eq!(listed, ids(&["43", "44"]));
    assert_eq!(engine.pending_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn refused_batch_stays_pending_with_notice() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;
    let reclassify = engine
        .begin_reclassify(&EmailId::from("40"), &CategoryId::from("1"))
        .unwrap();

    engine
        .initiate_batch(&CategoryId::from("9"), BatchAction::Delete)
        .unwrap();
    let refused = engine.confirm_batch().await;

    assert_eq!(
        refused,
        Err(TriageError::Transition(TransitionError::Item(
            StoreError::Busy(EmailId::from("40"))
        )))
    );
    assert_eq!(engine.pending_batch().map(|r| r.label.as_str()), Some("Newsletters"));
    let notices: Vec<NoticeLevel> = engine.page().notices().map(|n| n.level).collect();
    assert_eq!(notices, vec![NoticeLevel::Error]);
    assert!(api.calls().iter().all(|c| !c.starts_with("batch")));

    let outcome = reclassify.call.dispatch(&api).await;
    engine.complete(reclassify.op, outcome).unwrap();
    engine.confirm_batch().await.unwrap();

    assert_eq!(engine.animating_out(), ids(&["40", "41", "42"]));
    assert!(engine.pending_batch().is_none());
}

#[tokio::test]
async fn batch_eligibility_follows_settings() {
    let api = FakeApi::new(other_view());
    let mut settings = Settings::default();
    settings.batch.delete_categories = Some(vec![11]);
    let mut engine = engine_with(&api, settings).await;

    assert!(matches!(
        engine.initiate_batch(&CategoryId::from("9"), BatchAction::Delete),
        Err(TriageError::Gate(GateError::NotEligible { .. }))
    ));
    assert!(engine
        .initiate_batch(&CategoryId::from("11"), BatchAction::Delete)
        .is_ok());
}

// ============================================================================
// Bulk confirm
// ============================================================================

#[tokio::test(start_paused = true)]
async fn confirm_all_retires_view_and_summary_self_clears() {
    let api = FakeApi::new(other_view());
    api.backend.lock().unwrap().confirm_summary = ConfirmSummary {
        confirmed: 5,
        moved: 3,
    };
    let mut engine = engine(&api).await;
    let events = record_events(&engine);
    engine
        .apply_local_edit(&EmailId::from("40"), EmailPatch::category("11"))
        .await
        .unwrap();

    engine.confirm_all().await.unwrap();

    assert_eq!(
        api.backend.lock().unwrap().confirm_corrections,
        vec![Correction {
            email_id: EmailId::from("40"),
            category_id: CategoryId::from("11"),
        }]
    );
    assert_eq!(engine.animating_out().len(), 5);
    assert_eq!(engine.summary().unwrap().to_string(), "5 confirmed, 3 moved");

    // All five leave together after one shared window.
    let fired = engine.run_due_timers().await;
    assert!(matches!(fired.as_slice(), [Fired::Retired { ids, .. }] if ids.len() == 5));
    assert!(engine.items().is_empty());
    assert!(engine.summary().is_some());

    let start = Instant::now();
    let fired = engine.run_due_timers().await;
    assert_eq!(fired, vec![Fired::SummaryCleared]);
    assert_eq!(start.elapsed(), Duration::from_millis(4700));
    assert!(engine.summary().is_none());

    let events = events.lock().unwrap();
    assert!(events.contains(&TriageEvent::SummaryShown(ConfirmSummary {
        confirmed: 5,
        moved: 3
    })));
    assert!(events.contains(&TriageEvent::SummaryCleared));
}

#[tokio::test(start_paused = true)]
async fn dismissed_summary_does_not_fire_later() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;
    let events = record_events(&engine);

    engine.confirm_all().await.unwrap();
    engine.run_due_timers().await;
    assert!(engine.dismiss_summary());
    assert!(!engine.dismiss_summary());

    assert!(engine.next_deadline().is_none());
    tokio::time::advance(Duration::from_secs(10)).await;
    assert!(engine.fire_due(Instant::now()).is_empty());

    let cleared = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| **e == TriageEvent::SummaryCleared)
        .count();
    assert_eq!(cleared, 1);
}

#[tokio::test]
async fn confirm_all_on_empty_view_is_rejected() {
    let api = FakeApi::new(Vec::new());
    let mut engine = engine(&api).await;

    assert_eq!(
        engine.confirm_all().await,
        Err(TriageError::Transition(TransitionError::EmptyBatch))
    );
}

// ============================================================================
// Approval, detail view, undo
// ============================================================================

#[tokio::test(start_paused = true)]
async fn retiring_item_drops_approval_and_detail() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;
    let id = EmailId::from("41");

    engine.toggle_approval(&id).unwrap();
    engine.open_detail(&id).unwrap();
    engine.reclassify(&id, &CategoryId::from("1")).await.unwrap();
    engine.run_due_timers().await;

    assert!(!engine.is_approved(&id));
    assert!(engine.page().open_detail.is_none());
}

#[tokio::test]
async fn undo_refreshes_list() {
    let api = FakeApi::new(other_view());
    let mut engine = engine(&api).await;

    api.set_items(vec![item("40", "9", 0.4)]);
    engine.undo("12").await.unwrap();

    assert_eq!(engine.items().len(), 1);
    let calls = api.calls();
    assert_eq!(&calls[calls.len() - 2..], &["undo(12)", "fetch_emails()"]);
    assert_eq!(
        engine.page().notices().next().map(|n| n.level),
        Some(NoticeLevel::Success)
    );
}
