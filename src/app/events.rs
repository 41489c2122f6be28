//! Event bus for rendering collaborators.
//!
//! Provides a publish-subscribe channel for engine events so a renderer can
//! react to phase changes without polling the engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::domain::{BatchActionRequest, ConfirmSummary, EmailId, Folder, OperationId};

/// Events published by the triage engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TriageEvent {
    // Page events
    /// The item list was (re)loaded.
    ViewLoaded {
        items: usize,
        categories: usize,
        folders: usize,
    },
    /// No session; the host should prompt the user to connect an account.
    AuthRequired,

    // Transition events
    /// Items started their exit animation.
    ItemsAnimating {
        op: OperationId,
        ids: Vec<EmailId>,
    },
    /// Items left the list.
    ItemsRetired {
        op: OperationId,
        ids: Vec<EmailId>,
    },
    /// A correction was accepted by the backend.
    EditCommitted(EmailId),
    /// A side-effecting request failed and was rolled back.
    RequestFailed {
        op: Option<OperationId>,
        message: String,
    },
    /// The confirmation summary panel appeared.
    SummaryShown(ConfirmSummary),
    /// The confirmation summary panel went away.
    SummaryCleared,

    // Interaction events
    /// A batch action is awaiting confirmation.
    BatchRequested(BatchActionRequest),
    /// The pending batch action was cancelled.
    BatchCancelled,
    /// An item's approval flipped.
    ApprovalChanged { email_id: EmailId, approved: bool },
    /// The detail view opened.
    DetailOpened(EmailId),
    /// The detail view closed.
    DetailClosed,
    /// A folder was created.
    FolderCreated(Folder),

    // Notices
    /// Show a notice.
    NoticeRaised(Notice),
    /// Remove a notice.
    NoticeDismissed(NoticeId),
}

/// Identifier of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoticeId(pub u64);

impl fmt::Display for NoticeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notice-{}", self.0)
    }
}

/// A banner or toast for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// Unique ID for this notice.
    pub id: NoticeId,
    /// Notice text.
    pub message: String,
    /// Severity.
    pub level: NoticeLevel,
    /// Auto-dismiss after this long. `None` stays until dismissed.
    pub auto_dismiss: Option<Duration>,
}

/// Notice severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeLevel {
    #[default]
    Info,
    Success,
    Error,
}

impl Notice {
    pub fn info(id: NoticeId, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
            level: NoticeLevel::Info,
            auto_dismiss: None,
        }
    }

    pub fn success(id: NoticeId, message: impl Into<String>, display: Duration) -> Self {
        Self {
            id,
            message: message.into(),
            level: NoticeLevel::Success,
            auto_dismiss: Some(display),
        }
    }

    pub fn error(id: NoticeId, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
            level: NoticeLevel::Error,
            auto_dismiss: None,
        }
    }
}

/// Subscriber ID for unsubscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// Event handler function type.
pub type EventHandler = Box<dyn Fn(&TriageEvent) + Send + Sync>;

/// Event bus for publish-subscribe communication.
///
/// Cloning the bus shares the subscriber table, so a renderer can subscribe
/// on one handle while the engine publishes on another.
pub struct EventBus {
    handlers: Arc<Mutex<HashMap<u64, EventHandler>>>,
    next_id: Arc<Mutex<u64>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(0)),
        }
    }

    /// Subscribe to all events.
    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&TriageEvent) + Send + Sync + 'static,
    {
        let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
        let id = *next_id;
        *next_id += 1;

        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Box::new(handler));

        SubscriberId(id)
    }

    /// Unsubscribe from events.
    pub fn unsubscribe(&self, subscriber_id: SubscriberId) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&subscriber_id.0);
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: TriageEvent) {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        for handler in handlers.values() {
            handler(&event);
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}
