//! Email item domain types.
//!
//! Represents one classified email as the backend reports it, and the partial
//! record used to hold local edits that have not been sent yet.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{CategoryId, EmailId};

/// A classified email as last fetched from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailItem {
    /// Unique identifier within the store.
    pub id: EmailId,
    /// Sender address.
    #[serde(default)]
    pub from_address: Option<String>,
    /// Sender display name.
    #[serde(default)]
    pub from_name: Option<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// When the message arrived.
    #[serde(default)]
    pub received_at: Option<NaiveDateTime>,
    /// Assigned category, if classified.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Classifier confidence. The scale is backend-defined; only ordering
    /// is meaningful.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Urgency score.
    #[serde(default)]
    pub urgency_score: Option<f64>,
    /// Lifecycle status, opaque to this crate.
    #[serde(default)]
    pub status: String,
    /// Routing folder.
    #[serde(default)]
    pub folder: Option<String>,
    /// Due date extracted from the message.
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    /// Whether the urgency floor was overridden for this item.
    #[serde(default)]
    pub floor_override: bool,
    /// Days since the item was last touched.
    #[serde(default)]
    pub stale_days: u32,
    /// Linked task, if one was created.
    #[serde(default)]
    pub todo_task_id: Option<String>,
    /// Assignee, if delegated.
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl EmailItem {
    /// Creates an unclassified item with the given ID.
    pub fn new(id: impl Into<EmailId>) -> Self {
        Self {
            id: id.into(),
            from_address: None,
            from_name: None,
            subject: None,
            received_at: None,
            category_id: None,
            confidence: None,
            urgency_score: None,
            status: "unprocessed".to_string(),
            folder: None,
            due_date: None,
            floor_override: false,
            stale_days: 0,
            todo_task_id: None,
            assigned_to: None,
        }
    }

    /// Sets the category.
    pub fn with_category(mut self, category_id: impl Into<CategoryId>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Sets the classifier confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Sets the subject line.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// Fields of an [`EmailItem`] changed locally but not yet committed.
///
/// `None` means "unchanged". Nullable fields use a nested `Option` so an edit
/// can explicitly clear them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailPatch {
    /// New category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<CategoryId>>,
    /// New urgency score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency_score: Option<Option<f64>>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// New routing folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<Option<String>>,
    /// New due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDateTime>>,
    /// New floor override flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_override: Option<bool>,
    /// New assignee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<String>>,
}

impl EmailPatch {
    /// Creates a patch that only changes the category.
    pub fn category(category_id: impl Into<CategoryId>) -> Self {
        Self {
            category_id: Some(Some(category_id.into())),
            ..Default::default()
        }
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The category this patch moves the item into, if it sets one.
    pub fn target_category(&self) -> Option<&CategoryId> {
        self.category_id.as_ref().and_then(Option::as_ref)
    }

    /// A copy of the patch with the category change removed.
    pub fn without_category(&self) -> Self {
        Self {
            category_id: None,
            ..self.clone()
        }
    }

    /// Merges `other` into `self`; fields set in `other` win.
    pub fn merge(&mut self, other: EmailPatch) {
        if other.category_id.is_some() {
            self.category_id = other.category_id;
        }
        if other.urgency_score.is_some() {
            self.urgency_score = other.urgency_score;
        }
        if other.status.is_some() {
            self.status = other.status;
        }
        if other.folder.is_some() {
            self.folder = other.folder;
        }
        if other.due_date.is_some() {
            self.due_date = other.due_date;
        }
        if other.floor_override.is_some() {
            self.floor_override = other.floor_override;
        }
        if other.assigned_to.is_some() {
            self.assigned_to = other.assigned_to;
        }
    }

    /// Returns a copy of `item` with this patch overlaid.
    pub fn apply_to(&self, item: &EmailItem) -> EmailItem {
        let mut merged = item.clone();
        if let Some(category_id) = &self.category_id {
            merged.category_id = category_id.clone();
        }
        if let Some(urgency_score) = self.urgency_score {
            merged.urgency_score = urgency_score;
        }
        if let Some(status) = &self.status {
            merged.status = status.clone();
        }
        if let Some(folder) = &self.folder {
            merged.folder = folder.clone();
        }
        if let Some(due_date) = self.due_date {
            merged.due_date = due_date;
        }
        if let Some(floor_override) = self.floor_override {
            merged.floor_override = floor_override;
        }
        if let Some(assigned_to) = &self.assigned_to {
            merged.assigned_to = assigned_to.clone();
        }
        merged
    }
}
