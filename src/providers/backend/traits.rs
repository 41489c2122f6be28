//! Triage backend trait definition.
//!
//! This module defines the [`TriageApi`] trait which abstracts over the
//! service that owns authentication, the classified email list, categories,
//! folders, and the side-effecting dispatch calls. The reconciliation engine
//! only ever talks to the backend through this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Bucket, Category, CategoryId, ConfirmSummary, Correction, EmailId, EmailItem, Folder,
    RecentAction,
};

/// Result type alias for backend operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors that can occur during backend operations.
///
/// The engine only distinguishes "no session" from "the call failed"; every
/// other detail is folded into a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No authenticated session; the user must connect an account.
    #[error("authentication required")]
    AuthRequired,

    /// The request failed.
    #[error("{0}")]
    Request(String),
}

impl ApiError {
    /// Builds a request error from an HTTP status and response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return Self::AuthRequired;
        }
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or_else(|| body.trim().to_string());

        if detail.is_empty() {
            Self::Request(format!("request failed with status {}", status))
        } else {
            Self::Request(format!("request failed with status {}: {}", status, detail))
        }
    }
}

/// Signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Account email address.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Outcome of an authentication check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthStatus {
    /// Whether a session exists.
    pub authenticated: bool,
    /// Who is signed in, if known.
    pub identity: Option<Identity>,
}

/// Filter for listing email items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailFilter {
    /// Restrict to one folder (inbox, archive, deleted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Restrict to one status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Maximum items to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Items to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl EmailFilter {
    /// Creates a filter with the specified limit.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// Restricts to a folder.
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Restricts to a status.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// One page of email items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailPage {
    /// Items in backend order.
    #[serde(rename = "emails")]
    pub items: Vec<EmailItem>,
    /// Total matching items on the backend.
    pub total: u32,
}

/// Result of moving a category's items to its folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// Items moved.
    pub moved: u32,
}

/// Result of deleting a category's items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    /// Items deleted.
    pub deleted: u32,
}

/// Trait for triage backend implementations.
///
/// Every call fails with [`ApiError`]; there are no automatic retries at this
/// layer or above.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TriageApi: Send + Sync {
    /// Checks whether a session exists.
    async fn check_auth(&self) -> ApiResult<AuthStatus>;

    /// Lists email items matching `filter`.
    async fn fetch_emails(&self, filter: &EmailFilter) -> ApiResult<EmailPage>;

    /// Lists categories, optionally restricted to one bucket.
    async fn fetch_categories(&self, bucket: Option<Bucket>) -> ApiResult<Vec<Category>>;

    /// Lists routing folders.
    async fn fetch_folders(&self) -> ApiResult<Vec<Folder>>;

    /// Creates a folder.
    async fn create_folder(&self, name: &str) -> ApiResult<Folder>;

    /// Moves one item to another category and returns the updated record.
    async fn reclassify_email(&self, id: &EmailId, category_id: &CategoryId)
        -> ApiResult<EmailItem>;

    /// Confirms every item in a bucket's view, applying `corrections` first.
    async fn confirm_all_in_view(
        &self,
        bucket: &Bucket,
        corrections: &[Correction],
    ) -> ApiResult<ConfirmSummary>;

    /// Moves every item of a category to its folder.
    async fn batch_move_to_folder(&self, category_id: &CategoryId) -> ApiResult<MoveResult>;

    /// Deletes every item of a category.
    async fn batch_delete_category(&self, category_id: &CategoryId) -> ApiResult<DeleteResult>;

    /// Lists the most recent undoable actions (at most five).
    async fn recent_actions(&self, limit: u32) -> ApiResult<Vec<RecentAction>>;

    /// Reverts one recent action.
    async fn undo_action(&self, action_id: &str) -> ApiResult<()>;
}
