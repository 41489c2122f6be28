//! Bulk action domain types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CategoryId, EmailId};

/// An irreversible operation applied to every item of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchAction {
    /// Move every item to the category's folder.
    Move,
    /// Delete every item.
    Delete,
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A bulk action awaiting explicit confirmation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchActionRequest {
    /// Target category.
    pub category_id: CategoryId,
    /// Human-readable category label for the confirmation prompt.
    pub label: String,
    /// What to do with the category's items.
    pub action: BatchAction,
}

impl BatchActionRequest {
    /// Prompt text for the confirmation dialog.
    pub fn prompt(&self) -> String {
        match self.action {
            BatchAction::Move => format!("Move all \"{}\" emails to their folder?", self.label),
            BatchAction::Delete => format!("Delete all \"{}\" emails?", self.label),
        }
    }
}

/// A category correction sent along with a bulk confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// Corrected item.
    pub email_id: EmailId,
    /// Category chosen by the user.
    pub category_id: CategoryId,
}

/// Result of confirming every item in a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmSummary {
    /// Items confirmed.
    pub confirmed: u32,
    /// Items moved to a folder as part of confirmation.
    pub moved: u32,
}

impl fmt::Display for ConfirmSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} confirmed, {} moved", self.confirmed, self.moved)
    }
}

/// A recent backend action that can be undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentAction {
    /// Backend action ID.
    #[serde(deserialize_with = "super::types::string_or_number")]
    pub id: String,
    /// Kind of action (approve, execute, reclassify, batch_move, ...).
    pub action_type: String,
    /// Human-readable description.
    pub description: String,
    /// When the action happened.
    pub created_at: NaiveDateTime,
}
