//! Domain layer types for the triage engine.
//!
//! This module contains the core domain types used throughout the crate:
//! email items and their pending edits, categories and buckets, folders, and
//! the bulk-action records exchanged with the backend.

mod action;
mod category;
mod email;
mod types;

pub use action::{BatchAction, BatchActionRequest, ConfirmSummary, Correction, RecentAction};
pub use category::{Bucket, Category, CategoryCatalog, Folder};
pub use email::{EmailItem, EmailPatch};
pub use types::{CategoryId, EmailId, FolderId, OperationId};
