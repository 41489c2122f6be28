//! triage - Client-side reconciliation engine for email triage
//!
//! This crate keeps a locally displayed list of classified email items
//! consistent with the triage backend, the user's unsent edits, and the
//! timed UI states (in-flight calls, exit animations, confirmation summary)
//! that sit between them.

pub mod app;
pub mod config;
pub mod domain;
pub mod providers;
pub mod services;

pub use app::{TriageEngine, TriageError, TriageResult};
