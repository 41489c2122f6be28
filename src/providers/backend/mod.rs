//! Triage backend provider.
//!
//! This module contains the [`TriageApi`] trait and its HTTP implementation:
//!
//! - [`HttpTriageApi`] - JSON over HTTP against the triage backend service
//!
//! # Architecture
//!
//! The backend owns authentication, classification, persistence and the
//! mail-provider side effects. The client-side engine consumes it through
//! [`TriageApi`] so tests can substitute an in-memory fake.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use triage::providers::backend::{EmailFilter, HttpTriageApi, TriageApi};
//!
//! async fn list_inbox() -> triage::providers::backend::ApiResult<()> {
//!     let api = HttpTriageApi::new("http://localhost:8000", Duration::from_secs(30))?;
//!     let page = api.fetch_emails(&EmailFilter::with_limit(50).folder("inbox")).await?;
//!     for item in page.items {
//!         println!("{}: {}", item.id, item.subject.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

mod http;
mod traits;

pub use http::HttpTriageApi;
#[cfg(test)]
pub use traits::MockTriageApi;
pub use traits::{
    ApiError, ApiResult, AuthStatus, DeleteResult, EmailFilter, EmailPage, Identity, MoveResult,
    TriageApi,
};
