//! External service providers.
//!
//! This module contains provider traits and implementations for external services:
//!
//! - [`backend`] - The triage backend (auth, item list, dispatch calls)

pub mod backend;
