//! Configuration and settings management.
//!
//! This module provides engine settings types and persistence.
//! Settings are stored in the user's config directory as JSON.

mod settings;

pub use settings::{
    ApiSettings, BatchSettings, ConfigError, ReclassifyDispatch, Settings, TimingSettings,
    ViewSettings,
};
