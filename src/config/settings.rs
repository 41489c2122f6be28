//! Engine settings and configuration types.
//!
//! Settings are persisted to `~/.config/triage/settings.json` (or XDG
//! equivalent) and loaded at startup. Missing sections fall back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bucket;

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the settings file failed.
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON.
    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),

    /// No home directory could be determined.
    #[error("no configuration directory available")]
    NoConfigDir,
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend connection.
    pub api: ApiSettings,
    /// Which list is shown and how edits are routed.
    pub view: ViewSettings,
    /// Animation and display durations.
    pub timing: TimingSettings,
    /// Batch action eligibility.
    pub batch: BatchSettings,
}

impl Settings {
    /// Returns the default settings file location.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", "triage")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Loads settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Loads settings from the default location, falling back to defaults
    /// when the file does not exist.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        match Self::load(&path) {
            Ok(settings) => Ok(settings),
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Writes settings to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the triage backend.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum items fetched per load.
    pub fetch_limit: u32,
    /// Restrict the list to one folder.
    pub folder: Option<String>,
    /// Restrict the list to one status.
    pub status: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            fetch_limit: 100,
            folder: None,
            status: None,
        }
    }
}

impl ApiSettings {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which edits bypass the pending ledger and dispatch immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclassifyDispatch {
    /// Only edits that move an item into the Work bucket from another bucket.
    #[default]
    IntoWorkOnly,
    /// Every edit that moves an item out of the viewed bucket.
    AnyDirection,
}

/// View settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Bucket whose items are listed.
    pub bucket: Bucket,
    /// Cross-bucket dispatch rule.
    pub reclassify_dispatch: ReclassifyDispatch,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            bucket: Bucket::other(),
            reclassify_dispatch: ReclassifyDispatch::default(),
        }
    }
}

/// Durations for timed UI states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Exit animation window in milliseconds.
    pub exit_animation_ms: u64,
    /// How long the confirmation summary stays visible, in seconds.
    pub summary_display_secs: u64,
    /// How long success notices stay visible, in seconds.
    pub notice_display_secs: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            exit_animation_ms: 300,
            summary_display_secs: 5,
            notice_display_secs: 3,
        }
    }
}

impl TimingSettings {
    /// Exit animation window.
    pub fn exit_animation(&self) -> Duration {
        Duration::from_millis(self.exit_animation_ms)
    }

    /// Summary display window.
    pub fn summary_display(&self) -> Duration {
        Duration::from_secs(self.summary_display_secs)
    }

    /// Success notice display window.
    pub fn notice_display(&self) -> Duration {
        Duration::from_secs(self.notice_display_secs)
    }
}

/// Batch action eligibility by category number.
///
/// `None` means every category is eligible.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Category numbers that may be batch-moved.
    pub move_categories: Option<Vec<u32>>,
    /// Category numbers that may be batch-deleted.
    pub delete_categories: Option<Vec<u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.timing.exit_animation(), Duration::from_millis(300));
        assert_eq!(settings.timing.summary_display(), Duration::from_secs(5));
        assert_eq!(settings.view.bucket, Bucket::other());
        assert_eq!(
            settings.view.reclassify_dispatch,
            ReclassifyDispatch::IntoWorkOnly
        );
        assert!(settings.batch.move_categories.is_none());
    }

    #[test]
    fn dispatch_serialization() {
        let json = serde_json::to_string(&ReclassifyDispatch::AnyDirection).unwrap();
        assert_eq!(json, "\"any_direction\"");
    }

    #[test]
    fn partial_file_uses_defaults() {
        let json = r#"{"api": {"base_url": "http://triage.internal:9000"}}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.api.base_url, "http://triage.internal:9000");
        assert_eq!(settings.api.timeout_secs, 30);
        assert_eq!(settings.timing, TimingSettings::default());
    }

    #[test]
    fn settings_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.view.bucket = Bucket::work();
        settings.batch.delete_categories = Some(vec![11]);
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn load_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse(_))));
    }
}
