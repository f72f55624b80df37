//! Configuration
//!
//! Layered configuration built with the `config` crate: defaults, the global file,
//! workspace files, then `VEIL_*` environment variables. Each table is owned by the
//! module that consumes it; this file only assembles and validates them.

use crate::engine::DecisionThresholds;
use crate::logging::LoggingConfig;
use crate::policy::{FoldConfig, PolicyConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::provider::ProviderConfig;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

pub const DEFAULT_STATE_PATH: &str = ".veil/state";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VeilConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub thresholds: DecisionThresholds,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub fold: FoldConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[scan]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Classification calls allowed in flight at once
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Quiet window before a burst of snapshot changes triggers a rescan (milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_max_in_flight() -> usize {
    8
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[storage]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory, relative to the workspace unless absolute
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_state_path() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String),
    Thresholds(String),
    Fold(String),
    Scan(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "provider: {}", msg),
            ValidationError::Thresholds(msg) => write!(f, "thresholds: {}", msg),
            ValidationError::Fold(msg) => write!(f, "fold: {}", msg),
            ValidationError::Scan(msg) => write!(f, "scan: {}", msg),
            ValidationError::Storage(msg) => write!(f, "storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl VeilConfig {
    /// Validate every table, collecting all errors.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.thresholds.validate() {
            errors.push(ValidationError::Thresholds(e));
        }
        if let Err(e) = self.fold.validate() {
            errors.push(ValidationError::Fold(e));
        }
        if self.scan.max_in_flight == 0 {
            errors.push(ValidationError::Scan(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        if self.storage.state_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "state_path cannot be empty".to_string(),
            ));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// State database location for a workspace.
    pub fn state_path(&self, workspace_root: &Path) -> PathBuf {
        if self.storage.state_path.is_absolute() {
            self.storage.state_path.clone()
        } else {
            workspace_root.join(&self.storage.state_path)
        }
    }

    /// Copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.provider.has_api_key() {
            config.provider.api_key = Some("********".to_string());
        }
        config
    }
}
