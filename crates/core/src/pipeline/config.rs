use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decision::domain::decision_machine::DecisionConfig;
use crate::events::domain::event_emitter::CooldownConfig;
use crate::identity::domain::identity_resolver::IdentityConfig;
use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_PROGRESS_EVERY_FRAMES, DEFAULT_RECONNECT_BACKOFF_SECS,
};
use crate::tracking::domain::associator::TrackerConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    #[serde(with = "crate::shared::duration_secs")]
    pub reconnect_backoff: Duration,
    pub progress_every_frames: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff: Duration::from_secs(DEFAULT_RECONNECT_BACKOFF_SECS),
            progress_every_frames: DEFAULT_PROGRESS_EVERY_FRAMES,
        }
    }
}

/// Every tunable, grouped by the stage that reads it. Missing sections and
/// fields fall back to defaults, so a config file only lists overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    pub tracker: TrackerConfig,
    pub identity: IdentityConfig,
    pub decision: DecisionConfig,
    pub cooldowns: CooldownConfig,
    pub runtime: RuntimeConfig,
}

impl GatekeeperConfig {
    /// `<config dir>/gatekeeper/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit` if given, otherwise the default path if that file
    /// exists, otherwise the built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_ranges = [
            ("tracker.iou_threshold", self.tracker.iou_threshold),
            ("tracker.min_person_confidence", self.tracker.min_person_confidence),
            ("tracker.min_phone_confidence", self.tracker.min_phone_confidence),
            ("identity.match_threshold", self.identity.match_threshold),
            ("identity.duplicate_threshold", self.identity.duplicate_threshold),
        ];
        for (name, value) in unit_ranges {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        if self.identity.duplicate_threshold <= self.identity.match_threshold {
            return Err(ConfigError::Invalid(format!(
                "identity.duplicate_threshold ({}) must be greater than identity.match_threshold ({})",
                self.identity.duplicate_threshold, self.identity.match_threshold
            )));
        }
        if self.decision.grace_period_without_face < self.decision.grace_period_with_face {
            return Err(ConfigError::Invalid(
                "decision.grace_period_without_face must be at least decision.grace_period_with_face"
                    .into(),
            ));
        }
        if self.identity.face_sample_interval == 0 {
            return Err(ConfigError::Invalid("identity.face_sample_interval must be at least 1".into()));
        }
        if self.tracker.min_hits == 0 {
            return Err(ConfigError::Invalid("tracker.min_hits must be at least 1".into()));
        }
        Ok(())
    }
}
