use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use storage::PROGRESS_KEY;

use crate::error::ConfigError;

/// Default autosave period.
pub const DEFAULT_AUTOSAVE_SECS: u64 = 30;

/// Runtime knobs for a tutor session.
///
/// Every field has a default, so a partial JSON object (or none at all) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TutorConfig {
    /// Key the progress document is stored under.
    pub storage_key: String,
    /// Seconds between autosaves; `0` turns the timer off.
    pub autosave_interval_secs: u64,
    /// Directory for the file-backed store.
    pub data_dir: Option<PathBuf>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            storage_key: PROGRESS_KEY.to_owned(),
            autosave_interval_secs: DEFAULT_AUTOSAVE_SECS,
            data_dir: None,
        }
    }
}

impl TutorConfig {
    #[must_use]
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    /// Defaults overridden by `TUTOR_STORAGE_KEY`, `TUTOR_AUTOSAVE_SECS` and
    /// `TUTOR_DATA_DIR`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`TutorConfig::from_env`] but reads variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(key) = lookup("TUTOR_STORAGE_KEY") {
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::EmptyStorageKey);
            }
            key.clone_into(&mut config.storage_key);
        }
        if let Some(raw) = lookup("TUTOR_AUTOSAVE_SECS") {
            config.autosave_interval_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidAutosaveInterval { raw: raw.clone() })?;
        }
        if let Some(dir) = lookup("TUTOR_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        config.validate()
    }

    /// # Errors
    ///
    /// Returns `ConfigError::EmptyStorageKey` if the storage key is blank.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(self)
    }
}
