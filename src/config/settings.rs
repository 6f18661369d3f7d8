//! User settings for the lunch fund
//!
//! Stored as JSON next to the history document. Every field has a default,
//! so settings files written by older versions keep loading.

use serde::{Deserialize, Serialize};

use super::paths::LunchPaths;
use crate::error::LedgerError;
use crate::ledger::SortMode;
use crate::storage::file_io::{read_json, write_json_atomic};

/// User settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Order used by `person list` when none is given
    #[serde(default)]
    pub default_sort: SortMode,

    /// Allow gzip framing of exports when it makes them smaller
    #[serde(default = "default_true")]
    pub compress_exports: bool,

    /// Journal every ledger change to the audit log
    #[serde(default = "default_true")]
    pub audit_enabled: bool,

    /// Currency symbol for the people table
    #[serde(default = "default_currency")]
    pub currency_symbol: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_sort: SortMode::default(),
            compress_exports: true,
            audit_enabled: true,
            currency_symbol: default_currency(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    ///
    /// Defaults are not written back; the caller decides when to persist.
    pub fn load_or_create(paths: &LunchPaths) -> Result<Self, LedgerError> {
        read_json(paths.settings_file()).map_err(|e| match e {
            LedgerError::Storage(msg) => {
                LedgerError::Config(format!("Failed to load settings: {}", msg))
            }
            other => other,
        })
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LunchPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }
}
