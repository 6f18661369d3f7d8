//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the
//! clap argument parsing with the ledger engine.

pub mod history;
pub mod person;
pub mod sync;
pub mod transaction;

pub use history::{handle_audit_command, handle_history_command};
pub use person::{handle_person_command, PersonCommands};
pub use sync::{handle_export_command, handle_merge_command};
pub use transaction::{
    handle_lunch_command, handle_redo_command, handle_transfer_command, handle_undo_command,
};

use tracing::warn;

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::{LunchPaths, Settings};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::models::Money;
use crate::storage::HistoryStore;

/// A loaded ledger together with where it is stored
///
/// Commands change `ledger` and then call [`Session::finish`], which writes
/// the history and redo stack back only if something changed.
pub struct Session {
    pub settings: Settings,
    pub ledger: Ledger,
    store: HistoryStore,
    audit: Option<AuditLogger>,
}

impl Session {
    /// Load the ledger stored under `paths`
    pub fn open(paths: &LunchPaths, settings: Settings) -> LedgerResult<Self> {
        let store = HistoryStore::new(paths.history_file()).with_redo_file(paths.redo_file());
        let ledger = store.load()?;
        let audit = settings
            .audit_enabled
            .then(|| AuditLogger::new(paths.audit_log()));

        Ok(Self {
            settings,
            ledger,
            store,
            audit,
        })
    }

    /// Journal an entry if auditing is enabled
    ///
    /// A failing journal never fails the command.
    pub fn record(&self, entry: AuditEntry) {
        if let Some(logger) = &self.audit {
            if let Err(e) = logger.log(&entry) {
                warn!(error = %e, "failed to write audit entry");
            }
        }
    }

    /// Journal the newest history entry as applied
    pub fn record_last_applied(&self) {
        if let Some(txn) = self.ledger.history().last() {
            self.record(AuditEntry::applied(txn));
        }
    }

    /// Save the ledger if it changed
    pub fn finish(mut self) -> LedgerResult<()> {
        self.store.save_if_modified(&mut self.ledger)?;
        Ok(())
    }
}

/// Parse a user-entered amount like `12.50` or `$12`
pub fn parse_amount(amount: &str) -> LedgerResult<Money> {
    Money::parse(amount).map_err(|e| {
        LedgerError::invalid(format!(
            "Invalid amount format: '{}'. Use format like '12.50' or '12'. Error: {}",
            amount, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Operation;
    use tempfile::TempDir;

    #[test]
    fn test_session_saves_only_changes() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LunchPaths::with_base_dir(temp_dir.path().to_path_buf());

        let session = Session::open(&paths, Settings::default()).unwrap();
        session.finish().unwrap();
        assert!(!paths.history_file().exists());

        let mut session = Session::open(&paths, Settings::default()).unwrap();
        session.ledger.perform_add_person("Ann", "ann@x").unwrap();
        session.record_last_applied();
        session.finish().unwrap();

        let reopened = Session::open(&paths, Settings::default()).unwrap();
        assert!(reopened.ledger.get_person("Ann").is_some());

        let entries = AuditLogger::new(paths.audit_log()).read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Apply);
    }

    #[test]
    fn test_audit_can_be_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LunchPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings {
            audit_enabled: false,
            ..Settings::default()
        };

        let mut session = Session::open(&paths, settings).unwrap();
        session.ledger.perform_add_person("Ann", "").unwrap();
        session.record_last_applied();
        session.finish().unwrap();

        assert!(!paths.audit_log().exists());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.50").unwrap(), Money::from_cents(1250));
        assert!(parse_amount("twelve").unwrap_err().is_validation());
    }
}
