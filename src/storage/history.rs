//! History document persistence
//!
//! The ledger lives on disk as its saved history text. Loading replays it,
//! saving writes it back atomically. The redo stack can be kept in a second
//! document of the same format so that an undo can be redone later.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LedgerError;
use crate::ledger::Ledger;

use super::file_io::{read_text, write_text_atomic};

/// Loads and saves the history document
pub struct HistoryStore {
    path: PathBuf,
    redo_path: Option<PathBuf>,
}

impl HistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            redo_path: None,
        }
    }

    /// Also persist the redo stack at `redo_path`
    pub fn with_redo_file(mut self, redo_path: PathBuf) -> Self {
        self.redo_path = Some(redo_path);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay the stored history, or start an empty ledger if there is none
    pub fn load(&self) -> Result<Ledger, LedgerError> {
        let mut ledger = match read_text(&self.path)? {
            Some(text) => {
                let ledger = Ledger::load(&text)?;
                debug!(
                    path = %self.path.display(),
                    transactions = ledger.history_size(),
                    "loaded history"
                );
                ledger
            }
            None => Ledger::new(),
        };

        if let Some(redo_path) = &self.redo_path {
            if let Some(text) = read_text(redo_path)? {
                ledger.restore_redo(&text)?;
            }
        }
        Ok(ledger)
    }

    /// Write the ledger's history and clear its modified flag
    pub fn save(&self, ledger: &mut Ledger) -> Result<(), LedgerError> {
        write_text_atomic(&self.path, &ledger.save())?;
        if let Some(redo_path) = &self.redo_path {
            write_text_atomic(redo_path, &ledger.save_redo())?;
        }
        ledger.clear_modified();
        debug!(
            path = %self.path.display(),
            transactions = ledger.history_size(),
            "saved history"
        );
        Ok(())
    }

    /// Save only when the ledger has unsaved changes
    ///
    /// Returns whether anything was written.
    pub fn save_if_modified(&self, ledger: &mut Ledger) -> Result<bool, LedgerError> {
        if !ledger.is_modified() {
            return Ok(false);
        }
        self.save(ledger)?;
        Ok(true)
    }
}
