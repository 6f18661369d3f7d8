//! Lunch Fund - a shared lunch ledger with offline synchronization
//!
//! A group of people share a lunch fund. Lunches, transfers and membership
//! changes are recorded as transactions in an ordered history; balances are
//! derived by replaying it. Any transaction can be undone and redone, and two
//! copies of the fund can exchange short export blobs to merge their
//! histories without a server.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `models`: Money, people and the five transaction kinds
//! - `ledger`: The balance table with undo/redo and history views
//! - `codec`: The tab separated history document
//! - `sync`: CRC guarded export and merge
//! - `config`: Path management and user settings
//! - `storage`: Atomic file storage for the history document
//! - `audit`: Append-only journal of changes made from the command line
//! - `display`: Terminal formatting
//! - `cli`: Command handlers
//! - `error`: Custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use lunch_fund::config::{LunchPaths, Settings};
//! use lunch_fund::storage::HistoryStore;
//!
//! let paths = LunchPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let ledger = HistoryStore::new(paths.history_file()).load()?;
//! ```

pub mod audit;
pub mod cli;
pub mod codec;
pub mod config;
pub mod display;
pub mod error;
pub mod ledger;
pub mod models;
pub mod storage;
pub mod sync;

pub use error::{LedgerError, LedgerResult, MergeError};
pub use ledger::Ledger;
pub use sync::MergeResult;
