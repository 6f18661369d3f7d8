//! Audit journal for the lunch fund
//!
//! Every change made through the command line is appended to an audit log,
//! one JSON object per line, next to the history document. Undone work
//! disappears from the history but stays in the journal.
//!
//! # Example
//!
//! ```rust,ignore
//! use lunch_fund::audit::{AuditEntry, AuditLogger};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! ledger.perform_add_person("Ann", "ann@example.com")?;
//! if let Some(txn) = ledger.history().last() {
//!     logger.log(&AuditEntry::applied(txn))?;
//! }
//! ```

mod entry;
mod logger;

pub use entry::{AuditEntry, Operation};
pub use logger::AuditLogger;
