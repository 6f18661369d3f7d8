//! Error types for the lunch fund ledger
//!
//! `LedgerError` covers everything a ledger operation can reject: invalid
//! transactions, unparseable history, undo/redo misuse and the I/O of the
//! surrounding application. `MergeError` is kept apart because a failed merge
//! is an ordinary outcome that the caller reports to the user, not a bug.

use thiserror::Error;

/// The main error type for ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A transaction violates its own rules (self-transfer, non-positive amount, ...)
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// A transaction refers to a person the ledger does not know
    #[error("Person not found: {0}")]
    PersonNotFound(String),

    /// An add refers to a person that already exists
    #[error("Person already exists: {0}")]
    DuplicatePerson(String),

    /// Only settled people can be deleted
    #[error("Cannot delete {name}: balance is {balance} cents, must be 0")]
    NonZeroBalance { name: String, balance: i64 },

    /// Optimistic email check failed
    #[error("Expecting \"{expected}\", but got {name}:\"{actual}\"")]
    EmailMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// A history line could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A history line carries a kind tag we do not know
    #[error("Unknown transaction kind: {0}")]
    UnknownTransactionKind(String),

    /// Undo with nothing to undo
    #[error("Nothing to undo")]
    EmptyHistory,

    /// Redo with nothing to redo
    #[error("Nothing to redo")]
    EmptyRedo,

    /// Export count outside `1..=history size`
    #[error("Cannot export {requested} transactions, history has {available}")]
    InvalidExportSize { requested: usize, available: usize },

    /// The unexported prefix does not fit the 16-bit header field
    #[error("Too many unexported transactions: {0} (maximum 65535)")]
    TooManyUnexported(usize),

    /// Compression or text encoding failure while building an export
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Create an invalid transaction error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidTransaction(message.into())
    }

    /// Create a "not found" error for people
    pub fn person_not_found(name: impl Into<String>) -> Self {
        Self::PersonNotFound(name.into())
    }

    /// Check if this error rejects a transaction on business rules
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransaction(_)
                | Self::PersonNotFound(_)
                | Self::DuplicatePerson(_)
                | Self::NonZeroBalance { .. }
                | Self::EmailMismatch { .. }
        )
    }

    /// Check if this error comes from reading serialized history
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::UnknownTransactionKind(_))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Reasons a merge was refused
///
/// Every variant is an expected outcome: stale data, nothing to do, or a
/// genuine conflict between the two histories.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Not base64, unknown magic, truncated header or broken gzip stream
    #[error("Invalid Data Format{}", format_detail(.0))]
    InvalidFormat(String),

    /// The sender assumed more shared history than we have
    #[error("Need to export more transactions to merge")]
    NeedMoreContext { unexported: usize, local: usize },

    /// The checksum of the reconstructed log does not match
    #[error("Conflict or Corrupt data. Try again with more transactions")]
    ConflictOrCorrupt { expected: u32, actual: u32 },

    /// The reconstructed remote log does not replay
    #[error("Invalid Remote Log: {0}")]
    InvalidRemoteLog(String),

    /// Our own history is not strictly increasing in date
    #[error("this date goes backwards")]
    DateOrderViolation,

    /// The remote history is not strictly increasing in date
    #[error("remote date goes backwards")]
    RemoteDateOrderViolation,

    /// Two different transactions share a timestamp
    #[error("date conflict")]
    DateConflict { date: i64 },

    /// The remote has nothing we do not already have
    #[error("Nothing new")]
    NothingNew,

    /// The union of both histories does not replay
    #[error("Invalid Merged Log: {0}")]
    InvalidMergedLog(String),
}

fn format_detail(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" {}", detail)
    }
}
