//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Transaction;

/// Ledger operations that are journaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// A new transaction was applied
    Apply,
    /// The newest transaction was undone
    Undo,
    /// An undone transaction was reapplied
    Redo,
    /// A remote export was merged in
    Merge,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Apply => write!(f, "APPLY"),
            Operation::Undo => write!(f, "UNDO"),
            Operation::Redo => write!(f, "REDO"),
            Operation::Merge => write!(f, "MERGE"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    /// Human-readable description of what happened
    pub summary: String,

    /// History line of the transaction involved, if there was exactly one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
}

impl AuditEntry {
    fn for_transaction(operation: Operation, txn: &Transaction) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            summary: txn.describe(),
            record: Some(txn.to_line()),
        }
    }

    pub fn applied(txn: &Transaction) -> Self {
        Self::for_transaction(Operation::Apply, txn)
    }

    pub fn undone(txn: &Transaction) -> Self {
        Self::for_transaction(Operation::Undo, txn)
    }

    pub fn redone(txn: &Transaction) -> Self {
        Self::for_transaction(Operation::Redo, txn)
    }

    /// Entry for a merge, summarized by the merge message
    pub fn merged(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Merge,
            summary: message.into(),
            record: None,
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        format!(
            "[{}] {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.summary.trim_end().replace('\n', "\n  ")
        )
    }
}
