//! Core data models for the lunch fund
//!
//! People, money amounts and the transactions that move money between
//! people.

pub mod money;
pub mod person;
pub mod transaction;

pub use money::{Money, MoneyParseError};
pub use person::{People, Person};
pub use transaction::{Transaction, TransactionKind, NO_REMARKS};
