//! The ledger engine
//!
//! A `Ledger` owns the people table and two stacks of transactions: the
//! applied history, in apply order, and the redo stack of undone
//! transactions. It is only ever changed through [`Ledger::apply`],
//! [`Ledger::undo`] and [`Ledger::redo`]; merging produces a new ledger
//! instead (see [`crate::sync`]).
//!
//! # Example
//!
//! ```
//! use lunch_fund::ledger::Ledger;
//! use lunch_fund::models::Money;
//!
//! let mut ledger = Ledger::new();
//! ledger.perform_add_person("A", "a@x.com").unwrap();
//! ledger.perform_add_person("B", "b@x.com").unwrap();
//! ledger
//!     .perform_lunch("A", Money::from_cents(1000), "", vec!["A".into(), "B".into()])
//!     .unwrap();
//!
//! assert_eq!(ledger.get_person("A").unwrap().balance.cents(), 500);
//! assert_eq!(ledger.get_person("B").unwrap().balance.cents(), -500);
//! ```

mod views;

pub use views::SortMode;

use chrono::Utc;
use tracing::debug;

use crate::codec;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, People, Person, Transaction};

/// In-memory balance table with undo/redo history
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    people: People,
    history: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    modified: bool,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger by replaying a history document
    ///
    /// Fails on the first line that does not parse or does not apply. The
    /// returned ledger is not marked modified.
    pub fn load(text: &str) -> LedgerResult<Self> {
        let mut ledger = Self::new();
        for (number, line) in codec::non_blank_lines(text) {
            let txn = codec::decode_line(number, line)?;
            ledger.apply(txn)?;
        }
        ledger.modified = false;
        Ok(ledger)
    }

    /// Render the applied history as a document
    pub fn save(&self) -> String {
        codec::encode_history(&self.history)
    }

    /// Apply a transaction and record it
    ///
    /// Clears the redo stack on success. On failure nothing changes, the
    /// redo stack included.
    pub fn apply(&mut self, txn: Transaction) -> LedgerResult<()> {
        txn.apply(&mut self.people)?;
        debug!(date = txn.date(), kind = txn.kind().tag(), "applied transaction");
        self.redo_stack.clear();
        self.history.push(txn);
        self.modified = true;
        Ok(())
    }

    /// Reverse the most recent transaction
    pub fn undo(&mut self) -> LedgerResult<&Transaction> {
        let txn = self.history.pop().ok_or(LedgerError::EmptyHistory)?;
        if let Err(e) = txn.undo(&mut self.people) {
            self.history.push(txn);
            return Err(e);
        }
        debug!(date = txn.date(), kind = txn.kind().tag(), "undid transaction");
        self.modified = true;
        Ok(push_top(&mut self.redo_stack, txn))
    }

    /// Re-apply the most recently undone transaction
    pub fn redo(&mut self) -> LedgerResult<&Transaction> {
        let txn = self.redo_stack.pop().ok_or(LedgerError::EmptyRedo)?;
        if let Err(e) = txn.apply(&mut self.people) {
            self.redo_stack.push(txn);
            return Err(e);
        }
        debug!(date = txn.date(), kind = txn.kind().tag(), "redid transaction");
        self.modified = true;
        Ok(push_top(&mut self.history, txn))
    }

    /// Add a new person
    pub fn perform_add_person(&mut self, name: &str, email: &str) -> LedgerResult<()> {
        let txn = Transaction::add(self.next_timestamp(), name, email)?;
        self.apply(txn)
    }

    /// Remove a settled person, recording their current email
    pub fn perform_delete_person(&mut self, name: &str) -> LedgerResult<()> {
        let email = self
            .get_person(name)
            .ok_or_else(|| LedgerError::person_not_found(name))?
            .email
            .clone();
        let txn = Transaction::delete(self.next_timestamp(), name, email)?;
        self.apply(txn)
    }

    /// Record that `from` gave `amount` to `to`
    pub fn perform_transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Money,
        remarks: &str,
    ) -> LedgerResult<()> {
        let txn = Transaction::transfer(self.next_timestamp(), from, to, amount, remarks)?;
        self.apply(txn)
    }

    /// Record that `payer` paid `amount` for `eaters`
    pub fn perform_lunch(
        &mut self,
        payer: &str,
        amount: Money,
        remarks: &str,
        eaters: Vec<String>,
    ) -> LedgerResult<()> {
        let txn = Transaction::lunch(self.next_timestamp(), payer, amount, remarks, eaters)?;
        self.apply(txn)
    }

    /// Change a person's email, guarded by the email they have now
    pub fn perform_change_email(&mut self, name: &str, new_email: &str) -> LedgerResult<()> {
        let old_email = self
            .get_person(name)
            .ok_or_else(|| LedgerError::person_not_found(name))?
            .email
            .clone();
        let txn = Transaction::change_email(self.next_timestamp(), name, old_email, new_email)?;
        self.apply(txn)
    }

    /// Current time in milliseconds, bumped past the newest history entry
    fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        match self.history.last() {
            Some(last) if last.date() >= now => last.date() + 1,
            _ => now,
        }
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn has_redo_history(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn history_size(&self) -> usize {
        self.history.len()
    }

    /// Applied transactions, oldest first
    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    /// Undone transactions, the next one to redo last
    pub fn redo_history(&self) -> &[Transaction] {
        &self.redo_stack
    }

    /// Render the redo stack as a document, bottom of the stack first
    pub fn save_redo(&self) -> String {
        codec::encode_history(&self.redo_stack)
    }

    /// Replace the redo stack with a saved one
    ///
    /// Entries are only parsed here; each is applied when it is redone. Does
    /// not mark the ledger modified.
    pub fn restore_redo(&mut self, text: &str) -> LedgerResult<()> {
        self.redo_stack = codec::decode_history(text)?;
        Ok(())
    }

    /// Look up a person by name
    pub fn get_person(&self, name: &str) -> Option<&Person> {
        self.people.get(name)
    }

    /// All names in ascending order
    pub fn list_people_names(&self) -> Vec<&str> {
        self.people.keys().map(String::as_str).collect()
    }

    /// Sum of all balances; zero for any ledger built from valid transactions
    pub fn total_balance(&self) -> Money {
        self.people.values().map(|p| p.balance).sum()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn clear_modified(&mut self) {
        self.modified = false;
    }
}

fn push_top(stack: &mut Vec<Transaction>, txn: Transaction) -> &Transaction {
    stack.push(txn);
    &stack[stack.len() - 1]
}
