//! Read-only views over a ledger: sorted people lists and history reports

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::Ledger;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, Person, TransactionKind};

/// How much each older lunch counts relative to the next newer one
const LUNCH_DECAY: f64 = 0.9;

/// Ordering for people lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Name, ascending
    #[default]
    Name,
    /// Balance, ascending (biggest debtors first)
    Balance,
    /// Who eats with the fund most often, recent lunches weighted higher
    #[value(alias = "frequency")]
    LunchFrequency,
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Balance => write!(f, "balance"),
            Self::LunchFrequency => write!(f, "lunch-frequency"),
        }
    }
}

impl Ledger {
    /// People in the requested order
    ///
    /// The returned list borrows the ledger and can be iterated any number of
    /// times.
    pub fn list_people(&self, mode: SortMode) -> Vec<&Person> {
        let mut list: Vec<&Person> = self.people.values().collect();
        match mode {
            SortMode::Name => {}
            SortMode::Balance => list.sort_by_key(|p| p.balance),
            SortMode::LunchFrequency => {
                let scores = self.lunch_scores();
                let score = |p: &Person| scores.get(p.name.as_str()).copied().unwrap_or(0.0);
                list.sort_by(|a, b| score(b).total_cmp(&score(a)));
            }
        }
        list
    }

    /// Decaying lunch attendance score per current person
    ///
    /// Walks the history newest first. The newest lunch is worth 1.0 to each
    /// of its eaters and every older lunch is worth [`LUNCH_DECAY`] times the
    /// one after it.
    pub fn lunch_scores(&self) -> HashMap<&str, f64> {
        let mut scores: HashMap<&str, f64> =
            self.people.keys().map(|name| (name.as_str(), 0.0)).collect();
        let mut weight = 1.0;
        for txn in self.history.iter().rev() {
            if let TransactionKind::Lunch { eaters, .. } = txn.kind() {
                for eater in eaters {
                    if let Some(score) = scores.get_mut(eater.as_str()) {
                        *score += weight;
                    }
                }
                weight *= LUNCH_DECAY;
            }
        }
        scores
    }

    /// Every transaction, one description per line
    pub fn show_history(&self, reverse: bool) -> String {
        let lines: Vec<String> = self.history.iter().map(|t| t.describe()).collect();
        join_blocks(lines, reverse)
    }

    /// Transactions that moved `name`'s balance, each followed by the
    /// running balance after it
    ///
    /// In reverse order each balance line comes before its transaction.
    pub fn show_person_history(&self, reverse: bool, name: &str) -> String {
        let mut balance = Money::zero();
        let mut blocks = Vec::new();
        for txn in &self.history {
            let delta = txn.effect_on(name);
            if delta.is_zero() {
                continue;
            }
            balance = balance.saturating_add(delta);
            let balance_line = format!("Balance: {}", balance);
            blocks.push(if reverse {
                format!("{}\n{}", balance_line, txn.describe())
            } else {
                format!("{}\n{}", txn.describe(), balance_line)
            });
        }
        join_blocks(blocks, reverse)
    }

    /// Transactions touching any of `selected`, plus a closing balance per person
    ///
    /// In reverse order the balance summary comes first.
    pub fn show_group_history(
        &self,
        reverse: bool,
        selected: &BTreeSet<String>,
    ) -> LedgerResult<String> {
        let mut summary = String::from("Balance:\n");
        for name in selected {
            let person = self
                .get_person(name)
                .ok_or_else(|| LedgerError::person_not_found(name.as_str()))?;
            summary.push_str(&format!("{}: {}\n", person.name, person.balance));
        }

        let lines: Vec<String> = self
            .history
            .iter()
            .filter(|t| selected.iter().any(|name| !t.effect_on(name).is_zero()))
            .map(|t| t.describe())
            .collect();
        let history = join_blocks(lines, reverse);

        Ok(if reverse {
            summary + &history
        } else {
            history + &summary
        })
    }
}

/// Newline-terminate each block, newest first when `reverse`
fn join_blocks(blocks: Vec<String>, reverse: bool) -> String {
    let mut out = String::new();
    let ordered: Box<dyn Iterator<Item = &String>> = if reverse {
        Box::new(blocks.iter().rev())
    } else {
        Box::new(blocks.iter())
    };
    for block in ordered {
        out.push_str(block);
        out.push('\n');
    }
    out
}
