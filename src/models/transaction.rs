//! Transaction model
//!
//! A transaction is an immutable, dated fact about the fund. There are five
//! kinds; each one knows how to apply itself to the people table, how to
//! reverse that exactly, how to write itself as one history line and how to
//! describe itself to a human.
//!
//! Every kind moves money between existing people (or moves none at all), so
//! the sum of all balances stays zero.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

use super::money::Money;
use super::person::{People, Person};
use crate::error::{LedgerError, LedgerResult};

/// Remarks value stored when the user gave none
pub const NO_REMARKS: &str = "nothing";

/// The variant-specific part of a transaction
#[derive(Debug, Clone)]
pub enum TransactionKind {
    /// A new person joins with a zero balance
    Add { name: String, email: String },

    /// A settled person leaves
    Delete { name: String, email: String },

    /// `from` hands `amount` to `to`
    Transfer {
        from: String,
        to: String,
        amount: Money,
        remarks: String,
    },

    /// `payer` pays `amount` for a meal shared by `eaters`
    Lunch {
        payer: String,
        amount: Money,
        remarks: String,
        eaters: Vec<String>,
    },

    /// Compare-and-swap of a person's email
    ChangeEmail {
        name: String,
        old_email: String,
        new_email: String,
    },
}

impl TransactionKind {
    /// The tag used in the history format
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Delete { .. } => "delete",
            Self::Transfer { .. } => "transfer",
            Self::Lunch { .. } => "lunch",
            Self::ChangeEmail { .. } => "chemail",
        }
    }
}

/// A dated, validated ledger transaction
///
/// Two transactions are equal when their history lines are equal.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Milliseconds since the Unix epoch
    date: i64,
    kind: TransactionKind,
}

impl Transaction {
    /// Create an add-person transaction
    ///
    /// A `date` of 0 means "now", for every constructor.
    pub fn add(date: i64, name: impl Into<String>, email: impl Into<String>) -> LedgerResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(LedgerError::invalid("person name must not be empty"));
        }
        Ok(Self::with_date(
            date,
            TransactionKind::Add {
                name,
                email: email.into(),
            },
        ))
    }

    /// Create a delete-person transaction
    ///
    /// `email` must be the person's email at the time of deletion so that
    /// undo can restore it.
    pub fn delete(
        date: i64,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> LedgerResult<Self> {
        Ok(Self::with_date(
            date,
            TransactionKind::Delete {
                name: name.into(),
                email: email.into(),
            },
        ))
    }

    /// Create a transfer transaction
    pub fn transfer(
        date: i64,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: Money,
        remarks: impl Into<String>,
    ) -> LedgerResult<Self> {
        let from = from.into();
        let to = to.into();
        if from == to {
            return Err(LedgerError::invalid(format!(
                "{} cannot transfer to themselves",
                from
            )));
        }
        if !amount.is_positive() {
            return Err(LedgerError::invalid("transfer amount must be positive"));
        }
        Ok(Self::with_date(
            date,
            TransactionKind::Transfer {
                from,
                to,
                amount,
                remarks: normalize_remarks(remarks.into()),
            },
        ))
    }

    /// Create a lunch transaction
    ///
    /// Eaters keep the order given; listing someone twice is rejected.
    pub fn lunch(
        date: i64,
        payer: impl Into<String>,
        amount: Money,
        remarks: impl Into<String>,
        eaters: Vec<String>,
    ) -> LedgerResult<Self> {
        if eaters.is_empty() {
            return Err(LedgerError::invalid("a lunch needs at least one eater"));
        }
        if !amount.is_positive() {
            return Err(LedgerError::invalid("lunch amount must be positive"));
        }
        if let Some(dup) = eaters
            .iter()
            .enumerate()
            .find(|(i, e)| eaters[..*i].contains(e))
            .map(|(_, e)| e)
        {
            return Err(LedgerError::invalid(format!("{} is listed twice", dup)));
        }
        Ok(Self::with_date(
            date,
            TransactionKind::Lunch {
                payer: payer.into(),
                amount,
                remarks: normalize_remarks(remarks.into()),
                eaters,
            },
        ))
    }

    /// Create an email change guarded by the expected current email
    pub fn change_email(
        date: i64,
        name: impl Into<String>,
        old_email: impl Into<String>,
        new_email: impl Into<String>,
    ) -> LedgerResult<Self> {
        Ok(Self::with_date(
            date,
            TransactionKind::ChangeEmail {
                name: name.into(),
                old_email: old_email.into(),
                new_email: new_email.into(),
            },
        ))
    }

    fn with_date(date: i64, kind: TransactionKind) -> Self {
        let date = if date == 0 {
            Utc::now().timestamp_millis()
        } else {
            date
        };
        Self { date, kind }
    }

    /// Milliseconds since the Unix epoch
    pub fn date(&self) -> i64 {
        self.date
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    /// Per-eater share of a lunch, `None` for other kinds
    pub fn split(&self) -> Option<Money> {
        match &self.kind {
            TransactionKind::Lunch { amount, eaters, .. } => Some(amount.split(eaters.len())),
            _ => None,
        }
    }

    /// Apply this transaction to the people table
    ///
    /// Every precondition is checked before anything is written, so a
    /// rejected transaction leaves `people` untouched.
    pub fn apply(&self, people: &mut People) -> LedgerResult<()> {
        match &self.kind {
            TransactionKind::Add { name, email } => {
                if people.contains_key(name) {
                    return Err(LedgerError::DuplicatePerson(name.clone()));
                }
                people.insert(name.clone(), Person::new(name.clone(), email.clone()));
            }
            TransactionKind::Delete { name, email } => {
                let person = lookup(people, name)?;
                if !person.is_settled() {
                    return Err(LedgerError::NonZeroBalance {
                        name: name.clone(),
                        balance: person.balance.cents(),
                    });
                }
                if &person.email != email {
                    return Err(LedgerError::EmailMismatch {
                        name: name.clone(),
                        expected: email.clone(),
                        actual: person.email.clone(),
                    });
                }
                people.remove(name);
            }
            TransactionKind::Transfer { .. } | TransactionKind::Lunch { .. } => {
                shift_balances(people, &self.balance_deltas(), 1)?;
            }
            TransactionKind::ChangeEmail {
                name,
                old_email,
                new_email,
            } => {
                let person = lookup_mut(people, name)?;
                if &person.email != old_email {
                    return Err(LedgerError::EmailMismatch {
                        name: name.clone(),
                        expected: old_email.clone(),
                        actual: person.email.clone(),
                    });
                }
                person.email = new_email.clone();
            }
        }
        Ok(())
    }

    /// Reverse [`apply`](Self::apply)
    ///
    /// Only valid on the exact state `apply` produced; beyond checking that the
    /// people involved exist, nothing is re-validated.
    pub fn undo(&self, people: &mut People) -> LedgerResult<()> {
        match &self.kind {
            TransactionKind::Add { name, .. } => {
                lookup(people, name)?;
                people.remove(name);
            }
            TransactionKind::Delete { name, email } => {
                if people.contains_key(name) {
                    return Err(LedgerError::DuplicatePerson(name.clone()));
                }
                people.insert(name.clone(), Person::new(name.clone(), email.clone()));
            }
            TransactionKind::Transfer { .. } | TransactionKind::Lunch { .. } => {
                shift_balances(people, &self.balance_deltas(), -1)?;
            }
            TransactionKind::ChangeEmail {
                name, old_email, ..
            } => {
                lookup_mut(people, name)?.email = old_email.clone();
            }
        }
        Ok(())
    }

    /// The history line for this transaction, without a trailing newline
    pub fn to_line(&self) -> String {
        let date = self.date;
        match &self.kind {
            TransactionKind::Add { name, email } => format!("{}\tadd\t{}\t{}", date, name, email),
            TransactionKind::Delete { name, email } => {
                format!("{}\tdelete\t{}\t{}", date, name, email)
            }
            TransactionKind::Transfer {
                from,
                to,
                amount,
                remarks,
            } => format!(
                "{}\ttransfer\t{}\t{}\t{}\t{}",
                date,
                from,
                to,
                amount.cents(),
                remarks
            ),
            TransactionKind::Lunch {
                payer,
                amount,
                remarks,
                eaters,
            } => {
                let mut line = format!("{}\tlunch\t{}\t{}\t{}", date, payer, amount.cents(), remarks);
                for eater in eaters {
                    line.push('\t');
                    line.push_str(eater);
                }
                line
            }
            TransactionKind::ChangeEmail {
                name,
                old_email,
                new_email,
            } => format!("{}\tchemail\t{}\t{}\t{}", date, name, old_email, new_email),
        }
    }

    /// One-line human readable summary
    pub fn describe(&self) -> String {
        match &self.kind {
            TransactionKind::Add { name, email } => format!("add {} <{}>", name, email),
            TransactionKind::Delete { name, email } => format!("delete {} <{}>", name, email),
            TransactionKind::Transfer {
                from,
                to,
                amount,
                remarks,
            } => format!(
                "{} gave {} to {} on {}{}",
                from,
                amount,
                to,
                format_date(self.date),
                format_remarks(remarks)
            ),
            TransactionKind::Lunch {
                payer,
                amount,
                remarks,
                eaters,
            } => format!(
                "{} paid {} for {} on {}{}",
                payer,
                amount,
                join_names(eaters),
                format_date(self.date),
                format_remarks(remarks)
            ),
            TransactionKind::ChangeEmail {
                name, new_email, ..
            } => format!(
                "{}'s new email: {} {}",
                name,
                new_email,
                format_date(self.date)
            ),
        }
    }

    /// Signed balance change this transaction causes for `name`
    ///
    /// Saturates at the bounds of `i64` cents.
    pub fn effect_on(&self, name: &str) -> Money {
        let effect: i128 = self
            .balance_deltas()
            .iter()
            .filter(|(who, _)| *who == name)
            .map(|(_, delta)| delta)
            .sum();
        let cents = i64::try_from(effect).unwrap_or(if effect < 0 { i64::MIN } else { i64::MAX });
        Money::from_cents(cents)
    }

    /// Cents each person's balance moves by when this transaction is applied
    ///
    /// A payer who also ate appears twice.
    fn balance_deltas(&self) -> Vec<(&str, i128)> {
        match &self.kind {
            TransactionKind::Transfer {
                from, to, amount, ..
            } => {
                let cents = i128::from(amount.cents());
                vec![(from.as_str(), cents), (to.as_str(), -cents)]
            }
            TransactionKind::Lunch {
                payer,
                amount,
                eaters,
                ..
            } => {
                let split = i128::from(amount.split(eaters.len()).cents());
                let mut deltas: Vec<(&str, i128)> =
                    eaters.iter().map(|e| (e.as_str(), -split)).collect();
                deltas.push((payer.as_str(), split * eaters.len() as i128));
                deltas
            }
            TransactionKind::Add { .. }
            | TransactionKind::Delete { .. }
            | TransactionKind::ChangeEmail { .. } => Vec::new(),
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.to_line() == other.to_line()
    }
}

impl Eq for Transaction {}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn normalize_remarks(remarks: String) -> String {
    if remarks.is_empty() {
        NO_REMARKS.to_string()
    } else {
        remarks
    }
}

fn format_remarks(remarks: &str) -> String {
    if remarks == NO_REMARKS {
        String::new()
    } else {
        format!(" ({})", remarks)
    }
}

/// "A", "A and B", "A, B and C"
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

fn format_date(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn lookup<'a>(people: &'a People, name: &str) -> LedgerResult<&'a Person> {
    people
        .get(name)
        .ok_or_else(|| LedgerError::person_not_found(name))
}

fn lookup_mut<'a>(people: &'a mut People, name: &str) -> LedgerResult<&'a mut Person> {
    people
        .get_mut(name)
        .ok_or_else(|| LedgerError::person_not_found(name))
}

/// Move balances by `sign * delta` for every pair
///
/// All people must exist and every resulting balance must fit in `i64`
/// cents; otherwise nothing is written.
fn shift_balances(people: &mut People, deltas: &[(&str, i128)], sign: i128) -> LedgerResult<()> {
    let mut updated: BTreeMap<&str, i128> = BTreeMap::new();
    for &(name, delta) in deltas {
        let balance = i128::from(lookup(people, name)?.balance.cents());
        *updated.entry(name).or_insert(balance) += sign * delta;
    }

    let mut checked = Vec::with_capacity(updated.len());
    for (name, cents) in updated {
        let cents = i64::try_from(cents).map_err(|_| {
            LedgerError::invalid(format!("balance of {} would overflow", name))
        })?;
        checked.push((name, Money::from_cents(cents)));
    }

    for (name, balance) in checked {
        lookup_mut(people, name)?.balance = balance;
    }
    Ok(())
}
