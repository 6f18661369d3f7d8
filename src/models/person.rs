//! Person model
//!
//! A member of the lunch fund. The name is the identity; the balance is what
//! the fund owes this person (negative when the person owes the fund).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::money::Money;

/// People keyed by name, iterated in name order
pub type People = BTreeMap<String, Person>;

/// A member of the lunch fund
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Unique name, fixed once the person is added
    pub name: String,

    /// Contact email, changed only through an email change transaction
    #[serde(default)]
    pub email: String,

    /// Amount owed to this person
    pub balance: Money,
}

impl Person {
    /// Create a new person with a zero balance
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            balance: Money::zero(),
        }
    }

    /// Check if this person is owed money
    pub fn is_owed(&self) -> bool {
        self.balance.is_positive()
    }

    /// Check if this person owes money
    pub fn owes(&self) -> bool {
        self.balance.is_negative()
    }

    /// Check if this person can leave the fund
    pub fn is_settled(&self) -> bool {
        self.balance.is_zero()
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>: {}", self.name, self.email, self.balance)
    }
}
