//! Money type for balances and amounts
//!
//! Amounts are integer cents of the fund's single implicit currency. The
//! only division the ledger ever does is the lunch split, which rounds half
//! up and is exposed here as [`Money::split`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A monetary amount stored as cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use lunch_fund::models::Money;
    /// let amount = Money::from_cents(1050); // $10.50
    /// assert_eq!(amount.to_string(), "$10.50");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Per-head share of a positive amount, rounded half up
    ///
    /// `parts` must be non-zero. The shares do not have to add back up to
    /// the whole amount. Never overflows, even for amounts near `i64::MAX`.
    ///
    /// ```
    /// use lunch_fund::models::Money;
    /// assert_eq!(Money::from_cents(100).split(3).cents(), 33);
    /// assert_eq!(Money::from_cents(101).split(2).cents(), 51);
    /// ```
    pub fn split(&self, parts: usize) -> Self {
        let divisor = i64::try_from(parts).unwrap_or(i64::MAX);
        // (a + d/2) / d, without forming a + d/2
        Self(self.0 / divisor + (self.0 % divisor + divisor / 2) / divisor)
    }

    /// Add two amounts, saturating at the bounds of `i64` cents
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parse a money amount from user input
    ///
    /// Accepts formats: "10.50", "-10.50", "$10.50", "10". Whole numbers are
    /// dollars, not cents; digits past the second decimal are dropped.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let s = s.trim();
        let invalid = || MoneyParseError::InvalidFormat(s.to_string());

        let (negative, rest) = match s.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, s),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        let (whole, frac) = rest.split_once('.').unwrap_or((rest, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(invalid());
        }

        let dollars: i64 = whole.parse().map_err(|_| invalid())?;
        let mut frac_digits = frac.bytes().map(|b| i64::from(b - b'0'));
        let tens = frac_digits.next().unwrap_or(0);
        let ones = frac_digits.next().unwrap_or(0);

        let cents = dollars
            .checked_mul(100)
            .and_then(|c| c.checked_add(tens * 10 + ones))
            .ok_or_else(invalid)?;

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Format with a currency symbol
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}{}.{:02}", sign, symbol, abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with_symbol("$"))
    }
}

/// Wrapping sum: exact whenever the true total fits in `i64` cents, which a
/// zero-sum ledger's total always does
impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.fold(0i64, |acc, m| acc.wrapping_add(m.0)))
    }
}

/// Error type for money parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    #[error("Invalid money format: {0}")]
    InvalidFormat(String),
}
