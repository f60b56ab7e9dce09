//! Monetary amounts stored as integer cents

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("Invalid amount '{0}': expected a number like 1234.56")]
    Invalid(String),

    #[error("Amount '{0}' has more than two decimal places")]
    TooPrecise(String),

    #[error("Amount '{0}' is negative")]
    Negative(String),

    #[error("Amount '{0}' is too large")]
    Overflow(String),
}

/// An amount of money in cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Multiplies a unit price by a quantity, saturating on overflow
    pub fn times(&self, quantity: i64) -> Cents {
        Cents(self.0.saturating_mul(quantity))
    }
}

impl std::ops::Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, |acc, c| acc + c)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        f.pad(&format!("{}{}.{:02}", sign, abs / 100, abs % 100))
    }
}

impl FromStr for Cents {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.starts_with('-') {
            return Err(MoneyError::Negative(raw.to_string()));
        }

        let normalized = raw.replace(',', ".");
        let (whole, fraction) = match normalized.split_once('.') {
            Some((w, f)) => (w, f),
            None => (normalized.as_str(), ""),
        };

        if whole.is_empty()
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(MoneyError::Invalid(raw.to_string()));
        }
        if fraction.len() > 2 {
            return Err(MoneyError::TooPrecise(raw.to_string()));
        }

        let whole: i64 = whole
            .parse()
            .map_err(|_| MoneyError::Overflow(raw.to_string()))?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            _ => fraction.parse::<i64>().unwrap_or(0),
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .map(Cents)
            .ok_or_else(|| MoneyError::Overflow(raw.to_string()))
    }
}
