//! Fixed-point money in the marketplace's single currency.
//!
//! Amounts are held in minor units (cents) so line subtotals and order totals
//! never accumulate floating-point error.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const MINOR_PER_MAJOR: i64 = 100;

/// A monetary amount in minor units.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Price of `quantity` units at this unit price.
    pub fn checked_times(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// This amount reduced by a percentage expressed in basis points
    /// (1250 = 12.50%), rounded half-up to the minor unit.
    pub fn less_percent(self, basis_points: u32) -> Money {
        let bps = i128::from(basis_points.min(10_000));
        let cut = (i128::from(self.0) * bps + 5_000) / 10_000;
        Money(self.0 - cut as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR as u64;
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parses `"12"`, `"12.5"` or `"12.50"`; at most two fraction digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::invalid_request(format!("invalid amount: '{s}'"));
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (major, minor) = digits.split_once('.').unwrap_or((digits, ""));
        if major.is_empty() || minor.len() > 2 {
            return Err(invalid());
        }
        if !major.bytes().all(|b| b.is_ascii_digit()) || !minor.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let major: i64 = major.parse().map_err(|_| invalid())?;
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => minor.parse().map_err(|_| invalid())?,
        };
        let total = major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(minor))
            .ok_or_else(invalid)?;
        Ok(Money(if negative { -total } else { total }))
    }
}
