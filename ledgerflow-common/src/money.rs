//! Fixed-scale money type. Amounts are always scale-2 decimals; we store them
//! as signed minor units (cents) so arithmetic is exact integer math instead of
//! floating point, and so money-conservation checks can compare for equality.

use std::fmt;

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A positive-or-signed amount of money, fixed at two decimal places.
///
/// Internally this is minor units (cents): `Money::from_minor(25000)` is `250.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount is not a valid decimal with at most two fractional digits")]
    InvalidFormat,
    #[error("amount is non-positive")]
    NonPositive,
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor_units: i64) -> Self {
        Money(minor_units)
    }

    pub fn minor_units(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn negate(self) -> Money {
        Money(-self.0)
    }

    /// Parses a decimal string like `"250.00"` or `"250"` into minor units.
    /// Rejects more than two fractional digits so precision is never silently lost.
    pub fn parse(input: &str) -> Result<Money, MoneyError> {
        let input = input.trim();
        let negative = input.starts_with('-');
        let digits = input.strip_prefix('-').unwrap_or(input);

        let mut parts = digits.splitn(2, '.');
        let whole = parts.next().unwrap_or("");
        let frac = parts.next().unwrap_or("");
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::InvalidFormat);
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::InvalidFormat);
        }

        let whole: i64 = whole.parse().map_err(|_| MoneyError::InvalidFormat)?;
        let frac_value: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| MoneyError::InvalidFormat)? * 10,
            2 => frac.parse().map_err(|_| MoneyError::InvalidFormat)?,
            _ => unreachable!(),
        };

        let minor = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac_value))
            .ok_or(MoneyError::InvalidFormat)?;

        Ok(Money(if negative { -minor } else { minor }))
    }

    /// Parses and requires the result to be strictly positive (spec invariant 1).
    pub fn parse_positive(input: &str) -> Result<Money, MoneyError> {
        let money = Self::parse(input)?;
        if !money.is_positive() {
            return Err(MoneyError::NonPositive);
        }
        Ok(money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Money::parse(&raw).map_err(DeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_decimal_places() {
        assert_eq!(Money::parse("250.00").unwrap().minor_units(), 25000);
        assert_eq!(Money::parse("0.01").unwrap().minor_units(), 1);
        assert_eq!(Money::parse("1").unwrap().minor_units(), 100);
    }

    #[test]
    fn rejects_extra_precision() {
        assert_eq!(Money::parse("1.001").unwrap_err(), MoneyError::InvalidFormat);
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert_eq!(
            Money::parse_positive("0.00").unwrap_err(),
            MoneyError::NonPositive
        );
        assert_eq!(
            Money::parse_positive("-5.00").unwrap_err(),
            MoneyError::NonPositive
        );
    }

    #[test]
    fn display_round_trips() {
        let m = Money::parse("1234.56").unwrap();
        assert_eq!(m.to_string(), "1234.56");
    }

    #[test]
    fn conservation_add_sub() {
        let a = Money::parse("750.00").unwrap();
        let delta = Money::parse("250.00").unwrap();
        assert_eq!(a.checked_add(delta).unwrap().to_string(), "1000.00");
        assert_eq!(a.checked_sub(delta).unwrap().to_string(), "500.00");
    }
}
