//! Monetary amounts in base units.
//!
//! Amounts are unsigned integers of the smallest denomination (e.g.
//! 10^-24 of the pool token). On the wire they are decimal strings so that
//! clients without 128-bit integers never lose precision:
//!
//! ```text
//! Balance(100_000_000_000_000_000_000_000)  <->  "100000000000000000000000"
//! ```

use std::{fmt, iter::Sum, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// An amount of the pool token in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Balance(pub u128);

impl Balance {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    #[must_use]
    pub fn min(self, rhs: Self) -> Self {
        Self(self.0.min(rhs.0))
    }

    /// Lossless conversion for yield arithmetic. `None` above ~7.9e28 units.
    #[must_use]
    pub fn to_decimal(self) -> Option<Decimal> {
        let units = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(units, 0).ok()
    }

    /// Truncating conversion back from yield arithmetic.
    #[must_use]
    pub fn from_decimal_floor(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() {
            return None;
        }
        value.trunc().to_u128().map(Self)
    }

    /// Parse a human amount such as `"0.1"` with `decimals` fractional digits
    /// of precision into base units.
    #[must_use]
    pub fn from_human(amount: &str, decimals: u32) -> Option<Self> {
        let value = Decimal::from_str(amount).ok()?;
        let scale = Decimal::try_from_i128_with_scale(10_i128.checked_pow(decimals)?, 0).ok()?;
        Self::from_decimal_floor(value.checked_mul(scale)?)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Balance {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>().map(Self)
    }
}

impl From<u128> for Balance {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl Sum for Balance {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|b| b.0).sum())
    }
}

impl<'a> Sum<&'a Balance> for Balance {
    fn sum<I: Iterator<Item = &'a Balance>>(iter: I) -> Self {
        Self(iter.map(|b| b.0).sum())
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u128>()
            .map(Self)
            .map_err(|e| de::Error::custom(format!("invalid balance {raw:?}: {e}")))
    }
}
