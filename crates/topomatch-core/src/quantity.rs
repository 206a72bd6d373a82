//! Exact resource quantities.
//!
//! A [`Quantity`] is a non-negative amount of some resource kind, stored
//! as milli-units in an `i128` so that arithmetic and comparison are
//! exact. The string form follows the conventional resource grammar:
//! plain integers (`"4"`), milli-units (`"500m"`), decimal suffixes
//! (`k`, `M`, `G`, `T`) and binary suffixes (`Ki`, `Mi`, `Gi`, `Ti`),
//! with fractional mantissas down to milli precision (`"1.5Gi"`, `"0.25"`).

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Milli-units per whole unit.
const MILLI: i128 = 1000;

/// Errors produced when parsing a quantity string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityParseError {
    #[error("empty quantity string")]
    Empty,

    #[error("invalid number in quantity: {0:?}")]
    InvalidNumber(String),

    #[error("unknown quantity suffix: {0:?}")]
    UnknownSuffix(String),

    #[error("quantity {0:?} is finer than milli precision")]
    TooPrecise(String),

    #[error("quantity {0:?} overflows the representable range")]
    Overflow(String),

    #[error("negative quantities are not allowed: {0:?}")]
    Negative(String),
}

/// An exact, non-negative resource amount with milli-unit resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(i128);

impl Quantity {
    /// The zero quantity.
    pub const fn zero() -> Self {
        Quantity(0)
    }

    /// A quantity of `n` whole units.
    pub const fn from_units(n: u64) -> Self {
        Quantity(n as i128 * MILLI)
    }

    /// A quantity of `n` milli-units (e.g. milliCPU).
    pub const fn from_millis(n: u64) -> Self {
        Quantity(n as i128)
    }

    /// The amount in milli-units.
    pub const fn millis(self) -> i128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtraction that clamps at zero instead of going negative.
    pub fn saturating_sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.saturating_sub(rhs.0).max(0))
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % MILLI == 0 {
            write!(f, "{}", self.0 / MILLI)
        } else {
            write!(f, "{}m", self.0)
        }
    }
}

/// Multiplier (in whole units) for a suffix, or `None` for the milli suffix.
fn suffix_scale(suffix: &str) -> Option<i128> {
    match suffix {
        "" => Some(1),
        "k" => Some(1_000),
        "M" => Some(1_000_000),
        "G" => Some(1_000_000_000),
        "T" => Some(1_000_000_000_000),
        "Ki" => Some(1 << 10),
        "Mi" => Some(1 << 20),
        "Gi" => Some(1 << 30),
        "Ti" => Some(1i128 << 40),
        _ => None,
    }
}

impl FromStr for Quantity {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(QuantityParseError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(QuantityParseError::Negative(s.to_string()));
        }

        let split = trimmed
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);

        // Mantissa as milli-units of the suffix's unit.
        let (whole, frac) = match number.split_once('.') {
            Some((w, f)) => (w, f),
            None => (number, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(QuantityParseError::InvalidNumber(s.to_string()));
        }
        if frac.len() > 3 {
            return Err(QuantityParseError::TooPrecise(s.to_string()));
        }
        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| QuantityParseError::InvalidNumber(s.to_string()))?
        };
        let mut frac_millis: i128 = if frac.is_empty() {
            0
        } else {
            frac.parse()
                .map_err(|_| QuantityParseError::InvalidNumber(s.to_string()))?
        };
        for _ in frac.len()..3 {
            frac_millis *= 10;
        }

        if suffix == "m" {
            if frac_millis != 0 {
                return Err(QuantityParseError::TooPrecise(s.to_string()));
            }
            return Ok(Quantity(whole));
        }

        let scale =
            suffix_scale(suffix).ok_or_else(|| QuantityParseError::UnknownSuffix(suffix.to_string()))?;
        let millis = whole
            .checked_mul(MILLI)
            .and_then(|m| m.checked_add(frac_millis))
            .and_then(|m| m.checked_mul(scale))
            .ok_or_else(|| QuantityParseError::Overflow(s.to_string()))?;
        Ok(Quantity(millis))
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
