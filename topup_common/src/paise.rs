use std::{fmt::Display, str::FromStr};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use thiserror::Error;

pub const CURRENCY_CODE: &str = "INR";
/// Razorpay amounts are always quoted in the smallest subunit of a two-decimal currency.
pub const SUBUNITS_PER_MAJOR: i64 = 100;
const MAJOR_UNIT_SCALE: u32 = 2;

//--------------------------------------       Paise         ---------------------------------------------------------
/// An exact amount of money in currency subunits. Ledger arithmetic is done in subunits; anything persisted or
/// reported is in major units (see [`Paise::to_major`] and [`major_units`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Paise(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented in paise: {0}")]
pub struct PaiseConversionError(String);

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = SUBUNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}₹{}.{:02}", abs / per_major, abs % per_major)
    }
}

impl Paise {
    pub fn from_major(major: i64) -> Self {
        Self(major * SUBUNITS_PER_MAJOR)
    }

    /// The exact amount in major currency units, e.g. 10000 paise is `100.00`.
    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.0, MAJOR_UNIT_SCALE)
    }

    /// Fails if `major` has fractions of a paisa, or does not fit.
    pub fn try_from_major(major: Decimal) -> Result<Self, PaiseConversionError> {
        let subunits = major
            .checked_mul(Decimal::from(SUBUNITS_PER_MAJOR))
            .ok_or_else(|| PaiseConversionError(format!("{major} is out of range")))?;
        if !subunits.fract().is_zero() {
            return Err(PaiseConversionError(format!("{major} has fractions of a paisa")));
        }
        subunits.to_i64().map(Self).ok_or_else(|| PaiseConversionError(format!("{major} is out of range")))
    }

    /// Parses a major-unit decimal string such as `"75.25"`.
    pub fn parse_major(s: &str) -> Result<Self, PaiseConversionError> {
        let major = Decimal::from_str(s.trim()).map_err(|e| PaiseConversionError(format!("{s}: {e}")))?;
        Self::try_from_major(major)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

/// Serializes a [`Paise`] field as a major-unit JSON number (`10000` paise is written as `100.0`).
///
/// ```nocompile
/// #[serde(with = "topup_common::major_units")]
/// pub balance: Paise,
/// ```
pub mod major_units {
    use rust_decimal::Decimal;
    use serde::{de::Error, Deserializer, Serializer};

    use super::Paise;

    pub fn serialize<S: Serializer>(value: &Paise, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&value.to_major(), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Paise, D::Error> {
        let major: Decimal = rust_decimal::serde::float::deserialize(deserializer)?;
        Paise::try_from_major(major).map_err(D::Error::custom)
    }
}
