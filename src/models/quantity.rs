// Exact fixed-point quantities. Amounts are kept in hundredths so sums never
// pick up floating point drift before presentation.

use crate::core::error::ParseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// Parse a decimal string into hundredths, rounding half away from zero
/// past the second decimal place.
fn parse_hundredths(raw: &str) -> Result<i64, ParseError> {
    let invalid = || ParseError::InvalidAmount(raw.to_string());
    let s = raw.trim();
    if s.is_empty() {
        return Err(invalid());
    }

    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| invalid())?
    };

    let mut frac_digits = frac_part.bytes().map(|b| (b - b'0') as i64);
    let tenths = frac_digits.next().unwrap_or(0);
    let hundredths = frac_digits.next().unwrap_or(0);
    let round_up = frac_digits.next().map(|d| d >= 5).unwrap_or(false);

    let value = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
        .ok_or_else(invalid)?;

    Ok(if negative { -value } else { value })
}

fn format_hundredths(value: i64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Accepts JSON numbers and decimal strings (the backend serializes
/// decimal fields as strings).
fn deserialize_hundredths<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let text = match Raw::deserialize(deserializer)? {
        Raw::Int(i) => i.to_string(),
        Raw::Float(x) => x.to_string(),
        Raw::Text(s) => s,
    };
    parse_hundredths(&text).map_err(serde::de::Error::custom)
}

/// Currency amount in cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Mean over `count` items, rounded half away from zero to the cent.
    pub fn average(total: Money, count: u64) -> Money {
        if count == 0 {
            return Money::ZERO;
        }
        Money(rounded_div(total.0, count as i64))
    }
}

/// Filament mass in centigrams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Grams(i64);

impl Grams {
    pub const ZERO: Grams = Grams(0);

    pub fn from_centigrams(cg: i64) -> Self {
        Grams(cg)
    }

    pub fn whole(grams: i64) -> Self {
        Grams(grams * 100)
    }

    pub fn centigrams(&self) -> i64 {
        self.0
    }
}

/// Dimensionless multiplier or discount rate in hundredths (`1.20` is 120).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Factor(i64);

impl Factor {
    pub const ZERO: Factor = Factor(0);
    pub const ONE: Factor = Factor(100);

    pub fn from_hundredths(hundredths: i64) -> Self {
        Factor(hundredths)
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }
}

fn rounded_div(numerator: i64, denominator: i64) -> i64 {
    let q = numerator / denominator;
    let r = numerator % denominator;
    if r.abs() * 2 >= denominator.abs() {
        q + numerator.signum() * denominator.signum()
    } else {
        q
    }
}

macro_rules! fixed_point_impls {
    ($ty:ident) => {
        impl FromStr for $ty {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hundredths(s).map($ty)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                format_hundredths(self.0, f)
            }
        }

        impl Add for $ty {
            type Output = $ty;

            fn add(self, rhs: $ty) -> $ty {
                $ty(self.0 + rhs.0)
            }
        }

        impl AddAssign for $ty {
            fn add_assign(&mut self, rhs: $ty) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $ty {
            type Output = $ty;

            fn sub(self, rhs: $ty) -> $ty {
                $ty(self.0 - rhs.0)
            }
        }

        impl SubAssign for $ty {
            fn sub_assign(&mut self, rhs: $ty) {
                self.0 -= rhs.0;
            }
        }

        impl Sum for $ty {
            fn sum<I: Iterator<Item = $ty>>(iter: I) -> $ty {
                iter.fold($ty(0), Add::add)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserialize_hundredths(deserializer).map($ty)
            }
        }
    };
}

fixed_point_impls!(Money);
fixed_point_impls!(Grams);
fixed_point_impls!(Factor);
