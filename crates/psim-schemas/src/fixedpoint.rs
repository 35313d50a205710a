//! Fixed-point money type.
//!
//! Every monetary amount in the simulator (prices, allocations, position
//! values, profits) is a `Micros`: an `i64` at 1e-6 scale. Floats coming from
//! an upstream quote source are converted exactly once, at the provider
//! boundary, and user-entered decimal strings are parsed without touching
//! floating point at all.
//!
//! # Scale
//!
//! 1 unit of currency = 1_000_000 Micros. Share counts stay plain integers
//! and are never implicitly convertible.
//!
//! # Rounding
//!
//! All rounding here is half away from zero. [`Micros::round_to_cents`] is the
//! single "round to 2 decimal places" primitive used when a result is built.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Micros per whole currency unit.
pub const MICROS_SCALE: i64 = 1_000_000;

/// Micros per cent (1e-2).
const MICROS_PER_CENT: i64 = 10_000;

// ---------------------------------------------------------------------------
// Micros newtype
// ---------------------------------------------------------------------------

/// A fixed-point monetary amount at 1e-6 scale (micros).
///
/// There is no `From<i64>`; use [`Micros::new`] so a raw integer only becomes
/// money on purpose. Serializes transparently as the raw integer.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Micros(i64);

impl Micros {
    pub const ZERO: Micros = Micros(0);
    pub const ONE: Micros = Micros(MICROS_SCALE);
    pub const MAX: Micros = Micros(i64::MAX);
    pub const MIN: Micros = Micros(i64::MIN);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        Micros(raw)
    }

    /// Whole currency units, e.g. `Micros::from_units(1000)` is 1000.00.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Micros(units * MICROS_SCALE)
    }

    /// Amount expressed in cents, e.g. `Micros::from_cents(1050)` is 10.50.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Micros(cents * MICROS_PER_CENT)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Convert a float amount to micros, rounding half away from zero.
    ///
    /// Returns `None` for NaN, infinities, and values outside the `i64` range.
    pub fn from_f64(value: f64) -> Option<Micros> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * MICROS_SCALE as f64).round();
        if scaled >= i64::MAX as f64 || scaled <= i64::MIN as f64 {
            return None;
        }
        Some(Micros(scaled as i64))
    }

    /// Lossy float view, for ratios and display only.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / MICROS_SCALE as f64
    }

    #[inline]
    pub fn saturating_add(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_sub(rhs.0))
    }

    /// `Micros::MIN.abs()` saturates to `Micros::MAX`.
    #[inline]
    pub fn abs(self) -> Micros {
        Micros(self.0.saturating_abs())
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply a per-share price by a share count, widening to i128 and
    /// clamping the result into the `i64` range.
    pub fn mul_shares_clamped(self, shares: u64) -> Micros {
        Micros(i128_to_i64_clamp(self.0 as i128 * shares as i128))
    }

    /// Round to a whole number of cents (half away from zero).
    pub fn round_to_cents(self) -> Micros {
        Micros(round_to_unit(self.0, MICROS_PER_CENT))
    }

    /// Render with `places` decimal digits (at most 6), rounding half away
    /// from zero. `Micros::new(1_234_567).to_decimal_string(2)` is `"1.23"`.
    pub fn to_decimal_string(self, places: u32) -> String {
        let places = places.min(6);
        let unit = 10_i64.pow(6 - places);
        let rounded = round_to_unit(self.0, unit);
        let whole = rounded / MICROS_SCALE;
        let frac = (rounded % MICROS_SCALE).abs() / unit;
        let sign = if rounded < 0 && whole == 0 { "-" } else { "" };
        if places == 0 {
            format!("{sign}{whole}")
        } else {
            format!("{sign}{whole}.{frac:0width$}", width = places as usize)
        }
    }

    /// Parse a decimal string such as `"1000"`, `"12.5"` or `"-0.25"` into
    /// micros without floating point.
    ///
    /// Rejects empty input, non-digit characters, multiple separators, and
    /// more than 6 fractional digits (which would need rounding).
    pub fn parse_decimal(s: &str) -> Result<Micros, DecimalError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DecimalError::Empty);
        }
        let invalid = || DecimalError::Invalid(s.to_string());

        let (negative, digits) = if let Some(rest) = s.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = s.strip_prefix('+') {
            (false, rest)
        } else {
            (false, s)
        };

        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(invalid());
        }
        if frac_part.len() > 6 {
            return Err(DecimalError::TooManyDecimalPlaces(s.to_string()));
        }

        let int_val: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let frac_val: i64 = format!("{frac_part:0<6}").parse().map_err(|_| invalid())?;

        let micros = int_val
            .checked_mul(MICROS_SCALE)
            .and_then(|v| v.checked_add(frac_val))
            .ok_or_else(invalid)?;

        Ok(Micros(if negative { -micros } else { micros }))
    }
}

fn round_to_unit(raw: i64, unit: i64) -> i64 {
    if unit <= 1 {
        return raw;
    }
    let mut q = raw / unit;
    let rem = raw % unit;
    if rem.abs() * 2 >= unit {
        q += raw.signum();
    }
    q.saturating_mul(unit)
}

fn i128_to_i64_clamp(x: i128) -> i64 {
    if x > i64::MAX as i128 {
        i64::MAX
    } else if x < i64::MIN as i128 {
        i64::MIN
    } else {
        x as i64
    }
}

// ---------------------------------------------------------------------------
// Parse error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    Empty,
    Invalid(String),
    TooManyDecimalPlaces(String),
}

impl fmt::Display for DecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecimalError::Empty => write!(f, "decimal amount is empty"),
            DecimalError::Invalid(raw) => write!(f, "not a decimal amount: '{raw}'"),
            DecimalError::TooManyDecimalPlaces(raw) => {
                write!(f, "more than 6 decimal places: '{raw}'")
            }
        }
    }
}

impl std::error::Error for DecimalError {}

// ---------------------------------------------------------------------------
// Arithmetic operators (closed over Micros)
// ---------------------------------------------------------------------------

impl Add for Micros {
    type Output = Micros;
    #[inline]
    fn add(self, rhs: Micros) -> Micros {
        Micros(self.0 + rhs.0)
    }
}

impl Sub for Micros {
    type Output = Micros;
    #[inline]
    fn sub(self, rhs: Micros) -> Micros {
        Micros(self.0 - rhs.0)
    }
}

impl Neg for Micros {
    type Output = Micros;
    #[inline]
    fn neg(self) -> Micros {
        Micros(-self.0)
    }
}

impl AddAssign for Micros {
    #[inline]
    fn add_assign(&mut self, rhs: Micros) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Micros {
    #[inline]
    fn sub_assign(&mut self, rhs: Micros) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string(2))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
