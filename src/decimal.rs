//! Fixed-point decimal primitives: `Price`, `Size`, and `Money`.
//!
//! All financial quantities are signed 64-bit integers with a fixed scale:
//!
//! - [`Price`] and [`Size`] carry two decimal places (`Price(15025)` = 150.25)
//! - [`Money`] carries four, so a 2 dp price times a 2 dp size is exact
//!
//! Addition, subtraction, and multiplication are exact; the only division in
//! the system is the position-VWAP quotient, carried at scale 4 and rounded
//! half-even. Any result whose magnitude exceeds [`MAX_RAW`] raw units fails
//! with [`DecimalError::Overflow`] instead of truncating.

use std::fmt;
use std::str::FromStr;

use crate::error::DecimalError;

/// Magnitude bound for every fixed-point raw value: 10^15.
pub const MAX_RAW: i64 = 1_000_000_000_000_000;

/// Scale factor between [`Price`]/[`Size`] (2 dp) and [`Money`] (4 dp).
const CENT_FACTOR: i64 = 100;

/// A price in hundredths (two decimal places).
///
/// `Price(15025)` represents 150.25. Limit prices are strictly positive;
/// [`Price::ZERO`] is the market-order placeholder and never rests in a book.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Price(pub i64);

/// An order or trade size in hundredths (two decimal places).
///
/// Sizes on orders are strictly positive; position quantities reuse the same
/// representation and may be negative (short).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size(pub i64);

/// A monetary value in ten-thousandths (four decimal places).
///
/// Products of prices and sizes land here exactly. Cash and buying-power
/// movements are rounded half-even to whole cents via [`Money::round_cents`]
/// before they are applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Money(pub i64);

/// Bound-check a raw value against [`MAX_RAW`].
#[inline]
fn bounded(raw: i128) -> Result<i64, DecimalError> {
    if raw.unsigned_abs() > MAX_RAW as u128 {
        return Err(DecimalError::Overflow);
    }
    Ok(raw as i64)
}

/// Divide `n / d` (d > 0) rounding half to even.
fn div_half_even(n: i128, d: i128) -> i128 {
    debug_assert!(d > 0, "divisor must be positive, got {d}");
    let neg = n < 0;
    let n = n.unsigned_abs();
    let d = d.unsigned_abs();
    let q = n / d;
    let r = n % d;
    let q = match (r * 2).cmp(&d) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q & 1), // tie: round to even
    };
    if neg { -(q as i128) } else { q as i128 }
}

/// Parse a plain decimal literal (e.g. "150.25") into a raw value at `scale`.
fn parse_fixed(s: &str, scale: u32) -> Result<i64, DecimalError> {
    let bad = || DecimalError::Parse(s.to_string());
    let trimmed = s.trim();
    let (neg, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(bad());
    }
    if frac_part.len() > scale as usize {
        return Err(bad());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(bad());
    }
    let int_val: i128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| bad())?
    };
    let frac_val: i128 = if frac_part.is_empty() {
        0
    } else {
        frac_part.parse().map_err(|_| bad())?
    };
    let frac_scaled = frac_val * 10i128.pow(scale - frac_part.len() as u32);
    let raw = int_val * 10i128.pow(scale) + frac_scaled;
    bounded(if neg { -raw } else { raw })
}

/// Format a raw value at `scale` as a plain decimal string.
fn format_fixed(f: &mut fmt::Formatter<'_>, raw: i64, scale: u32) -> fmt::Result {
    let factor = 10i64.pow(scale);
    let sign = if raw < 0 { "-" } else { "" };
    let units = (raw / factor).abs();
    let frac = (raw % factor).abs();
    write!(f, "{sign}{units}.{frac:0width$}", width = scale as usize)
}

impl Price {
    pub const ZERO: Price = Price(0);

    /// Notional value of `size` at this price. Exact: 2 dp × 2 dp = 4 dp.
    pub fn checked_mul(self, size: Size) -> Result<Money, DecimalError> {
        bounded(self.0 as i128 * size.0 as i128).map(Money)
    }

    /// Widen to [`Money`] scale.
    pub fn to_money(self) -> Result<Money, DecimalError> {
        bounded(self.0 as i128 * CENT_FACTOR as i128).map(Money)
    }
}

impl Size {
    pub const ZERO: Size = Size(0);

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Absolute value.
    #[inline]
    pub fn abs(self) -> Size {
        Size(self.0.abs())
    }

    pub fn checked_add(self, rhs: Size) -> Result<Size, DecimalError> {
        bounded(self.0 as i128 + rhs.0 as i128).map(Size)
    }

    pub fn checked_sub(self, rhs: Size) -> Result<Size, DecimalError> {
        bounded(self.0 as i128 - rhs.0 as i128).map(Size)
    }
}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn checked_add(self, rhs: Money) -> Result<Money, DecimalError> {
        bounded(self.0 as i128 + rhs.0 as i128).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Result<Money, DecimalError> {
        bounded(self.0 as i128 - rhs.0 as i128).map(Money)
    }

    /// Round half-even to whole cents (the persistence rule for cash and
    /// buying-power movements). The result is still at scale 4.
    pub fn round_cents(self) -> Money {
        Money(div_half_even(self.0 as i128, CENT_FACTOR as i128) as i64 * CENT_FACTOR)
    }

    /// Scale a money value by a size (cost-basis arithmetic), half-even
    /// back to scale 4.
    pub fn checked_mul_size(self, size: Size) -> Result<Money, DecimalError> {
        let product = self.0 as i128 * size.0 as i128; // scale 6
        let neg = product < 0;
        let q = div_half_even(product.abs(), CENT_FACTOR as i128);
        bounded(if neg { -q } else { q }).map(Money)
    }

    /// VWAP quotient: divide by a non-zero size, half-even at scale 4.
    pub fn div_size(self, size: Size) -> Result<Money, DecimalError> {
        if size.0 == 0 {
            return Err(DecimalError::DivideByZero);
        }
        let scaled = self.0 as i128 * CENT_FACTOR as i128;
        let q = div_half_even(scaled.abs(), size.0.unsigned_abs() as i128);
        let neg = (self.0 < 0) != (size.0 < 0);
        bounded(if neg { -q } else { q }).map(Money)
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl FromStr for Price {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, 2).map(Price)
    }
}

impl FromStr for Size {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, 2).map(Size)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_fixed(f, self.0, 2)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_fixed(f, self.0, 2)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_fixed(f, self.0, 4)
    }
}
