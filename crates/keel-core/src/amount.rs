//! Scaled fixed-point arithmetic for monetary values.
//!
//! Every price, quantity and balance in the system is an [`Amount`]: a
//! signed 64-bit integer carrying 8 fractional decimal digits. All
//! arithmetic happens in scaled-integer space with 128-bit intermediates;
//! floating point only appears at the explicit lossy boundaries
//! ([`Amount::to_decimal`] / [`Amount::from_decimal`]).

use crate::error::CoreError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Scale factor: 10^8. One whole unit is `SCALE` scaled units.
pub const SCALE: i64 = 100_000_000;

/// A monetary value or quantity with 8 decimal digits of precision.
///
/// `Amount` is a plain scaled integer. Addition and subtraction are exact;
/// [`multiply`](Amount::multiply) truncates toward zero and
/// [`divide`](Amount::divide) rounds half away from zero. The asymmetry is
/// deliberate: notional values (price * quantity) must never overstate what
/// an order commits, while quantities (notional / price) must not lose a
/// half-unit on every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// The smallest representable increment: one scaled unit. Used as the
    /// price step when outbidding or undercutting the book.
    pub const MINIMAL_UNIT: Self = Self(1);

    /// Construct from a raw scaled integer.
    #[inline]
    pub const fn from_scaled(value: i64) -> Self {
        Self(value)
    }

    /// The raw scaled integer.
    #[inline]
    pub const fn scaled(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Lossy conversion to a floating-point decimal.
    ///
    /// Boundary use only: human-readable output and metric gauges. Never
    /// feed the result back into monetary arithmetic.
    #[inline]
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Lossy conversion from a floating-point decimal, truncating any
    /// precision beyond 8 fractional digits.
    #[inline]
    pub fn from_decimal(dec: f64) -> Self {
        Self((dec * SCALE as f64) as i64)
    }

    /// Exact conversion from a `Decimal`, as parsed off the exchange wire.
    ///
    /// Digits beyond the 8th fractional place round half away from zero.
    pub fn try_from_decimal(dec: Decimal) -> Result<Self, CoreError> {
        let scaled = (dec * Decimal::from(SCALE))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        scaled
            .to_i64()
            .map(Self)
            .ok_or_else(|| CoreError::AmountOutOfRange(dec.to_string()))
    }

    /// Exact conversion to a `Decimal` for wire serialization.
    pub fn as_decimal(self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), 8)
    }

    /// Product of two amounts: `(a * b) / SCALE`, truncated toward zero.
    ///
    /// This is the price * quantity = notional operation.
    #[must_use]
    pub fn multiply(self, rhs: Amount) -> Amount {
        let product = i128::from(self.0) * i128::from(rhs.0);
        Amount((product / i128::from(SCALE)) as i64)
    }

    /// Quotient of two amounts: `(a * SCALE) / b`, rounded half away from
    /// zero.
    ///
    /// This is the notional / price = quantity operation. A zero divisor is
    /// an error, never a silent infinity.
    pub fn divide(self, rhs: Amount) -> Result<Amount, CoreError> {
        if rhs.0 == 0 {
            return Err(CoreError::DivisionByZero);
        }
        let numer = i128::from(self.0) * i128::from(SCALE);
        let denom = i128::from(rhs.0);
        Ok(Amount(div_round_half_up(numer, denom) as i64))
    }
}

/// Integer division rounding half away from zero.
fn div_round_half_up(numer: i128, denom: i128) -> i128 {
    let negative = (numer < 0) != (denom < 0);
    let n = numer.abs();
    let d = denom.abs();
    let q = (n + d / 2) / d;
    if negative {
        -q
    } else {
        q
    }
}

impl fmt::Display for Amount {
    /// Fixed 8-fractional-digit rendering, e.g. `0.00012500`. This is the
    /// exact format the exchange expects in order payloads.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = SCALE as u64;
        write!(f, "{sign}{}.{:08}", abs / scale, abs % scale)
    }
}

impl FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dec: Decimal = s.trim().parse()?;
        Self::try_from_decimal(dec)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_decimal() {
        let ca = Amount::from_decimal(0.347234);
        assert_eq!(ca.scaled(), 34_723_400);
    }

    #[test]
    fn test_to_decimal() {
        let ca = Amount::from_scaled(297_349_782);
        assert_eq!(ca.to_decimal(), 2.97349782);
    }

    #[test]
    fn test_multiply_truncates() {
        let a = Amount::from_scaled(297_349_782);
        let b = Amount::from_scaled(874_301_822);
        assert_eq!(a.multiply(b), Amount::from_scaled(2_599_734_561));
    }

    #[test]
    fn test_divide_rounds_half_up() {
        let a = Amount::from_scaled(297_349_782);
        let b = Amount::from_scaled(874_301_822);
        assert_eq!(a.divide(b).unwrap(), Amount::from_scaled(34_009_969));
    }

    #[test]
    fn test_divide_tie_rounds_up() {
        let a = Amount::from_scaled(500_000_000);
        let b = Amount::from_scaled(300_000_000);
        assert_eq!(a.divide(b).unwrap(), Amount::from_scaled(166_666_667));
    }

    #[test]
    fn test_divide_by_zero_is_error() {
        let a = Amount::from_scaled(1);
        assert!(matches!(
            a.divide(Amount::ZERO),
            Err(CoreError::DivisionByZero)
        ));
    }

    #[test]
    fn test_divide_negative_rounds_away_from_zero() {
        let a = Amount::from_scaled(-500_000_000);
        let b = Amount::from_scaled(300_000_000);
        assert_eq!(a.divide(b).unwrap(), Amount::from_scaled(-166_666_667));
    }

    #[test]
    fn test_display_fixed_width() {
        assert_eq!(Amount::from_scaled(125_000).to_string(), "0.00125000");
        assert_eq!(
            Amount::from_scaled(2_599_734_561).to_string(),
            "25.99734561"
        );
        assert_eq!(Amount::from_scaled(-1).to_string(), "-0.00000001");
    }

    #[test]
    fn test_try_from_decimal_rounds_ninth_digit() {
        assert_eq!(
            Amount::try_from_decimal(dec!(0.34723400)).unwrap(),
            Amount::from_scaled(34_723_400)
        );
        // The ninth fractional digit rounds half away from zero.
        assert_eq!(
            Amount::try_from_decimal(dec!(0.123456789)).unwrap(),
            Amount::from_scaled(12_345_679)
        );
        assert_eq!(
            Amount::try_from_decimal(dec!(-0.123456785)).unwrap(),
            Amount::from_scaled(-12_345_679)
        );
    }

    #[test]
    fn test_wire_string_round_trip() {
        let parsed: Amount = "0.00125000".parse().unwrap();
        assert_eq!(parsed, Amount::from_scaled(125_000));
        assert_eq!(parsed.to_string().parse::<Amount>().unwrap(), parsed);
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let amount = Amount::from_scaled(34_723_400);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"0.34723400\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn test_minimal_unit_steps() {
        let price = Amount::from_scaled(100);
        assert_eq!(price + Amount::MINIMAL_UNIT, Amount::from_scaled(101));
        assert_eq!(price - Amount::MINIMAL_UNIT, Amount::from_scaled(99));
    }
}
