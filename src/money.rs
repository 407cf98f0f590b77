//! Money Conversion Module
//!
//! Loyalty points are a single fixed-point currency stored as an integer
//! count of minor units (1/100 of a point). All conversions between the
//! client-facing decimal form and the internal integer MUST go through
//! [`Currency`].
//!
//! ## Internal Representation
//! - Amounts are `i64` minor units (BIGINT in PostgreSQL)
//! - Decimal input rounds half-up: `(value * 100 + 0.5)` then truncation
//!
//! ## Rendering
//! A whole number of points renders without decimals (`"5"`), anything
//! else with exactly two (`"2.50"`). Clients have been built against this
//! asymmetry, so it is kept as-is.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Minor units in one point
pub const MINOR_PER_MAJOR: i64 = 100;

/// Fixed-point loyalty currency (minor units)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency(i64);

impl Currency {
    pub const ZERO: Currency = Currency(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Convert a decimal amount to minor units, rounding half-up
    pub fn from_f64(value: f64) -> Self {
        Self((value * MINOR_PER_MAJOR as f64 + 0.5) as i64)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    /// True when the amount is a whole number of points
    pub fn is_whole(self) -> bool {
        self.0 % MINOR_PER_MAJOR == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Currency) -> Option<Currency> {
        self.0.checked_add(rhs.0).map(Currency)
    }

    pub fn checked_sub(self, rhs: Currency) -> Option<Currency> {
        self.0.checked_sub(rhs.0).map(Currency)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{:.0}", self.to_f64())
        } else {
            write!(f, "{:.2}", self.to_f64())
        }
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_whole() {
            serializer.serialize_i64(self.0 / MINOR_PER_MAJOR)
        } else {
            serializer.serialize_f64(self.to_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Currency::from_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_rounds_half_up() {
        assert_eq!(Currency::from_f64(2.5).minor(), 250);
        assert_eq!(Currency::from_f64(729.98).minor(), 72998);
        assert_eq!(Currency::from_f64(0.005).minor(), 1);
        assert_eq!(Currency::from_f64(0.004).minor(), 0);
        assert_eq!(Currency::from_f64(1.15).minor(), 115);
    }

    #[test]
    fn test_round_trip_minor_units() {
        for minor in (0..20_000).chain([123_456_789, 9_007_199_254_740]) {
            let c = Currency::from_minor(minor);
            assert_eq!(Currency::from_f64(c.to_f64()), c, "minor={minor}");
        }
    }

    #[test]
    fn test_display_two_decimals_when_fractional() {
        assert_eq!(Currency::from_minor(250).to_string(), "2.50");
        assert_eq!(Currency::from_minor(1).to_string(), "0.01");
        assert_eq!(Currency::from_minor(72998).to_string(), "729.98");
    }

    /// Pinned quirk: whole amounts render with no decimals at all.
    #[test]
    fn test_display_no_decimals_when_whole() {
        assert_eq!(Currency::from_minor(200).to_string(), "2");
        assert_eq!(Currency::from_minor(0).to_string(), "0");
        assert_eq!(Currency::from_minor(50_000).to_string(), "500");
    }

    #[test]
    fn test_json_encoding() {
        assert_eq!(serde_json::to_string(&Currency::from_minor(500)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Currency::from_minor(250)).unwrap(), "2.5");
        assert_eq!(serde_json::to_string(&Currency::from_minor(1)).unwrap(), "0.01");
    }

    #[test]
    fn test_json_decoding() {
        let c: Currency = serde_json::from_str("751").unwrap();
        assert_eq!(c.minor(), 75100);
        let c: Currency = serde_json::from_str("2.5").unwrap();
        assert_eq!(c.minor(), 250);
        assert!(serde_json::from_str::<Currency>("\"3\"").is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Currency::from_minor(500);
        let b = Currency::from_minor(300);
        assert_eq!(a.checked_sub(b), Some(Currency::from_minor(200)));
        assert_eq!(a.checked_add(b), Some(Currency::from_minor(800)));
        assert_eq!(Currency::from_minor(i64::MAX).checked_add(b), None);
    }
}
