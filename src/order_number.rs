//! Luhn-checksummed order numbers
//!
//! Order numbers are unsigned integers whose rightmost digit is a Luhn
//! check digit. Both accrual uploads and withdrawals reference orders by
//! this number, so parsing and validation live in one place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("order number must be a non-empty string of decimal digits")]
    NotDigits,

    #[error("order number does not fit into 64 bits")]
    Overflow,

    #[error("order number fails the Luhn checksum")]
    Checksum,
}

/// Purchase order number (Luhn-valid u64 once parsed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderNumber(u64);

impl OrderNumber {
    /// Wrap a raw number without validating the checksum.
    pub const fn new_unchecked(number: u64) -> Self {
        Self(number)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Luhn check: the check digit plus the adjusted remaining digits
    /// must sum to a multiple of ten.
    pub fn is_valid(self) -> bool {
        (self.0 % 10 + luhn_checksum(self.0 / 10)) % 10 == 0
    }

    /// Parse decimal text and verify the checksum.
    pub fn parse(text: &str) -> Result<Self, OrderNumberError> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::NotDigits);
        }
        let number: u64 = text.parse().map_err(|_| OrderNumberError::Overflow)?;
        let number = OrderNumber(number);
        if !number.is_valid() {
            return Err(OrderNumberError::Checksum);
        }
        Ok(number)
    }
}

/// Sum of the payload digits, doubling every digit at an even position
/// counted from the right (0-indexed) and folding results above 9.
fn luhn_checksum(mut number: u64) -> u64 {
    let mut sum = 0;
    let mut position = 0;
    while number > 0 {
        let mut digit = number % 10;
        if position % 2 == 0 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        number /= 10;
        position += 1;
    }
    sum % 10
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderNumber::parse(s)
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serialized as a JSON string, matching the wire format for orders.
impl Serialize for OrderNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        OrderNumber::parse(&text).map_err(serde::de::Error::custom)
    }
}
