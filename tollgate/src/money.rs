//! Human-readable money amounts for route prices.
//!
//! Route prices are written the way a person would quote them: `"$0.001"`,
//! `"0.01 USD"`, `"€20"`. [`MoneyAmount`] parses that decoration into a
//! decimal amount plus an ISO-ish currency code and prints it back in the
//! same style, so the strings advertised in a challenge match what was
//! registered. Conversion into on-chain token units is the facilitator's
//! concern, not this crate's.

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d.\-]+").expect("valid pattern"));

mod bounds {
    use super::{Decimal, FromStr, LazyLock};

    pub const MIN_STR: &str = "0.000000001";
    pub const MAX_STR: &str = "999999999";

    pub static MIN: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MIN_STR).expect("valid decimal"));
    pub static MAX: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));
}

/// A positive monetary amount with its currency code.
///
/// # Serialization
///
/// Serializes to/from the human-readable string form: `"$0.001"` for USD,
/// `"20 EUR"` for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyAmount {
    amount: Decimal,
    currency: String,
}

/// Error returned when a money string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyAmountParseError {
    /// The numeric part is not a valid decimal.
    #[error("invalid money format")]
    InvalidFormat,
    /// The amount lies outside the supported magnitude range.
    #[error("amount must be between {min} and {max}", min = bounds::MIN_STR, max = bounds::MAX_STR)]
    OutOfRange,
    /// Negative amounts are not payable.
    #[error("negative amount is not allowed")]
    Negative,
}

impl MoneyAmount {
    /// Parses a decorated money string.
    ///
    /// A leading `$`, `€` or `£` selects the currency; a trailing
    /// whitespace-separated alphabetic code (`"0.01 USD"`) does the same.
    /// Undecorated numbers default to USD. Digit grouping (`"1,000"`) is
    /// tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyAmountParseError`] when the numeric part does not
    /// parse, is negative, or falls outside the supported range.
    pub fn parse(input: &str) -> Result<Self, MoneyAmountParseError> {
        let trimmed = input.trim();
        let currency = detect_currency(trimmed);

        let cleaned = DECORATION.replace_all(trimmed, "");
        let amount =
            Decimal::from_str(&cleaned).map_err(|_| MoneyAmountParseError::InvalidFormat)?;

        if amount.is_sign_negative() {
            return Err(MoneyAmountParseError::Negative);
        }
        if amount < *bounds::MIN || amount > *bounds::MAX {
            return Err(MoneyAmountParseError::OutOfRange);
        }

        Ok(Self {
            amount: amount.normalize(),
            currency,
        })
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency code (e.g. `USD`).
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }
}

fn detect_currency(input: &str) -> String {
    match input.chars().next() {
        Some('$') => return "USD".to_owned(),
        Some('€') => return "EUR".to_owned(),
        Some('£') => return "GBP".to_owned(),
        _ => {}
    }
    input
        .rsplit(char::is_whitespace)
        .next()
        .filter(|tail| !tail.is_empty() && tail.chars().all(|c| c.is_ascii_alphabetic()))
        .map_or_else(|| "USD".to_owned(), str::to_uppercase)
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.currency == "USD" {
            write!(f, "${}", self.amount)
        } else {
            write!(f, "{} {}", self.amount, self.currency)
        }
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for MoneyAmount {
    type Error = MoneyAmountParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for MoneyAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MoneyAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}
