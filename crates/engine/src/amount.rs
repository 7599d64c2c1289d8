use std::{fmt, str::FromStr};

use crate::EngineError;

/// Positive expense amount in the currency's major unit.
///
/// Amounts are stored the way the user typed them (a floating point value,
/// as the spreadsheet keeps them), but the type guarantees the value is
/// finite and strictly positive.
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let amount: Amount = " 25000 ".parse().unwrap();
/// assert_eq!(amount.value(), 25000.0);
/// assert_eq!(amount.to_string(), "25000");
///
/// assert!("abc".parse::<Amount>().is_err());
/// assert!("0".parse::<Amount>().is_err());
/// assert!("-12.5".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    /// Creates an amount, rejecting zero, negative and non-finite values.
    pub fn new(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(EngineError::InvalidAmount(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    /// Parses user input as a floating point number after trimming spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| EngineError::InvalidAmount(trimmed.to_string()))?;
        Self::new(value).map_err(|_| EngineError::InvalidAmount(trimmed.to_string()))
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

/// Formats a money value rounded to whole units with thousands separators,
/// e.g. `Rp25,000`.
#[must_use]
pub fn format_money(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (idx, digit) in rounded.chars().enumerate() {
        if idx > 0 && (rounded.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && rounded != "0" { "-" } else { "" };
    format!("{sign}Rp{grouped}")
}
