//! Type-safe price representation using decimal arithmetic.
//!
//! The backend reports money as a decimal string plus an ISO 4217 code.
//! Prices are parsed once at the backend boundary and formatted at display
//! time; no currency conversion happens here.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a price from backend data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),
    #[error("invalid currency code {0:?}")]
    InvalidCurrency(String),
}

/// A price with currency information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: String) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub fn zero(currency_code: &str) -> Self {
        Self::new(Decimal::ZERO, currency_code.to_string())
    }

    /// Parse a backend money pair (`"19.99"`, `"USD"`).
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the amount is not a decimal or the currency
    /// code is not three ASCII letters.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| PriceError::InvalidAmount(amount.to_string()))?;

        if currency_code.len() != 3 || !currency_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PriceError::InvalidCurrency(currency_code.to_string()));
        }

        Ok(Self::new(amount, currency_code.to_ascii_uppercase()))
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code.clone())
    }

    /// Currency symbol for the common storefront currencies.
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        match self.currency_code.as_str() {
            "USD" | "CAD" | "AUD" | "NZD" => Some("$"),
            "EUR" => Some("€"),
            "GBP" => Some("£"),
            "JPY" => Some("¥"),
            _ => None,
        }
    }

    /// Format for display (e.g., "$19.99", "19.99 CHF").
    #[must_use]
    pub fn display(&self) -> String {
        let amount = self.amount.round_dp(2);
        self.symbol().map_or_else(
            || format!("{amount:.2} {}", self.currency_code),
            |symbol| format!("{symbol}{amount:.2}"),
        )
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}
