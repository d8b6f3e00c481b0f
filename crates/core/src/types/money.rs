//! Currencies and money arithmetic.
//!
//! Amounts are `rust_decimal::Decimal` in the currency's standard unit
//! (dollars, zloty, euro), stored as `NUMERIC(12,2)`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Error returned when a currency code is not supported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported currency: {0} (expected USD, PLN or EUR)")]
pub struct CurrencyError(pub String);

/// Currencies a product can be priced in.
///
/// Every product carries one price per currency; an order is placed in a
/// single currency and snapshots the matching price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "currency_code", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Pln,
    Eur,
}

impl Currency {
    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Pln => "PLN",
            Self::Eur => "EUR",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "PLN" => Ok(Self::Pln),
            "EUR" => Ok(Self::Eur),
            _ => Err(CurrencyError(s.to_owned())),
        }
    }
}

/// Round an amount to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_serde_uses_iso_codes() {
        assert_eq!(serde_json::to_string(&Currency::Pln).unwrap(), "\"PLN\"");
        let parsed: Currency = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(parsed, Currency::Eur);
        assert!(serde_json::from_str::<Currency>("\"GBP\"").is_err());
    }

    #[test]
    fn test_currency_from_str_is_case_insensitive() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" Pln ".parse::<Currency>().unwrap(), Currency::Pln);
        assert!("JPY".parse::<Currency>().is_err());
    }

    #[test]
    fn test_currency_default_is_usd() {
        assert_eq!(Currency::default(), Currency::Usd);
        assert_eq!(Currency::default().to_string(), "USD");
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(12_345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_money(Decimal::new(12_344, 3)), Decimal::new(1234, 2));
        assert_eq!(round_money(Decimal::new(10, 0)), Decimal::new(10, 0));
    }
}
