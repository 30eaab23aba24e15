//! Currencies and USD conversion.
//!
//! The set of currencies is closed. Conversion to USD is display-only and uses
//! the latest stored quote; a missing quote yields `None`, never zero.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payment currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar, the aggregation unit.
    Usd,
    /// Starknet token.
    Stark,
    /// Ether.
    Eth,
    /// Optimism token.
    Op,
    /// Aptos token.
    Apt,
}

/// Blockchain network a wallet address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet.
    Ethereum,
    /// Optimism.
    Optimism,
    /// Starknet.
    Starknet,
    /// Aptos.
    Aptos,
}

impl Currency {
    /// Every supported currency.
    pub const ALL: [Self; 5] = [Self::Usd, Self::Stark, Self::Eth, Self::Op, Self::Apt];

    /// Storage code (lowercase).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Stark => "stark",
            Self::Eth => "eth",
            Self::Op => "op",
            Self::Apt => "apt",
        }
    }

    /// Network whose wallet receives payments in this currency. USD has
    /// none: it is paid by bank transfer or as a stablecoin on ethereum,
    /// depending on the recipient's preference.
    #[must_use]
    pub const fn network(self) -> Option<Network> {
        match self {
            Self::Usd => None,
            Self::Eth => Some(Network::Ethereum),
            Self::Op => Some(Network::Optimism),
            Self::Stark => Some(Network::Starknet),
            Self::Apt => Some(Network::Aptos),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code().to_ascii_uppercase())
    }
}

/// Error returned when parsing an unknown currency or network code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown code: {0}")]
pub struct UnknownCode(pub String);

impl FromStr for Currency {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCode(s.to_string()))
    }
}

impl Network {
    /// Storage code (lowercase).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Optimism => "optimism",
            Self::Starknet => "starknet",
            Self::Aptos => "aptos",
        }
    }
}

impl FromStr for Network {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Ethereum, Self::Optimism, Self::Starknet, Self::Aptos]
            .into_iter()
            .find(|n| n.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCode(s.to_string()))
    }
}

/// Latest known USD price of one unit of a non-USD currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoUsdQuote {
    /// Quoted currency.
    pub currency: Currency,
    /// USD price of one unit.
    pub price: Decimal,
    /// When the quote was last refreshed.
    pub updated_at: DateTime<Utc>,
}

/// Quote lookup table. When several quotes exist for a currency the most
/// recently updated one wins.
#[derive(Debug, Clone, Default)]
pub struct Quotes {
    quotes: Vec<CryptoUsdQuote>,
}

impl Quotes {
    /// Builds a lookup table from raw quote rows.
    #[must_use]
    pub fn new(quotes: Vec<CryptoUsdQuote>) -> Self {
        Self { quotes }
    }

    /// Latest price for `currency`, if any.
    #[must_use]
    pub fn price(&self, currency: Currency) -> Option<Decimal> {
        self.quotes
            .iter()
            .filter(|q| q.currency == currency)
            .max_by_key(|q| q.updated_at)
            .map(|q| q.price)
    }

    /// Converts `amount` of `currency` into USD.
    ///
    /// USD converts to itself without a lookup. Other currencies use the
    /// latest quote and yield `None` when no quote is stored or the product
    /// leaves the [`Decimal`] range.
    #[must_use]
    pub fn to_usd(&self, amount: Decimal, currency: Currency) -> Option<Decimal> {
        match currency {
            Currency::Usd => Some(amount),
            Currency::Stark | Currency::Eth | Currency::Op | Currency::Apt => self
                .price(currency)
                .and_then(|price| price.checked_mul(amount)),
        }
    }
}

/// Sum of `values`, `None` when it leaves the [`Decimal`] range.
#[must_use]
pub fn checked_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;

    fn quote(currency: Currency, price: Decimal, age_minutes: i64) -> CryptoUsdQuote {
        CryptoUsdQuote {
            currency,
            price,
            updated_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn usd_converts_to_itself() {
        assert_eq!(Quotes::default().to_usd(dec!(100), Currency::Usd), Some(dec!(100)));
    }

    #[test]
    fn quoted_currency_multiplies_by_price() {
        let quotes = Quotes::new(vec![quote(Currency::Eth, dec!(1500), 0)]);
        assert_eq!(quotes.to_usd(dec!(100), Currency::Eth), Some(dec!(150000)));
    }

    #[test]
    fn missing_quote_is_none_not_zero() {
        let quotes = Quotes::new(vec![quote(Currency::Eth, dec!(1500), 0)]);
        assert_eq!(quotes.to_usd(dec!(100), Currency::Stark), None);
    }

    #[test]
    fn latest_quote_wins() {
        let quotes = Quotes::new(vec![
            quote(Currency::Op, dec!(1.2), 60),
            quote(Currency::Op, dec!(1.5), 1),
        ]);
        assert_eq!(quotes.to_usd(dec!(10), Currency::Op), Some(dec!(15.0)));
    }

    #[test]
    fn decimal_arithmetic_keeps_cents() {
        let quotes = Quotes::new(vec![quote(Currency::Apt, dec!(0.1), 0)]);
        assert_eq!(quotes.to_usd(dec!(3), Currency::Apt), Some(dec!(0.3)));
    }

    #[test]
    fn oversized_conversion_is_none() {
        let quotes = Quotes::new(vec![quote(Currency::Eth, dec!(1500), 0)]);
        assert_eq!(quotes.to_usd(Decimal::MAX, Currency::Eth), None);
        assert_eq!(quotes.to_usd(Decimal::MAX, Currency::Usd), Some(Decimal::MAX));
    }

    #[test]
    fn sums_are_checked() {
        assert_eq!(checked_sum([dec!(1.5), dec!(2)]), Some(dec!(3.5)));
        assert_eq!(checked_sum(Vec::new()), Some(Decimal::ZERO));
        assert_eq!(checked_sum([Decimal::MAX, dec!(1)]), None);
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("eth".parse::<Currency>(), Ok(Currency::Eth));
        assert_eq!("STARK".parse::<Currency>(), Ok(Currency::Stark));
        assert!("btc".parse::<Currency>().is_err());
        assert_eq!("optimism".parse::<Network>(), Ok(Network::Optimism));
    }

    #[test]
    fn boundary_codes_are_uppercase() {
        let json = serde_json::to_string(&Currency::Apt).unwrap_or_default();
        assert_eq!(json, "\"APT\"");
        assert_eq!(Currency::Stark.to_string(), "STARK");
    }
}
