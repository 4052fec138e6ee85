//! Pair Records
//!
//! A discovered trading pair and the prices collected for its two legs.

use rust_decimal::Decimal;

/// Display identity of one token contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    /// ERC-20 `name()`
    pub name: String,
    /// ERC-20 `symbol()`
    pub symbol: String,
    /// Contract address
    pub address: String,
}

impl TokenIdentity {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            address: address.into(),
        }
    }
}

/// Raw pair-created log entry as delivered by the event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairCreatedEvent {
    pub token0: String,
    pub token1: String,
    /// Hash of the transaction that deployed the pair
    pub tx_hash: String,
}

impl PairCreatedEvent {
    /// True when either leg is the given reference token.
    ///
    /// Addresses are compared case-insensitively so checksummed and
    /// lowercase hex forms match.
    pub fn involves(&self, reference: &str) -> bool {
        self.token0.eq_ignore_ascii_case(reference) || self.token1.eq_ignore_ascii_case(reference)
    }
}

/// Both leg prices of a pair, always set together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairPrices {
    pub price0: Decimal,
    pub price1: Decimal,
}

/// One discovered pair awaiting (or holding) price data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecord {
    token0: TokenIdentity,
    token1: TokenIdentity,
    tx_hash: String,
    prices: Option<PairPrices>,
}

impl PairRecord {
    /// Create an un-priced record
    pub fn new(token0: TokenIdentity, token1: TokenIdentity, tx_hash: impl Into<String>) -> Self {
        Self {
            token0,
            token1,
            tx_hash: tx_hash.into(),
            prices: None,
        }
    }

    pub fn token0(&self) -> &TokenIdentity {
        &self.token0
    }

    pub fn token1(&self) -> &TokenIdentity {
        &self.token1
    }

    pub fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    pub fn prices(&self) -> Option<PairPrices> {
        self.prices
    }

    pub fn price0(&self) -> Option<Decimal> {
        self.prices.map(|p| p.price0)
    }

    pub fn price1(&self) -> Option<Decimal> {
        self.prices.map(|p| p.price1)
    }

    pub fn is_priced(&self) -> bool {
        self.prices.is_some()
    }

    /// Consume the record and attach both leg prices at once
    pub fn into_priced(mut self, price0: Decimal, price1: Decimal) -> Self {
        self.prices = Some(PairPrices { price0, price1 });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_record() -> PairRecord {
        PairRecord::new(
            TokenIdentity::new("Foo", "FOO", "0xAaAa000000000000000000000000000000000001"),
            TokenIdentity::new("Wrapped BNB", "WBNB", "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
            "0xdeadbeef",
        )
    }

    #[test]
    fn test_new_record_is_unpriced() {
        let record = sample_record();
        assert!(!record.is_priced());
        assert_eq!(record.price0(), None);
        assert_eq!(record.price1(), None);
    }

    #[test]
    fn test_into_priced_sets_both_legs() {
        let record = sample_record().into_priced(dec!(0.5), dec!(600));
        assert!(record.is_priced());
        assert_eq!(record.price0(), Some(dec!(0.5)));
        assert_eq!(record.price1(), Some(dec!(600)));
        assert_eq!(record.token0().symbol, "FOO");
        assert_eq!(record.tx_hash(), "0xdeadbeef");
    }

    #[test]
    fn test_zero_price_is_still_priced() {
        let record = sample_record().into_priced(Decimal::ZERO, dec!(1));
        assert!(record.is_priced());
        assert_eq!(record.price0(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_event_involves_reference_case_insensitive() {
        let event = PairCreatedEvent {
            token0: "0xAaAa000000000000000000000000000000000001".to_string(),
            token1: "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c".to_string(),
            tx_hash: "0x01".to_string(),
        };

        assert!(event.involves("0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c"));
        assert!(event.involves("0xaaaa000000000000000000000000000000000001"));
        assert!(!event.involves("0x55d398326f99059fF775485246999027B3197955"));
    }
}
