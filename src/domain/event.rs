//! Token Events
//!
//! The normalized record for one observed token creation. Identity is the
//! address; everything else is descriptive and never changes after decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base URL for a token page on pump.fun
pub const PUMP_FUN_TOKEN_URL: &str = "https://www.pump.fun/token/";

/// Build the pump.fun page URL for a mint or contract address
pub fn token_url(address: &str) -> String {
    format!("{}{}", PUMP_FUN_TOKEN_URL, address)
}

/// A token-creation event observed on the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEvent {
    address: String,
    name: String,
    timestamp: DateTime<Utc>,
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    market_cap_sol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sol_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initial_buy: Option<f64>,
}

impl TokenEvent {
    /// Create an event with the required fields; the url is derived from the address
    pub fn new(address: impl Into<String>, name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let address = address.into();
        let url = token_url(&address);
        Self {
            address,
            name: name.into(),
            timestamp,
            url,
            symbol: None,
            market_cap_sol: None,
            sol_amount: None,
            initial_buy: None,
        }
    }

    /// Override the derived url
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Attach a ticker symbol; empty symbols are dropped
    pub fn with_symbol(mut self, symbol: Option<String>) -> Self {
        self.symbol = symbol.filter(|s| !s.trim().is_empty());
        self
    }

    /// Attach the optional market fields reported with a create transaction
    pub fn with_market(
        mut self,
        market_cap_sol: Option<f64>,
        sol_amount: Option<f64>,
        initial_buy: Option<f64>,
    ) -> Self {
        self.market_cap_sol = market_cap_sol;
        self.sol_amount = sol_amount;
        self.initial_buy = initial_buy;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn market_cap_sol(&self) -> Option<f64> {
        self.market_cap_sol
    }

    pub fn sol_amount(&self) -> Option<f64> {
        self.sol_amount
    }

    pub fn initial_buy(&self) -> Option<f64> {
        self.initial_buy
    }

    /// One-line description used by alerts and logs
    pub fn summary(&self) -> String {
        match self.symbol() {
            Some(symbol) => format!("{} ({}) - {}", self.name, symbol, self.address),
            None => format!("{} - {}", self.name, self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_derived_from_address() {
        let event = TokenEvent::new("Mint111", "Test Token", Utc::now());
        assert_eq!(event.url(), "https://www.pump.fun/token/Mint111");
        assert_eq!(event.address(), "Mint111");
    }

    #[test]
    fn test_empty_symbol_dropped() {
        let event = TokenEvent::new("a", "b", Utc::now()).with_symbol(Some("  ".to_string()));
        assert_eq!(event.symbol(), None);

        let event = TokenEvent::new("a", "b", Utc::now()).with_symbol(Some("MEME".to_string()));
        assert_eq!(event.symbol(), Some("MEME"));
    }

    #[test]
    fn test_summary() {
        let event = TokenEvent::new("Mint1", "Doge Killer", Utc::now())
            .with_symbol(Some("DK".to_string()));
        assert_eq!(event.summary(), "Doge Killer (DK) - Mint1");

        let event = TokenEvent::new("Mint2", "NoSym", Utc::now());
        assert_eq!(event.summary(), "NoSym - Mint2");
    }

    #[test]
    fn test_serializes_camel_case() {
        let event = TokenEvent::new("Mint1", "Foo", Utc::now()).with_market(Some(30.5), None, None);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"marketCapSol\":30.5"));
        assert!(!json.contains("solAmount"));
    }
}
