//! Pump.fun Wire Types
//!
//! Data types for pump.fun WebSocket messages. Inbound payloads come in two
//! shapes: the current create-transaction message and the legacy
//! `newToken` notice.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Subscription method for token launches
pub const SUBSCRIBE_NEW_TOKEN: &str = "subscribeNewToken";

/// `txType` value of a token creation
pub const TX_TYPE_CREATE: &str = "create";

/// `type` value of the legacy token notice
pub const LEGACY_NEW_TOKEN: &str = "newToken";

/// Accept a number or a numeric string; anything else becomes `None`
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Accept a string or a number rendered as text; anything else becomes `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Token creation message (current schema)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessage {
    /// Token name
    pub name: String,
    /// Transaction kind, `"create"` for launches
    pub tx_type: String,
    /// Token mint address
    #[serde(default, deserialize_with = "lenient_string")]
    pub mint: Option<String>,
    /// Transaction signature, identity fallback when the mint is missing
    #[serde(default, deserialize_with = "lenient_string")]
    pub signature: Option<String>,
    /// Token symbol
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
    /// Market cap in SOL at creation
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap_sol: Option<f64>,
    /// SOL spent by the creator's initial buy
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sol_amount: Option<f64>,
    /// Tokens received by the creator's initial buy
    #[serde(default, deserialize_with = "lenient_f64")]
    pub initial_buy: Option<f64>,
}

impl CreateMessage {
    /// Mint if present and non-empty, otherwise the signature
    pub fn identity(&self) -> Option<&str> {
        non_empty(self.mint.as_deref()).or_else(|| non_empty(self.signature.as_deref()))
    }
}

/// Legacy token notice
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyTokenMessage {
    /// Discriminant, `"newToken"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Contract address
    #[serde(default, deserialize_with = "lenient_string")]
    pub ca: Option<String>,
    /// Token name
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// ISO-8601 creation time
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    /// Token symbol
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
}

impl LegacyTokenMessage {
    pub fn identity(&self) -> Option<&str> {
        non_empty(self.ca.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Inbound message after schema discrimination
#[derive(Debug, Clone)]
pub enum FeedMessage {
    Create(CreateMessage),
    LegacyNewToken(LegacyTokenMessage),
}

/// WebSocket subscription message
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeMessage {
    /// Method to call
    pub method: String,
    /// Optional keys (e.g., mint addresses or account addresses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

impl SubscribeMessage {
    /// Arbitrary subscription; empty `keys` are left off the wire
    pub fn new(method: impl Into<String>, keys: Option<Vec<String>>) -> Self {
        Self {
            method: method.into(),
            keys: keys.filter(|k| !k.is_empty()),
        }
    }

    /// Subscribe to new token launches
    pub fn new_token() -> Self {
        Self::new(SUBSCRIBE_NEW_TOKEN, None)
    }

    /// JSON text for the wire
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
