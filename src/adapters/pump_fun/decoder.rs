//! Pump.fun Frame Decoder
//!
//! Stateless: raw frame text in, [`TokenEvent`] or a [`SkipReason`] out.
//! Discriminant fields are checked on the parsed JSON before any typed field
//! access, so frames of unknown shape are rejected without guessing.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::domain::error::SkipReason;
use crate::domain::event::{token_url, TokenEvent};

use super::types::{CreateMessage, FeedMessage, LegacyTokenMessage, LEGACY_NEW_TOKEN, TX_TYPE_CREATE};

/// JavaScript-style truthiness, used for the `message` and `name` checks
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Discriminate a parsed frame into one of the known schemas
pub fn classify(value: Value) -> Result<FeedMessage, SkipReason> {
    let obj = value.as_object().ok_or(SkipReason::NotAnObject)?;

    // Heartbeats and subscription confirmations carry a top-level message
    if let Some(message) = obj.get("message").filter(|m| is_truthy(m)) {
        let text = message
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| message.to_string());
        return Err(SkipReason::SystemMessage(text));
    }

    let has_name = obj.get("name").map_or(false, is_truthy);
    let tx_type = obj.get("txType").and_then(Value::as_str);

    if has_name && tx_type == Some(TX_TYPE_CREATE) {
        let message: CreateMessage =
            serde_json::from_value(value).map_err(|e| SkipReason::Malformed(e.to_string()))?;
        return Ok(FeedMessage::Create(message));
    }

    if obj.get("type").and_then(Value::as_str) == Some(LEGACY_NEW_TOKEN) {
        let message: LegacyTokenMessage =
            serde_json::from_value(value).map_err(|e| SkipReason::Malformed(e.to_string()))?;
        return Ok(FeedMessage::LegacyNewToken(message));
    }

    Err(SkipReason::UnknownSchema)
}

fn from_create(message: CreateMessage, now: DateTime<Utc>) -> Result<TokenEvent, SkipReason> {
    let address = message.identity().ok_or(SkipReason::MissingIdentity)?.to_string();
    let url = token_url(message.mint.as_deref().unwrap_or(""));

    Ok(TokenEvent::new(address, message.name, now)
        .with_url(url)
        .with_symbol(message.symbol)
        .with_market(message.market_cap_sol, message.sol_amount, message.initial_buy))
}

fn from_legacy(message: LegacyTokenMessage, now: DateTime<Utc>) -> Result<TokenEvent, SkipReason> {
    let address = message.identity().ok_or(SkipReason::MissingIdentity)?.to_string();

    let timestamp = match message.timestamp.as_deref() {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                debug!("Unparseable legacy timestamp {:?}: {}", raw, e);
                now
            }
        },
        None => now,
    };

    Ok(TokenEvent::new(address, message.name.unwrap_or_default(), timestamp)
        .with_symbol(message.symbol))
}

/// Decode a frame, stamping create events with `now`
pub fn decode_frame_at(raw: &str, now: DateTime<Utc>) -> Result<TokenEvent, SkipReason> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|_| SkipReason::Unparseable)?;

    match classify(value)? {
        FeedMessage::Create(message) => from_create(message, now),
        FeedMessage::LegacyNewToken(message) => from_legacy(message, now),
    }
}

/// Decode a frame at the current time
pub fn decode_frame(raw: &str) -> Result<TokenEvent, SkipReason> {
    decode_frame_at(raw, Utc::now())
}
