//! Pump.fun Adapter
//!
//! Real-time feed of pump.fun token launches via WebSocket.
//!
//! # WebSocket Protocol
//!
//! The pump.fun WebSocket API at `wss://pumpportal.fun/api/data` accepts a
//! `{"method": "subscribeNewToken"}` subscription and then streams one JSON
//! object per launch. Two inbound shapes are understood:
//!
//! - create transactions: `{"txType": "create", "name", "mint", "signature", "symbol", "marketCapSol", "solAmount", "initialBuy", ...}`
//! - legacy notices: `{"type": "newToken", "ca", "name", "timestamp", "symbol"}`
//!
//! Objects with a top-level `message` are server notices and are dropped.

mod decoder;
mod health;
mod types;
mod websocket;

pub use decoder::{classify, decode_frame, decode_frame_at};
pub use health::{
    find_available_url, probe_websocket, ApiHealth, HealthChecker, HealthError,
    DEFAULT_HEALTH_TIMEOUT_SECS, DEFAULT_HEALTH_URL,
};
pub use types::{
    CreateMessage, FeedMessage, LegacyTokenMessage, SubscribeMessage, SUBSCRIBE_NEW_TOKEN,
};
pub use websocket::{
    WebSocketSession, WebSocketTransport, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_WS_URL,
};
