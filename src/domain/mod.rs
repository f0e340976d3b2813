//! Domain Layer - Core logic for token launch monitoring
//!
//! Pure types and rules with no I/O. All external interactions happen
//! through the ports layer.

pub mod backoff;
pub mod connection;
pub mod error;
pub mod event;
pub mod search;
pub mod store;

pub use backoff::ReconnectPolicy;
pub use connection::{CloseOutcome, ConnectionMachine, ConnectionStatus, RETRIES_EXHAUSTED_MESSAGE};
pub use error::{FeedError, SkipReason};
pub use event::{token_url, TokenEvent};
pub use search::{matches, SearchConfiguration, SearchError};
pub use store::{BoundedEventList, EventStore, StoreSnapshot};
