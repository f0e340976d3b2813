//! Event Store
//!
//! Three independent newest-first collections of token events:
//! - `all_seen`: every decoded event (capped)
//! - `matched`: events that passed the active search (uncapped)
//! - `recent`: short live ticker (capped)
//!
//! Each collection dedups by address on its own. An address evicted from a
//! capped collection may be inserted again later.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use super::event::TokenEvent;

/// Default capacity of the all-seen collection
pub const DEFAULT_SEEN_CAPACITY: usize = 100;

/// Default capacity of the recent collection
pub const DEFAULT_RECENT_CAPACITY: usize = 10;

/// Newest-first list of events, deduplicated by address, optionally capped
#[derive(Debug, Clone)]
pub struct BoundedEventList {
    events: VecDeque<TokenEvent>,
    addresses: HashSet<String>,
    capacity: Option<usize>,
}

impl BoundedEventList {
    /// Create a list that evicts its oldest entries beyond `capacity`
    pub fn capped(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity + 1),
            addresses: HashSet::with_capacity(capacity + 1),
            capacity: Some(capacity),
        }
    }

    /// Create a list that never evicts
    pub fn unbounded() -> Self {
        Self {
            events: VecDeque::new(),
            addresses: HashSet::new(),
            capacity: None,
        }
    }

    /// Insert at the head. Returns false if the address is already present.
    pub fn insert(&mut self, event: TokenEvent) -> bool {
        if self.addresses.contains(event.address()) {
            return false;
        }

        self.addresses.insert(event.address().to_string());
        self.events.push_front(event);

        if let Some(capacity) = self.capacity {
            while self.events.len() > capacity {
                if let Some(evicted) = self.events.pop_back() {
                    self.addresses.remove(evicted.address());
                }
            }
        }

        true
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &TokenEvent> {
        self.events.iter()
    }

    /// Most recently inserted event
    pub fn newest(&self) -> Option<&TokenEvent> {
        self.events.front()
    }

    /// Owned copy, newest first
    pub fn to_vec(&self) -> Vec<TokenEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.addresses.clear();
    }
}

/// Read-only copy of all three collections
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub all_seen: Vec<TokenEvent>,
    pub matched: Vec<TokenEvent>,
    pub recent: Vec<TokenEvent>,
}

/// Bounded, deduplicated event collections for one monitoring session
#[derive(Debug, Clone)]
pub struct EventStore {
    all_seen: BoundedEventList,
    matched: BoundedEventList,
    recent: BoundedEventList,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::with_capacities(DEFAULT_SEEN_CAPACITY, DEFAULT_RECENT_CAPACITY)
    }
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with custom caps for the seen and recent collections
    pub fn with_capacities(seen_capacity: usize, recent_capacity: usize) -> Self {
        Self {
            all_seen: BoundedEventList::capped(seen_capacity),
            matched: BoundedEventList::unbounded(),
            recent: BoundedEventList::capped(recent_capacity),
        }
    }

    pub fn insert_seen(&mut self, event: TokenEvent) -> bool {
        self.all_seen.insert(event)
    }

    pub fn insert_matched(&mut self, event: TokenEvent) -> bool {
        self.matched.insert(event)
    }

    pub fn insert_recent(&mut self, event: TokenEvent) -> bool {
        self.recent.insert(event)
    }

    /// Reset the matched collection; seen and recent are kept
    pub fn clear_matched(&mut self) {
        self.matched.clear();
    }

    pub fn all_seen(&self) -> &BoundedEventList {
        &self.all_seen
    }

    pub fn matched(&self) -> &BoundedEventList {
        &self.matched
    }

    pub fn recent(&self) -> &BoundedEventList {
        &self.recent
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            all_seen: self.all_seen.to_vec(),
            matched: self.matched.to_vec(),
            recent: self.recent.to_vec(),
        }
    }
}
