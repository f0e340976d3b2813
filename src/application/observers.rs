//! Observer Registry
//!
//! Explicit subscribe/unsubscribe list for core events. Dispatch works on a
//! copy of the list, so an observer may subscribe or unsubscribe (itself or
//! others) from inside its callback.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::ports::alerts::{CoreEvent, IngestionObserver};

/// Handle returned by [`Observers::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct ObserverList {
    next_id: u64,
    entries: Vec<(SubscriptionId, Arc<dyn IngestionObserver>)>,
}

/// Shared registry of core-event observers. Clones share the same list.
#[derive(Clone, Default)]
pub struct Observers {
    inner: Arc<Mutex<ObserverList>>,
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers").field("count", &self.len()).finish()
    }
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self) -> MutexGuard<'_, ObserverList> {
        // A panicking observer never runs under the lock, so poisoning is benign
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, observer: Arc<dyn IngestionObserver>) -> SubscriptionId {
        let mut list = self.list();
        let id = SubscriptionId(list.next_id);
        list.next_id += 1;
        list.entries.push((id, observer));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut list = self.list();
        let before = list.entries.len();
        list.entries.retain(|(entry_id, _)| *entry_id != id);
        list.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.list().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every observer subscribed when dispatch starts
    pub fn emit(&self, event: &CoreEvent) {
        let targets: Vec<Arc<dyn IngestionObserver>> = self
            .list()
            .entries
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        for observer in targets {
            observer.on_core_event(event);
        }
    }
}
