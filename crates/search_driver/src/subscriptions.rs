use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use shared::SearchState;

type Listener = Arc<dyn Fn(&SearchState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Synchronous observers of committed snapshots, called in registration order.
#[derive(Default)]
pub struct SubscriptionRegistry {
    listeners: Arc<Mutex<Listeners>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SearchState) + Send + Sync + 'static,
    {
        let mut guard = self.listeners.lock();
        guard.next_id += 1;
        let id = guard.next_id;
        guard.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Listeners added or removed while a pass is running take effect on the
    /// next pass.
    pub fn notify(&self, state: &SearchState) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(state);
        }
    }

    pub fn clear(&self) {
        self.listeners.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`SubscriptionRegistry::subscribe`]. Dropping it keeps the
/// listener registered; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
#[path = "tests/subscriptions_tests.rs"]
mod tests;
