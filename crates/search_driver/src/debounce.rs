//! Trailing-edge debounce keyed by action kind.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::debug;

struct PendingWork {
    generation: u64,
    timer: JoinHandle<()>,
}

/// One cancellable timer per key. A positive-delay `schedule` replaces whatever
/// is pending under the same key; a zero delay runs the work inline and leaves
/// pending timers alone.
pub struct DebounceScheduler {
    runtime: Handle,
    pending: Arc<Mutex<HashMap<String, PendingWork>>>,
    generations: AtomicU64,
    closed: AtomicBool,
}

impl DebounceScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn schedule<F>(&self, key: &str, delay: Duration, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            debug!("debounce: scheduler closed, dropping work key={key}");
            return;
        }
        if delay.is_zero() {
            work();
            return;
        }

        let generation = self.generations.fetch_add(1, Ordering::AcqRel) + 1;
        let pending = Arc::clone(&self.pending);
        let timer_key = key.to_string();

        // The timer task re-locks `pending` before firing, so it cannot observe
        // the map until this entry is in place.
        let mut guard = self.pending.lock();
        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let fire = {
                let mut pending = pending.lock();
                match pending.get(&timer_key) {
                    Some(entry) if entry.generation == generation => {
                        pending.remove(&timer_key);
                        true
                    }
                    _ => false,
                }
            };
            if fire {
                work();
            }
        });

        if let Some(previous) = guard.insert(key.to_string(), PendingWork { generation, timer }) {
            previous.timer.abort();
            debug!("debounce: superseded pending work key={key}");
        }
    }

    /// Drops the pending work under `key`, if any. Returns whether something was
    /// pending.
    pub fn cancel(&self, key: &str) -> bool {
        match self.pending.lock().remove(key) {
            Some(previous) => {
                previous.timer.abort();
                debug!("debounce: cancelled pending work key={key}");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        let drained: Vec<(String, PendingWork)> = self.pending.lock().drain().collect();
        for (key, previous) in drained {
            previous.timer.abort();
            debug!("debounce: cancelled pending work key={key}");
        }
    }

    /// Cancels everything pending and refuses later work.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.cancel_all();
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
