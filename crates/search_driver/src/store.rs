//! The canonical snapshot holder.

use std::sync::Arc;

use shared::{PartialSearchState, SearchState};
use tokio::sync::watch;

/// Holds the current [`SearchState`]. Each commit publishes a fresh snapshot;
/// readers only ever see whole snapshots.
pub struct StateStore {
    sender: watch::Sender<Arc<SearchState>>,
}

impl StateStore {
    pub fn new(initial: SearchState) -> Self {
        let (sender, _) = watch::channel(Arc::new(initial));
        Self { sender }
    }

    pub fn get_state(&self) -> Arc<SearchState> {
        Arc::clone(&self.sender.borrow())
    }

    /// Applies `transition` over the current snapshot and publishes the result.
    /// The read-modify-write runs under the channel's write lock, so commits from
    /// different threads never interleave.
    pub fn commit(&self, transition: PartialSearchState) -> Arc<SearchState> {
        let mut committed = Arc::default();
        self.sender.send_modify(|current| {
            let mut next = (**current).clone();
            transition.apply_to(&mut next);
            *current = Arc::new(next);
            committed = Arc::clone(current);
        });
        committed
    }

    pub fn watch(&self) -> watch::Receiver<Arc<SearchState>> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
