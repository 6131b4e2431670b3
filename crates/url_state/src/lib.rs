//! The URL persistence boundary of the search driver.

use anyhow::Result;
use parking_lot::Mutex;
use shared::{PartialSearchState, SearchState};
use tokio::sync::broadcast;
use tracing::debug;
use url::Url;

mod codec;
pub use codec::{query_to_state, state_to_query};

const URL_CHANGE_CAPACITY: usize = 64;

/// Reads search parameters from, and writes them to, a location-addressable
/// store such as the browser address bar.
pub trait UrlManager: Send + Sync {
    /// Called once at startup, before the first fetch.
    fn read_initial_state(&self) -> Result<PartialSearchState>;
    fn push_state_to_url(&self, state: &SearchState) -> Result<()>;
    /// Location changes the driver did not cause (history navigation).
    fn subscribe_url_changes(&self) -> Option<broadcast::Receiver<PartialSearchState>> {
        None
    }
}

pub struct NoopUrlManager;

impl UrlManager for NoopUrlManager {
    fn read_initial_state(&self) -> Result<PartialSearchState> {
        Ok(PartialSearchState::default())
    }

    fn push_state_to_url(&self, _state: &SearchState) -> Result<()> {
        Ok(())
    }
}

struct MemoryHistory {
    entries: Vec<Url>,
    cursor: usize,
}

impl MemoryHistory {
    fn current(&self) -> &Url {
        &self.entries[self.cursor]
    }

    fn push(&mut self, url: Url) {
        let keep = self.cursor + 1;
        self.entries.truncate(keep);
        self.entries.push(url);
        self.cursor = keep;
    }
}

/// An in-process location with a browser-like history stack. Pushing truncates
/// any forward entries; `back`/`forward`/`navigate` announce the new location on
/// the change channel, pushes do not.
pub struct MemoryUrlManager {
    history: Mutex<MemoryHistory>,
    changes: broadcast::Sender<PartialSearchState>,
}

impl MemoryUrlManager {
    pub fn new(location: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(location)?;
        let (changes, _) = broadcast::channel(URL_CHANGE_CAPACITY);
        Ok(Self {
            history: Mutex::new(MemoryHistory {
                entries: vec![url],
                cursor: 0,
            }),
            changes,
        })
    }

    pub fn current_url(&self) -> Url {
        self.history.lock().current().clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().entries.len()
    }

    pub fn back(&self) -> bool {
        self.move_cursor(-1)
    }

    pub fn forward(&self) -> bool {
        self.move_cursor(1)
    }

    /// Simulates the user editing the address bar.
    pub fn navigate(&self, location: &str) -> Result<(), url::ParseError> {
        let url = Url::parse(location)?;
        let partial = parameters_of(&url);
        self.history.lock().push(url);
        let _ = self.changes.send(partial);
        Ok(())
    }

    fn move_cursor(&self, step: isize) -> bool {
        let partial = {
            let mut history = self.history.lock();
            let Some(target) = history.cursor.checked_add_signed(step) else {
                return false;
            };
            if target >= history.entries.len() {
                return false;
            }
            history.cursor = target;
            parameters_of(history.current())
        };
        let _ = self.changes.send(partial);
        true
    }
}

fn parameters_of(url: &Url) -> PartialSearchState {
    query_to_state(url.query().unwrap_or_default())
}

impl UrlManager for MemoryUrlManager {
    fn read_initial_state(&self) -> Result<PartialSearchState> {
        Ok(parameters_of(&self.current_url()))
    }

    fn push_state_to_url(&self, state: &SearchState) -> Result<()> {
        let query = state_to_query(state);
        let mut history = self.history.lock();
        let mut next = history.current().clone();
        next.set_query((!query.is_empty()).then_some(query.as_str()));
        if &next == history.current() {
            debug!("url_state: skipping push of unchanged location url={next}");
            return Ok(());
        }
        debug!("url_state: pushing location url={next}");
        history.push(next);
        Ok(())
    }

    fn subscribe_url_changes(&self) -> Option<broadcast::Receiver<PartialSearchState>> {
        Some(self.changes.subscribe())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
