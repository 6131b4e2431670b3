use std::sync::atomic::{AtomicU64, Ordering};

/// The independent fetch streams the driver runs. Each has its own debounce key
/// and its own request sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Search,
    AutocompleteResults,
    AutocompleteSuggestions,
}

impl FetchKind {
    pub const ALL: [FetchKind; 3] = [
        FetchKind::Search,
        FetchKind::AutocompleteResults,
        FetchKind::AutocompleteSuggestions,
    ];

    pub fn debounce_key(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::AutocompleteResults => "autocomplete-results",
            Self::AutocompleteSuggestions => "autocomplete-suggestions",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Search => 0,
            Self::AutocompleteResults => 1,
            Self::AutocompleteSuggestions => 2,
        }
    }
}

/// Monotonic request numbers per [`FetchKind`]. Only the most recently issued
/// number of a kind may commit its response.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: [AtomicU64; 3],
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, kind: FetchKind) -> u64 {
        self.latest[kind.index()].fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_latest(&self, kind: FetchKind, sequence: u64) -> bool {
        self.latest[kind.index()].load(Ordering::Acquire) == sequence
    }

    /// Makes every in-flight request of every kind stale.
    pub fn invalidate_all(&self) {
        for kind in FetchKind::ALL {
            self.issue(kind);
        }
    }
}
