use std::{sync::Arc, time::Duration};

use shared::{domain::page_count, PartialSearchState, ResultBatch, SearchState};
use tracing::{debug, warn};

use crate::{sequence::FetchKind, DriverCore, DriverError};

impl DriverCore {
    pub(crate) fn schedule_search(self: &Arc<Self>, delay: Duration) {
        let core = Arc::downgrade(self);
        self.scheduler
            .schedule(FetchKind::Search.debounce_key(), delay, move || {
                if let Some(core) = core.upgrade() {
                    core.start_search();
                }
            });
    }

    /// Issues a search for the parameters in effect right now.
    pub(crate) fn start_search(self: &Arc<Self>) {
        if self.is_closed() {
            return;
        }
        let (sequence, issued) = {
            let _dispatch = self.dispatch_guard();
            let sequence = self.sequencer.issue(FetchKind::Search);
            let issued = self.commit(PartialSearchState {
                is_loading: Some(true),
                ..PartialSearchState::default()
            });
            (sequence, issued)
        };
        debug!(
            "search: issuing request sequence={sequence} term={:?} current={} size={} filters={}",
            issued.search_term,
            issued.current,
            issued.results_per_page,
            issued.filters.len()
        );

        let core = Arc::clone(self);
        self.runtime.spawn(async move {
            let outcome = core.connector.search(&issued, &core.query_config).await;
            core.finish_search(sequence, &issued, outcome);
        });
    }

    fn finish_search(
        &self,
        sequence: u64,
        issued: &SearchState,
        outcome: anyhow::Result<ResultBatch>,
    ) {
        let _dispatch = self.dispatch_guard();
        if self.is_closed() || !self.sequencer.is_latest(FetchKind::Search, sequence) {
            debug!("search: discarding stale response sequence={sequence}");
            return;
        }

        let transition = match outcome {
            Ok(batch) => PartialSearchState {
                result_search_term: Some(issued.search_term.clone()),
                total_pages: Some(page_count(batch.total_results, issued.results_per_page)),
                total_results: Some(batch.total_results),
                results: Some(batch.results),
                facets: Some(batch.facets),
                request_id: Some(batch.request_id.unwrap_or_default()),
                was_searched: Some(true),
                is_loading: Some(false),
                error: Some(String::new()),
                ..PartialSearchState::default()
            },
            Err(err) => {
                warn!("search: connector search failed sequence={sequence} err={err:#}");
                PartialSearchState {
                    is_loading: Some(false),
                    error: Some(DriverError::Connector(format!("{err:#}")).to_string()),
                    ..PartialSearchState::default()
                }
            }
        };
        self.commit(transition);
    }
}
