use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};
use url::Url;

use crate::models::WorkId;
use crate::parse::{parse_search, Selectors};
use crate::request::{diagnose_response, Transport};
use crate::runlog::RunLog;

/// Why a discovery run stopped. All of these are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    /// A page had no entries, or none that weren't already collected.
    Exhausted,
    /// A page request failed or returned a non-success status.
    Failed(String),
}

/// Ids collected by one discovery run, in the order they were first seen.
#[derive(Debug)]
pub struct Discovery {
    pub ids: Vec<WorkId>,
    pub stop: StopReason,
    /// Pages that came back with a success status.
    pub pages: usize,
}

pub struct SearchPaginator<T> {
    transport: T,
    selectors: Arc<Selectors>,
}

impl<T: Transport> SearchPaginator<T> {
    pub fn new(transport: T, selectors: Arc<Selectors>) -> Self {
        Self { transport, selectors }
    }

    /// The search url with its `page` parameter set to `page`.
    pub fn page_url(search_url: &Url, page: usize) -> Url {
        let pairs: Vec<(String, String)> = search_url
            .query_pairs()
            .filter(|(key, _)| key != "page")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        let mut url = search_url.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .extend_pairs(pairs)
            .append_pair("page", &page.to_string());
        url
    }

    /// Walks result pages from page 1 until `target` unique ids are collected,
    /// a page brings nothing new, or a page request fails. Partial results are
    /// returned in every case. Consecutive page requests are at least `delay` apart.
    #[instrument(skip_all, fields(search_url = %search_url, target))]
    pub async fn discover(&self, search_url: &Url, target: usize, delay: Duration, log: &mut RunLog) -> Discovery {
        log.line(format!("Starting discovery for: {search_url}"));
        log.line(format!("Maximum ids to retrieve: {target}"));

        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(target.min(1024));
        let mut page = 1;
        let mut pages = 0;

        let stop = loop {
            if ids.len() >= target {
                break StopReason::TargetReached;
            }
            if page > 1 {
                tokio::time::sleep(delay).await;
            }

            let url = Self::page_url(search_url, page);
            let response = match self.transport.get(&url).await {
                Ok(response) => response,
                Err(err) => {
                    warn!("Connection error on page {page}: {err}");
                    log.line(format!("Connection error on page {page}: {err}"));
                    break StopReason::Failed(err.to_string());
                }
            };

            if !response.is_success() {
                warn!("Status {} on page {page}, stopping", response.status);
                log.line(format!("Error {} on page {page}", response.status));
                log.line(diagnose_response(&response, &url));
                break StopReason::Failed(format!("status {} on page {page}", response.status));
            }
            pages += 1;

            let results = match parse_search(self.selectors.clone(), response.body).await {
                Ok(results) => results,
                Err(err) => {
                    log.line(format!("Couldn't parse page {page}: {err}"));
                    break StopReason::Failed(err.to_string());
                }
            };
            if results.is_empty {
                log.line("No further results found.");
                break StopReason::Exhausted;
            }

            let mut new_ids = 0;
            for id in results.candidates {
                if ids.len() >= target {
                    break;
                }
                if seen.insert(id.clone()) {
                    ids.push(id);
                    new_ids += 1;
                }
            }
            log.line(format!("Page {page} processed, {} ids collected.", ids.len()));
            info!("Page {page}: {new_ids} new ids, {} total", ids.len());

            if new_ids == 0 {
                log.line("Page brought no new ids, stopping.");
                break StopReason::Exhausted;
            }
            page += 1;
        };

        Discovery { ids, stop, pages }
    }
}
