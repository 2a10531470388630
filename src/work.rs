use std::sync::Arc;

use tracing::{debug, instrument, warn};
use url::{ParseError, Url};

use crate::models::{ErrorRecord, WorkId, WorkRecord};
use crate::parse::{parse_work, Denial, Selectors, WorkPage};
use crate::request::Transport;
use crate::{Error, Result};

/// Result of fetching one work. Every per-work failure ends up here instead of
/// propagating, so a run can carry on with the next id.
#[derive(Debug)]
pub enum FetchOutcome {
    Record(WorkRecord),
    Denied { id: WorkId, denial: Denial },
    Failed { id: WorkId, error: Error },
}

impl FetchOutcome {
    /// Splits the outcome into the record or the error row to emit instead.
    pub fn into_record(self) -> std::result::Result<WorkRecord, ErrorRecord> {
        match self {
            FetchOutcome::Record(record) => Ok(record),
            FetchOutcome::Denied { id, denial } => Err(ErrorRecord {
                id,
                message: denial.to_string(),
            }),
            FetchOutcome::Failed { id, error } => {
                let message = if error.is_transport() {
                    format!("Connection error: {error}")
                } else {
                    error.to_string()
                };
                Err(ErrorRecord { id, message })
            }
        }
    }
}

/// Fetches single works. The client identity (user-agent) lives in the transport.
pub struct WorkFetcher<T> {
    transport: T,
    base_url: Url,
    selectors: Arc<Selectors>,
}

impl<T: Transport> WorkFetcher<T> {
    pub fn new(transport: T, base_url: Url, selectors: Arc<Selectors>) -> Self {
        Self {
            transport,
            base_url,
            selectors,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `{base}/works/{id}?view_adult=true&view_full_work=true`
    pub fn work_url(&self, id: &WorkId) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| Error::Url(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("works")
            .push(id.as_str());
        url.query_pairs_mut()
            .append_pair("view_adult", "true")
            .append_pair("view_full_work", "true");
        Ok(url)
    }

    #[instrument(skip_all, fields(work_id = %id))]
    pub async fn fetch(&self, id: WorkId) -> FetchOutcome {
        let url = match self.work_url(&id) {
            Ok(url) => url,
            Err(error) => return FetchOutcome::Failed { id, error },
        };

        let page = match self.transport.get(&url).await {
            Ok(page) => page,
            Err(error) => {
                warn!("Request failed: {error}");
                return FetchOutcome::Failed { id, error };
            }
        };

        if !page.is_success() {
            warn!("Unexpected status {}", page.status);
            let error = Error::Status {
                url: url.to_string(),
                status: page.status,
            };
            return FetchOutcome::Failed { id, error };
        }

        match parse_work(self.selectors.clone(), id.clone(), page.body).await {
            Ok(WorkPage::Work(record)) => {
                debug!(title = %record.title, "Extracted work");
                FetchOutcome::Record(record)
            }
            Ok(WorkPage::Denied(denial)) => {
                debug!("{denial}");
                FetchOutcome::Denied { id, denial }
            }
            Err(error) => FetchOutcome::Failed { id, error },
        }
    }
}
