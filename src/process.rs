use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{info, warn};
use url::Url;

use crate::config::{IdsConfig, WorksConfig};
use crate::input::read_work_ids;
use crate::models::WorkId;
use crate::output::{write_work_ids, CsvOutputs, RecordSink};
use crate::parse::Selectors;
use crate::request::{check_reachable, ClientConfig, HttpTransport, Transport};
use crate::runlog::RunLog;
use crate::search::{SearchPaginator, StopReason};
use crate::work::WorkFetcher;
use crate::{info_time, Result};

/// Counts of an extraction run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Fetches every id in input order, routing each to exactly one of the record
/// or error outputs. A failing id never stops the loop; only a failing sink does.
/// Sleeps `delay` after every id, whatever its outcome.
pub async fn run_extraction<T, S>(
    fetcher: &WorkFetcher<T>,
    ids: &[WorkId],
    delay: Duration,
    sink: &mut S,
    log: &mut RunLog,
) -> Result<RunSummary>
where
    T: Transport,
    S: RecordSink,
{
    let mut summary = RunSummary::default();
    let total = ids.len();

    for (idx, id) in ids.iter().enumerate() {
        match fetcher.fetch(id.clone()).await.into_record() {
            Ok(record) => {
                sink.record(&record)?;
                summary.succeeded += 1;
            }
            Err(error) => {
                log.line(format!("Work {}: {}", error.id, error.message));
                sink.error(&error)?;
                summary.failed += 1;
            }
        }
        info!("[{}/{}] work {} processed", idx + 1, total, id);
        tokio::time::sleep(delay).await;
    }

    Ok(summary)
}

/// Extraction mode end to end: reads the id list, appends to the three output
/// files and writes the run log. Returns the log path.
pub async fn scrape_works(config: &WorksConfig) -> Result<PathBuf> {
    if !check_reachable().await {
        warn!("Continuing without a confirmed connection");
    }
    let mut client = ClientConfig::new(config.user_agent.clone())?;
    client.base_url = Url::parse(&config.base_url)?;
    let transport = HttpTransport::new(&client)?;
    scrape_works_with(config, transport).await
}

pub async fn scrape_works_with<T: Transport>(config: &WorksConfig, transport: T) -> Result<PathBuf> {
    let start_time = Local::now();
    let mut log = RunLog::new(
        "ao3_works",
        &config.log_params(),
        &config.log_dir,
        config.log_name.as_deref(),
    );

    let ids = read_work_ids(&config.input_csv)?;
    info_time!("Read {} work ids from {}", ids.len(), config.input_csv.display());

    std::fs::create_dir_all(&config.out_dir)?;
    let mut outputs = CsvOutputs::open(config.text_path(), config.meta_path(), config.error_path())?;

    let fetcher = WorkFetcher::new(
        transport,
        Url::parse(&config.base_url)?,
        Arc::new(Selectors::new()?),
    );
    let summary = run_extraction(&fetcher, &ids, config.delay(), &mut outputs, &mut log).await?;
    info_time!(
        start_time,
        "Finished: {} scraped, {} failed",
        summary.succeeded,
        summary.failed
    );

    log.finish(&[
        format!("Works processed: {}", ids.len()),
        format!("Succeeded: {}", summary.succeeded),
        format!("Failed or denied: {}", summary.failed),
        format!("Text CSV: {}", outputs.text_path.display()),
        format!("Meta CSV: {}", outputs.meta_path.display()),
        format!("Error CSV: {}", outputs.error_path.display()),
    ])
}

/// Discovery mode end to end: paginates the search, rewrites the id file and
/// writes the run log. Returns the log path.
pub async fn collect_ids(config: &IdsConfig) -> Result<PathBuf> {
    let transport = HttpTransport::new(&ClientConfig::new(config.user_agent.clone())?)?;
    collect_ids_with(config, transport).await
}

pub async fn collect_ids_with<T: Transport>(config: &IdsConfig, transport: T) -> Result<PathBuf> {
    let start_time = Local::now();
    let mut log = RunLog::new(
        "ao3_ids",
        &config.log_params(),
        &config.log_dir,
        config.log_name.as_deref(),
    );

    let search_url = Url::parse(&config.search_url)?;
    let paginator = SearchPaginator::new(transport, Arc::new(Selectors::new()?));
    let found = paginator
        .discover(&search_url, config.num_to_retrieve, config.delay(), &mut log)
        .await;
    if let StopReason::Failed(reason) = &found.stop {
        // Pagination does not retry or skip a failed page.
        warn!("Discovery stopped early after {} pages: {reason}", found.pages);
    }
    info_time!(start_time, "Collected {} ids", found.ids.len());

    if found.ids.is_empty() {
        log.line("No ids found or the request failed.");
    } else {
        if let Some(parent) = config.out_csv.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        write_work_ids(&config.out_csv, &found.ids)?;
        log.line(format!("{} ids saved to: {}", found.ids.len(), config.out_csv.display()));
    }

    log.finish(&[
        format!("Ids collected: {}", found.ids.len()),
        format!("Output CSV: {}", config.out_csv.display()),
    ])
}
