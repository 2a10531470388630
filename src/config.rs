use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::{
    DEFAULT_BASE_URL, DEFAULT_DELAY_SECS, DEFAULT_ERROR_CSV, DEFAULT_IDS_CSV, DEFAULT_LOG_DIR, DEFAULT_META_CSV,
    DEFAULT_NUM_TO_RETRIEVE, DEFAULT_OUTPUT_DIR, DEFAULT_TEXT_CSV, DEFAULT_USER_AGENT,
};

/// Parameters of a discovery run.
#[derive(Debug, Clone, Args)]
pub struct IdsConfig {
    /// Search results url to paginate through
    pub search_url: String,
    /// Output CSV, rewritten on every run
    #[arg(long, default_value = DEFAULT_IDS_CSV)]
    pub out_csv: PathBuf,
    /// Stop once this many unique ids are collected
    #[arg(long, default_value_t = DEFAULT_NUM_TO_RETRIEVE)]
    pub num_to_retrieve: usize,
    /// User-Agent sent with every request
    #[arg(long = "header", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
    /// Seconds to wait between page requests
    #[arg(long, default_value_t = DEFAULT_DELAY_SECS)]
    pub delay: u64,
    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    pub log_dir: PathBuf,
    /// Log file name, defaults to `ao3_ids_<timestamp>.log`
    #[arg(long)]
    pub log_name: Option<String>,
}

impl IdsConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    pub(crate) fn log_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("search_url", self.search_url.clone()),
            ("out_csv", self.out_csv.display().to_string()),
            ("num_to_retrieve", self.num_to_retrieve.to_string()),
            ("header", self.user_agent.clone()),
            ("delay", self.delay.to_string()),
        ]
    }
}

/// Parameters of an extraction run.
#[derive(Debug, Clone, Args)]
pub struct WorksConfig {
    /// CSV whose first column holds the work ids
    #[arg(long)]
    pub input_csv: PathBuf,
    /// Directory for the text, metadata and error files
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub out_dir: PathBuf,
    #[arg(long, default_value = DEFAULT_TEXT_CSV)]
    pub text_csv: String,
    #[arg(long, default_value = DEFAULT_META_CSV)]
    pub meta_csv: String,
    #[arg(long, default_value = DEFAULT_ERROR_CSV)]
    pub error_csv: String,
    /// User-Agent sent with every request
    #[arg(long = "header", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
    /// Seconds to wait after each work
    #[arg(long, default_value_t = DEFAULT_DELAY_SECS)]
    pub delay: u64,
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    pub log_dir: PathBuf,
    /// Log file name, defaults to `ao3_works_<timestamp>.log`
    #[arg(long)]
    pub log_name: Option<String>,
}

impl WorksConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    pub fn text_path(&self) -> PathBuf {
        self.out_dir.join(&self.text_csv)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.out_dir.join(&self.meta_csv)
    }

    pub fn error_path(&self) -> PathBuf {
        self.out_dir.join(&self.error_csv)
    }

    pub(crate) fn log_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("input_csv", self.input_csv.display().to_string()),
            ("text_csv", self.text_path().display().to_string()),
            ("meta_csv", self.meta_path().display().to_string()),
            ("error_csv", self.error_path().display().to_string()),
            ("delay", self.delay.to_string()),
            ("header", self.user_agent.clone()),
        ]
    }
}
