//! AO3 SCRAPER
//! Collects work ids from archive searches and scrapes works into CSV files.
//! Everything runs one request at a time with a fixed delay in between.

mod macros;

pub mod config;
mod error;
pub mod input;
pub mod models;
pub mod normalize;
pub mod output;
pub mod parse;
pub mod process;
pub mod request;
pub mod runlog;
pub mod search;
pub mod work;

pub use error::{Error, Result};

pub const ARCHIVE_HOST: &str = "archiveofourown.org";
pub const DEFAULT_BASE_URL: &str = "https://archiveofourown.org";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:131.0) Gecko/20100101 Firefox/131.0";
pub const DEFAULT_DELAY_SECS: u64 = 10;
pub const REQUEST_TIMEOUT_SECS: u64 = 20;
pub const CHECK_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_NUM_TO_RETRIEVE: usize = 100;
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_IDS_CSV: &str = "work_ids.csv";
pub const DEFAULT_TEXT_CSV: &str = "works_text.csv";
pub const DEFAULT_META_CSV: &str = "works_meta.csv";
pub const DEFAULT_ERROR_CSV: &str = "errors.csv";
