//! Command-line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::model::DEFAULT_PAGE_SIZE;

/// lms-rs - terminal front-end for the library management system
#[derive(Parser, Debug, Clone)]
#[command(name = "lms-rs")]
#[command(version)]
#[command(about = "Browse and manage the book catalog from the terminal", long_about = None)]
pub struct Config {
    /// Base URL of the library management API
    #[arg(long, env = "LMS_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Books fetched per catalog page
    #[arg(
        long,
        env = "LMS_PAGE_SIZE",
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub page_size: u32,

    /// Directory for the rolling log files
    #[arg(long, env = "LMS_LOG_DIR", default_value = ".logs")]
    pub log_dir: PathBuf,

    /// Seconds to wait after a scrape request before reloading the catalog
    #[arg(long, default_value_t = 3)]
    pub scrape_settle_secs: u64,
}

impl Config {
    pub fn scrape_settle_delay(&self) -> Duration {
        Duration::from_secs(self.scrape_settle_secs)
    }
}
