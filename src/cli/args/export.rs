//! Arguments of the export command

use std::path::PathBuf;

use clap::Args;

use crate::config::Settings;
use crate::error::Result;

/// Export flags. Unset flags fall back to the settings file, then defaults.
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Categories to export (comma-separated or repeated), or `all`
    #[arg(
        long,
        short = 't',
        value_delimiter = ',',
        num_args = 1..,
        default_value = "all"
    )]
    pub types: Vec<String>,

    /// Output directory root
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Page size for list requests
    #[arg(long)]
    pub size: Option<usize>,

    /// Seconds to pause between pages
    #[arg(long)]
    pub sleep: Option<f64>,

    /// Comma-separated fields to return for each item
    #[arg(long)]
    pub fields: Option<String>,

    /// LogicMonitor filter expression (e.g. name~"CPU")
    #[arg(long)]
    pub filter: Option<String>,

    /// Total attempts per request, including the first
    #[arg(long)]
    pub retries: Option<u32>,

    /// Base backoff in seconds for transient failures
    #[arg(long)]
    pub backoff: Option<f64>,

    /// Seconds to wait after HTTP 429 when Retry-After is absent
    #[arg(long)]
    pub rate_limit_sleep: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,
}

impl Default for ExportArgs {
    fn default() -> Self {
        Self {
            types: vec!["all".to_string()],
            out: None,
            size: None,
            sleep: None,
            fields: None,
            filter: None,
            retries: None,
            backoff: None,
            rate_limit_sleep: None,
            timeout: None,
        }
    }
}

impl ExportArgs {
    /// Overlay the flags that were given onto `settings` and validate the result.
    pub fn apply(&self, mut settings: Settings) -> Result<Settings> {
        if let Some(ref out) = self.out {
            settings.out_dir = out.clone();
        }
        if let Some(size) = self.size {
            settings.page_size = size;
        }
        if let Some(sleep) = self.sleep {
            settings.sleep_secs = sleep;
        }
        if self.fields.is_some() {
            settings.fields = self.fields.clone();
        }
        if self.filter.is_some() {
            settings.filter = self.filter.clone();
        }
        if let Some(retries) = self.retries {
            settings.max_attempts = retries;
        }
        if let Some(backoff) = self.backoff {
            settings.backoff_base_secs = backoff;
        }
        if let Some(wait) = self.rate_limit_sleep {
            settings.rate_limit_sleep_secs = wait;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }

        settings.validate()?;
        Ok(settings)
    }
}
