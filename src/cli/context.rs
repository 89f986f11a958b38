//! Command execution context
//!
//! Provides a unified context for the export command, covering env file loading,
//! settings merging, credential validation and client initialization.

use tokio_util::sync::CancellationToken;

use crate::cli::{ExportArgs, GlobalOptions, OutputFormat};
use crate::client::{LogicMonitorClient, RetryPolicy};
use crate::config::{self, Credentials, Settings};
use crate::error::Result;
use crate::export::ExportOptions;

/// Context for command execution containing settings, client, and runtime options.
pub struct CommandContext {
    /// Settings file merged with CLI flags, validated
    pub settings: Settings,
    /// Signed API client with retry policy and throttle applied
    pub client: LogicMonitorClient,
    /// Output format preference
    pub format: OutputFormat,
    /// Fired on Ctrl-C; shared by the client and the exporter
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// Create a new command context with full initialization.
    ///
    /// This handles:
    /// - Loading the env file (explicit path, or a discovered `.env`)
    /// - Loading settings and applying CLI overrides
    /// - Reading credentials, failing on any missing variable
    /// - Creating the API client
    ///
    /// No network request is made here.
    pub fn new(opts: &GlobalOptions, args: &ExportArgs) -> Result<Self> {
        config::load_env_file(opts.env_file_ref())?;

        let settings = args.apply(Settings::load_at(opts.config_ref())?)?;
        let credentials = Credentials::from_env()?;
        log::debug!("Using credentials {:?}", credentials);

        let cancel = CancellationToken::new();
        let retry = RetryPolicy::new(
            settings.max_attempts,
            settings.backoff_base(),
            settings.rate_limit_sleep(),
        );

        let mut client = LogicMonitorClient::with_timeout(credentials, settings.timeout())?
            .with_retry_policy(retry)
            .with_throttle(settings.throttle_per_second)
            .with_cancellation(cancel.clone());
        if let Some(host) = opts.api_host_ref() {
            client = client.with_api_host(host);
        }
        log::debug!("API base URL: {}", client.base_url());

        Ok(Self {
            settings,
            client,
            format: opts.format,
            cancel,
        })
    }

    /// Exporter options derived from the merged settings.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            out_dir: self.settings.out_dir.clone(),
            page_size: self.settings.page_size,
            page_pause: self.settings.page_pause(),
            fields: self.settings.fields.clone(),
            filter: self.settings.filter.clone(),
        }
    }
}
