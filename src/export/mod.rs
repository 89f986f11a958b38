//! Category export: page through a resource and materialize it on disk
//!
//! Layout per category:
//! - `<out>/<key>/index.json` with every item
//! - `<out>/<key>/<id>__<name>.json` per item
//! - `<out>/<key>/_error.txt` instead, when the category failed

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::pagination::DEFAULT_PAGE_SIZE;
use crate::client::{LogicMonitorApi, Pager};
use crate::error::{Error, Result};

pub mod catalog;
pub mod files;

pub use catalog::{Category, CategoryRegistry};
use files::{ERROR_FILE, INDEX_FILE, item_filename, replace_dir_with, write_json};

/// Knobs shared by every category of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    pub page_size: usize,
    pub page_pause: Duration,
    pub fields: Option<String>,
    pub filter: Option<String>,
}

impl ExportOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            page_size: DEFAULT_PAGE_SIZE,
            page_pause: Duration::ZERO,
            fields: None,
            filter: None,
        }
    }
}

/// How a category export ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryOutcome {
    Exported { items: usize, total: Option<i64> },
    Failed { error: String },
}

/// Result of exporting one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub outcome: CategoryOutcome,
}

impl CategoryReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, CategoryOutcome::Failed { .. })
    }

    fn failed(key: &str, category: Option<&Category>, dir: Option<&Path>, err: &Error) -> Self {
        Self {
            key: key.to_string(),
            resource_path: category.map(|c| c.resource_path.clone()),
            output_dir: dir.map(Path::to_path_buf),
            outcome: CategoryOutcome::Failed {
                error: err.to_string(),
            },
        }
    }
}

/// Exports categories through a [`LogicMonitorApi`].
pub struct Exporter<'a, A: LogicMonitorApi + ?Sized> {
    api: &'a A,
    registry: CategoryRegistry,
    options: ExportOptions,
    cancel: CancellationToken,
}

impl<'a, A: LogicMonitorApi + ?Sized> Exporter<'a, A> {
    pub fn new(api: &'a A, registry: CategoryRegistry, options: ExportOptions) -> Self {
        Self {
            api,
            registry,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between pages when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Export one category.
    ///
    /// An unknown key fails immediately without touching the filesystem. Files
    /// are staged and replace the category directory only once all of them are
    /// written. Any failure is recorded in `_error.txt` and reported, not
    /// raised; cancellation is recorded and then raised so the run stops.
    pub async fn export_category(&self, key: &str) -> Result<CategoryReport> {
        let category = self
            .registry
            .get(key)
            .ok_or_else(|| Error::UnknownCategory(key.to_string()))?;

        let dir = self.options.out_dir.join(&category.key);
        std::fs::create_dir_all(&dir)?;

        info!(
            "Exporting {} from {}",
            category.key, category.resource_path
        );

        match self.fetch_and_write(category, &dir).await {
            Ok((items, total)) => {
                info!(
                    "Saved {} {} items -> {}",
                    items,
                    category.key,
                    dir.display()
                );
                Ok(CategoryReport {
                    key: category.key.clone(),
                    resource_path: Some(category.resource_path.clone()),
                    output_dir: Some(dir),
                    outcome: CategoryOutcome::Exported { items, total },
                })
            }
            Err(err) => {
                error!("Export of {} failed: {}", category.key, err);
                let marker = std::fs::create_dir_all(&dir)
                    .and_then(|_| std::fs::write(dir.join(ERROR_FILE), format!("{}\n", err)));
                if let Err(write_err) = marker {
                    warn!(
                        "Could not write {} for {}: {}",
                        ERROR_FILE, category.key, write_err
                    );
                }
                if err.is_cancelled() {
                    return Err(err);
                }
                Ok(CategoryReport::failed(&category.key, Some(category), Some(&dir), &err))
            }
        }
    }

    async fn fetch_and_write(
        &self,
        category: &Category,
        dir: &Path,
    ) -> Result<(usize, Option<i64>)> {
        let listing = Pager::new(self.api, self.options.page_size)
            .with_pause(self.options.page_pause)
            .with_fields(self.options.fields.clone())
            .with_filter(self.options.filter.clone())
            .with_cancellation(self.cancel.clone())
            .fetch_all(&category.resource_path)
            .await?;

        // Nothing reaches `dir` unless every file was written
        replace_dir_with(dir, |staging| {
            write_json(&staging.join(INDEX_FILE), &listing.items)?;
            for item in &listing.items {
                write_json(&staging.join(item_filename(item)), item)?;
            }
            Ok(())
        })?;

        Ok((listing.items.len(), listing.total))
    }
}

/// Export the requested categories in order, one after another.
///
/// `all` expands to the whole catalog. A failing or unknown category is
/// reported and the run moves on; only cancellation stops it.
pub async fn run_exports<A: LogicMonitorApi + ?Sized>(
    exporter: &Exporter<'_, A>,
    requested: &[String],
) -> Result<Vec<CategoryReport>> {
    let keys = exporter.registry().expand(requested);
    let mut reports = Vec::with_capacity(keys.len());

    for key in keys {
        match exporter.export_category(&key).await {
            Ok(report) => reports.push(report),
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                error!("Skipping {}: {}", key, err);
                reports.push(CategoryReport::failed(&key, None, None, &err));
            }
        }
    }

    Ok(reports)
}
