//! Export report display model

use serde::Serialize;
use tabled::Tabled;

use super::common::{first_line, truncate_string};
use crate::export::{CategoryOutcome, CategoryReport};

/// Width of the DETAIL column for failures
const DETAIL_WIDTH: usize = 80;

/// Per-category export summary row.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ReportDisplay {
    #[tabled(rename = "CATEGORY")]
    pub key: String,

    #[tabled(rename = "STATUS")]
    pub status: String,

    #[tabled(rename = "ITEMS")]
    pub items: String,

    /// Output directory on success, error summary on failure
    #[tabled(rename = "DETAIL")]
    pub detail: String,
}

impl From<&CategoryReport> for ReportDisplay {
    fn from(report: &CategoryReport) -> Self {
        let dir = report
            .output_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();

        match &report.outcome {
            CategoryOutcome::Exported { items, .. } => Self {
                key: report.key.clone(),
                status: "ok".to_string(),
                items: items.to_string(),
                detail: dir,
            },
            CategoryOutcome::Failed { error } => Self {
                key: report.key.clone(),
                status: "failed".to_string(),
                items: "-".to_string(),
                detail: truncate_string(first_line(error), DETAIL_WIDTH),
            },
        }
    }
}
