//! Export command implementation

use colored::Colorize;
use log::warn;

use crate::cli::{CommandContext, ExportArgs, GlobalOptions, OutputFormat};
use crate::error::{Error, Result};
use crate::export::{CategoryOutcome, CategoryRegistry, CategoryReport, Exporter, run_exports};
use crate::models::ReportDisplay;
use crate::output::{json, table};

/// Run the export command.
///
/// Every requested category is attempted; the command fails afterwards if any
/// of them did.
pub async fn run(opts: &GlobalOptions, args: &ExportArgs) -> Result<()> {
    let ctx = CommandContext::new(opts, args)?;

    tokio::spawn({
        let cancel = ctx.cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl+C received, stopping export");
                cancel.cancel();
            }
        }
    });

    let exporter = Exporter::new(
        &ctx.client,
        CategoryRegistry::logic_modules(),
        ctx.export_options(),
    )
    .with_cancellation(ctx.cancel.clone());

    let reports = run_exports(&exporter, &args.types).await?;
    print_summary(&reports, ctx.format)?;

    let failed = reports.iter().filter(|r| r.is_failed()).count();
    if failed > 0 {
        return Err(Error::PartialFailure {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

fn print_summary(reports: &[CategoryReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<ReportDisplay> = reports.iter().map(ReportDisplay::from).collect();
            println!("{}", table::format_table(&rows));

            let exported: usize = reports
                .iter()
                .filter_map(|r| match r.outcome {
                    CategoryOutcome::Exported { items, .. } => Some(items),
                    CategoryOutcome::Failed { .. } => None,
                })
                .sum();
            let failed = reports.iter().filter(|r| r.is_failed()).count();

            if failed == 0 {
                println!(
                    "{} Exported {} items from {} categories",
                    "✓".green(),
                    exported,
                    reports.len()
                );
            } else {
                println!(
                    "{} {} of {} categories failed (see _error.txt in each failed category)",
                    "✗".red(),
                    failed,
                    reports.len()
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", json::format_json(reports)?);
        }
    }
    Ok(())
}
