//! Categories command implementation

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::export::CategoryRegistry;
use crate::models::CategoryDisplay;
use crate::output;

/// Print the exportable categories and their resource paths
pub fn run(format: OutputFormat) -> Result<()> {
    let registry = CategoryRegistry::logic_modules();
    let rows: Vec<CategoryDisplay> = registry.iter().map(CategoryDisplay::from).collect();
    output::print(&rows, format)
}
