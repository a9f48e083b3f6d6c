//! Export command implementation

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pettycash_core::{db::Database, export, query::QueryFilter, ExportFormat};

use super::query_ledger;

/// Write the result of a query to a file
pub fn cmd_export(db: &Database, output: &Path, format: &str, filter: &QueryFilter) -> Result<()> {
    let format: ExportFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let Some(report) = query_ledger(db, filter)? else {
        println!("⚠️  No records with a valid date in the ledger; nothing to export");
        return Ok(());
    };

    let content = export::render(&report, format).context("Failed to render export")?;
    fs::write(output, content)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    println!(
        "✅ Exported {} rows to {}",
        report.row_count,
        output.display()
    );
    Ok(())
}
