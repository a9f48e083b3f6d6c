//! Import command implementation

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use pettycash_core::{db::Database, ingest::load_upload, models::ImportBatch, Settings};

use super::{format_amount, truncate};

/// Import a sheet into the ledger
///
/// Prints a preview of the accepted rows and asks before writing unless
/// `yes` is set. With `dry_run` nothing is written.
pub fn cmd_import(
    db: &Database,
    file: &Path,
    settings: &Settings,
    yes: bool,
    dry_run: bool,
) -> Result<()> {
    let stdin = io::stdin();
    cmd_import_with_input(db, file, settings, yes, dry_run, &mut stdin.lock())
}

/// [`cmd_import`] reading the confirmation answer from `input`
pub fn cmd_import_with_input(
    db: &Database,
    file: &Path,
    settings: &Settings,
    yes: bool,
    dry_run: bool,
    input: &mut impl BufRead,
) -> Result<()> {
    println!("📥 Reading {}...", file.display());

    let batch = match load_upload(file, &settings.import) {
        Ok(batch) => batch,
        Err(e) if e.is_upload_failure() => {
            anyhow::bail!("Could not read {}: {}", file.display(), e)
        }
        Err(e) => return Err(e).context("Failed to process sheet"),
    };

    print_preview(&batch, settings.display.preview_rows);

    if batch.records.is_empty() {
        println!("⚠️  No rows with a valid date (expected format 113.05.20); nothing to import");
        return Ok(());
    }

    if dry_run {
        println!("🔍 Dry run: nothing written");
        return Ok(());
    }

    if !yes {
        print!("Import {} rows? [y/N] ", batch.accepted());
        io::stdout().flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(());
        }
    }

    let imported = db
        .append_batch(&batch.records)
        .context("Failed to write to ledger")?;

    println!("✅ Imported {} rows (uploaded {})", imported, batch.uploaded_at);
    if batch.skipped > 0 {
        println!(
            "⚠️  Skipped {} rows without a valid date (expected format 113.05.20)",
            batch.skipped
        );
    }

    Ok(())
}

fn print_preview(batch: &ImportBatch, rows: usize) {
    println!();
    println!(
        "   {} data rows: {} valid, {} without a valid date",
        batch.total_rows,
        batch.accepted(),
        batch.skipped
    );

    if batch.records.is_empty() || rows == 0 {
        println!();
        return;
    }

    println!();
    println!(
        "   {:<10} {:<8} {:<20} {:>10} {:>10} {:>10}",
        "日期", "姓名", "摘要", "各機構金額", "自用金額", "總金額"
    );
    println!("   {}", "─".repeat(74));
    for record in batch.records.iter().take(rows) {
        println!(
            "   {:<10} {:<8} {:<20} {:>10} {:>10} {:>10}",
            record.local_date,
            truncate(&record.person_name, 8),
            truncate(&record.summary_text(), 20),
            format_amount(record.institution_amount),
            format_amount(record.personal_amount),
            format_amount(record.total_amount),
        );
    }
    if batch.accepted() > rows {
        println!("   ... and {} more", batch.accepted() - rows);
    }
    println!();
}
