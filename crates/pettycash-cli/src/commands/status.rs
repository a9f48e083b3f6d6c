//! Status command implementation

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use pettycash_core::db::{Database, DB_KEY_ENV};

use super::{format_amount, open_db};

/// Encryption state and ledger totals of an open ledger
pub fn ledger_summary(db: &Database) -> Result<String> {
    let stats = db.ledger_stats().context("Failed to read ledger")?;

    let mut out = String::new();
    if db.is_encrypted() {
        writeln!(out, "   🔒 Encryption: ENABLED")?;
    } else {
        writeln!(out, "   ⚠️  Encryption: DISABLED")?;
    }
    writeln!(out)?;
    writeln!(out, "   Records: {}", stats.total_records)?;
    writeln!(out, "   Total amount: {}", format_amount(stats.total_amount))?;
    writeln!(
        out,
        "   Last upload: {}",
        stats.last_uploaded_at.as_deref().unwrap_or("(none)")
    )?;
    Ok(out)
}

pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!();
    println!("📊 Petty-cash Ledger Status");
    println!("   ─────────────────────────────────────────────────────────────");

    println!("   Database: {}", db_path.display());

    if !db_path.exists() {
        println!("   Size: (ledger not initialized)");
        println!();
        return Ok(());
    }

    if let Ok(metadata) = std::fs::metadata(db_path) {
        let size_kb = metadata.len() as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.1} MB", size_kb / 1024.0);
        }
    }

    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    match open_db(db_path, no_encrypt).and_then(|db| ledger_summary(&db)) {
        Ok(summary) => print!("{}", summary),
        Err(e) => {
            println!();
            println!("   ❌ Error opening ledger: {}", e);
            if !no_encrypt && !has_key {
                println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
            } else if has_key {
                println!("      (Check if {} is correct)", DB_KEY_ENV);
            }
        }
    }

    println!();
    Ok(())
}
