//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the ledger
//! - `load_settings` - Shared utility to resolve the settings file
//! - `cmd_init` - Initialize the ledger

use std::path::Path;

use anyhow::{Context, Result};
use pettycash_core::{db::Database, Settings};
use tracing::debug;

/// Open the ledger with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path.to_string_lossy();
    debug!("Opening ledger {} (encrypted: {})", path_str, !no_encrypt);
    if no_encrypt {
        Database::new_unencrypted(&path_str).context("Failed to open ledger (unencrypted)")
    } else {
        Database::new(&path_str).context("Failed to open ledger")
    }
}

/// Load settings from --config, the data-dir override or the built-in defaults
pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let settings = Settings::load(config).context("Failed to load settings")?;
    debug!(
        "Import layout: skip {} rows, header row {}, sheet {}",
        settings.import.skip_rows, settings.import.header_row, settings.import.sheet_index
    );
    Ok(settings)
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing ledger at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;
    let count = db.count_records().context("Failed to read ledger")?;
    println!("   Records: {}", count);

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    db.close();

    println!("✅ Ledger initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import a sheet: pettycash import --file 零用金.xlsx");
    println!("  2. Query the ledger: pettycash query --from 113.01.01 --to 113.12.31");

    Ok(())
}
