//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Petty-cash ledger - import clerks' sheets and query the ledger
#[derive(Parser)]
#[command(name = "pettycash")]
#[command(about = "Petty-cash ledger for clinic expense sheets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "pettycash.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the ledger is encrypted using SQLCipher.
    /// Set PETTYCASH_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Settings file (defaults to ~/.local/share/pettycash/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the ledger
    Init,

    /// Import a petty-cash sheet (.xlsx, .xls, .ods or .csv)
    Import {
        /// Sheet file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Commit without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Show the preview only, do not write anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Query the ledger
    Query {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the names available to --person for a date range
    Names {
        #[command(flatten)]
        range: DateRangeArgs,
    },

    /// Export query results to a file
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: csv, json
        #[arg(long, default_value = "csv")]
        format: String,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show ledger status
    Status,
}

/// Inclusive date bounds; both default to the span of the ledger
#[derive(Args, Debug, Clone, Default)]
pub struct DateRangeArgs {
    /// Start date, era (113.01.01) or ISO (2024-01-01)
    #[arg(long)]
    pub from: Option<String>,

    /// End date, era (113.12.31) or ISO (2024-12-31)
    #[arg(long)]
    pub to: Option<String>,
}

/// Query criteria shared by `query` and `export`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[command(flatten)]
    pub range: DateRangeArgs,

    /// Only this person ("all" or "全部" for everyone)
    #[arg(short, long)]
    pub person: Option<String>,

    /// Rows with an institution (機構) note
    #[arg(long)]
    pub institution: bool,

    /// Rows with a DR莊交辦 note
    #[arg(long)]
    pub delegate_a: bool,

    /// Rows with a DR陳交辦 note
    #[arg(long)]
    pub delegate_b: bool,
}
