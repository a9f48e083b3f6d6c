//! Petty-cash CLI - clinic petty-cash ledger
//!
//! Usage:
//!   pettycash init                          Initialize the ledger
//!   pettycash import --file 零用金.xlsx      Import a clerks' sheet
//!   pettycash query --from 113.01.01        Query the ledger
//!   pettycash export --output out.csv       Export query results

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let settings = commands::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import {
            file,
            yes,
            dry_run,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &file, &settings, yes, dry_run)
        }
        Commands::Query { filter, json } => {
            let filter = commands::build_filter(&filter)?;
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_query(&db, &filter, &settings, json)
        }
        Commands::Names { range } => {
            let filter = commands::build_range_filter(&range)?;
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_names(&db, &filter)
        }
        Commands::Export {
            output,
            format,
            filter,
        } => {
            let filter = commands::build_filter(&filter)?;
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_export(&db, &output, &format, &filter)
        }
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt),
    }
}
