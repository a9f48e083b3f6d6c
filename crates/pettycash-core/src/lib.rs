//! Petty-cash Core Library
//!
//! Shared functionality for the petty-cash ledger:
//! - Era (民國) date parsing and formatting
//! - Spreadsheet and CSV upload decoding
//! - Import normalization (forward-fill, amount coercion, date validation)
//! - Encrypted ledger storage with an append-only batch writer
//! - Query filtering by date range, person and category
//! - CSV/JSON export of query results
//! - Layered settings (embedded defaults + override file)

pub mod config;
pub mod db;
pub mod era_date;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod query;
pub mod sheet;

pub use config::{DisplaySettings, Settings};
pub use db::Database;
pub use error::{Error, Result};
pub use export::ExportFormat;
pub use ingest::ImportLayout;
pub use models::{Category, ExpenseRecord, ImportBatch, LedgerStats, QueryReport, QueryRow};
pub use query::{QueryFilter, QueryOutcome};
