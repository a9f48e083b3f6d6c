//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db, load_settings)
//! - `export` - Export of query results to CSV or JSON files
//! - `import` - Sheet import with preview and confirmation
//! - `query` - Ledger queries and the person list
//! - `status` - Ledger status

pub mod core;
pub mod export;
pub mod import;
pub mod query;
pub mod status;

// Re-export command functions for main.rs
pub use self::core::*;
pub use export::*;
pub use import::*;
pub use query::*;
pub use status::*;

use pettycash_core::query::format_thousands;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Amount for display: grouped integer, or two decimals when there are cents
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        return format_thousands(value);
    }

    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_at(fixed.len() - 3);
    let sign = if value < 0.0 { "-" } else { "" };
    format!(
        "{}{}{}",
        sign,
        format_thousands(whole.parse().unwrap_or_default()),
        cents
    )
}
