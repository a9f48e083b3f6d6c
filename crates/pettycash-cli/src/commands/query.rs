//! Query command implementations (query, names)

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pettycash_core::{
    db::Database,
    era_date,
    models::{Category, QueryReport},
    query::{format_grand_total, person_options, run_query, QueryFilter, QueryOutcome},
    Settings,
};

use super::{format_amount, truncate};
use crate::cli::{DateRangeArgs, FilterArgs};

/// Parse a --from/--to value, era or ISO
fn parse_date_arg(flag: &str, value: &str) -> Result<NaiveDate> {
    era_date::parse_user_date(value).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid {} date: {} (use 113.05.20 or 2024-05-20)",
            flag,
            value
        )
    })
}

/// Build a filter holding only the date bounds
pub fn build_range_filter(range: &DateRangeArgs) -> Result<QueryFilter> {
    let from = range
        .from
        .as_deref()
        .map(|s| parse_date_arg("--from", s))
        .transpose()?;
    let to = range
        .to
        .as_deref()
        .map(|s| parse_date_arg("--to", s))
        .transpose()?;
    Ok(QueryFilter::new().between(from, to))
}

/// Build a query filter from command-line criteria
pub fn build_filter(args: &FilterArgs) -> Result<QueryFilter> {
    let selected = [
        (args.institution, Category::Institution),
        (args.delegate_a, Category::DelegateA),
        (args.delegate_b, Category::DelegateB),
    ];

    Ok(build_range_filter(&args.range)?
        .person(args.person.as_deref())
        .categories(
            selected
                .into_iter()
                .filter(|(on, _)| *on)
                .map(|(_, category)| category),
        ))
}

/// Run a query against the ledger
///
/// Returns `None` when no stored record has a recognizable date.
pub fn query_ledger(db: &Database, filter: &QueryFilter) -> Result<Option<QueryReport>> {
    let records = db.read_all().context("Failed to read ledger")?;
    match run_query(records, filter) {
        QueryOutcome::Report(report) => Ok(Some(report)),
        QueryOutcome::NoDatedRecords => Ok(None),
    }
}

/// Render a report as the row-count line, a numbered table and the grand total
pub fn render_report(
    report: &QueryReport,
    filter: &QueryFilter,
    currency_unit: &str,
) -> Result<String> {
    let mut out = String::new();

    writeln!(
        out,
        "📋 {} rows ({} to {})",
        report.row_count,
        era_date::format(report.date_from),
        era_date::format(report.date_to)
    )?;
    if !filter.categories.is_empty() {
        let labels: Vec<&str> = filter.categories.iter().map(|c| c.label()).collect();
        writeln!(out, "   類別：{}", labels.join(", "))?;
    }

    if report.rows.is_empty() {
        writeln!(out, "   No matching records")?;
    } else {
        writeln!(out)?;
        writeln!(
            out,
            "   {:>4}  {:<10} {:<8} {:<24} {:>10} {:>10} {:>10}  {}",
            "#", "民國日期", "姓名", "摘要", "各機構金額", "自用金額", "總金額", "上傳時間"
        )?;
        writeln!(out, "   {}", "─".repeat(100))?;
        for (i, row) in report.rows.iter().enumerate() {
            writeln!(
                out,
                "   {:>4}  {:<10} {:<8} {:<24} {:>10} {:>10} {:>10}  {}",
                i + 1,
                row.local_date_display,
                truncate(&row.record.person_name, 8),
                truncate(&row.summary_text, 24),
                format_amount(row.record.institution_amount),
                format_amount(row.record.personal_amount),
                format_amount(row.record.total_amount),
                row.record.uploaded_at,
            )?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "   總金額合計：{}",
        format_grand_total(report.grand_total, currency_unit)
    )?;
    Ok(out)
}

pub fn cmd_query(
    db: &Database,
    filter: &QueryFilter,
    settings: &Settings,
    json: bool,
) -> Result<()> {
    let Some(report) = query_ledger(db, filter)? else {
        println!("⚠️  No records with a valid date in the ledger; nothing to query");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    print!("{}", render_report(&report, filter, &settings.display.currency_unit)?);
    println!();

    Ok(())
}

/// Names available to --person, one per line
pub fn render_names(names: &[String]) -> Result<String> {
    let mut out = String::new();
    if names.is_empty() {
        writeln!(out, "No names found")?;
        return Ok(out);
    }

    writeln!(out, "👤 {} names:", names.len())?;
    for name in names {
        writeln!(out, "   {}", name)?;
    }
    Ok(out)
}

pub fn cmd_names(db: &Database, filter: &QueryFilter) -> Result<()> {
    let records = db.read_all().context("Failed to read ledger")?;
    print!("{}", render_names(&person_options(&records, filter))?);
    Ok(())
}
