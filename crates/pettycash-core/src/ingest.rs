//! Upload normalization
//!
//! Converts a decoded petty-cash sheet into [`ExpenseRecord`]s:
//!
//! 1. Skip the preamble rows (and the column-title row, if the layout has one)
//! 2. Read the first 8 columns positionally as date, person, three notes,
//!    institution amount, personal amount and the sheet's own total
//! 3. Forward-fill blank person cells from the row above
//! 4. Coerce amounts to numbers (anything unparseable becomes 0)
//! 5. Recompute the total; the sheet's total column is never trusted
//! 6. Stamp every row with the same upload time
//! 7. Keep only rows whose date is a well-formed era date
//!
//! Rows failing step 7 are counted, not reported individually. Structural
//! problems (too few columns, no header row) fail the whole upload.

use std::path::Path;

use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::era_date;
use crate::error::{Error, Result};
use crate::models::{ExpenseRecord, ImportBatch};
use crate::sheet::{self, Cell, RawSheet};

/// Number of leading columns read from each row
pub const COLUMN_COUNT: usize = 8;

/// Format of the `uploaded_at` stamp
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where the data starts in an uploaded workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImportLayout {
    /// Preamble rows above the column titles (report title, unit, period)
    pub skip_rows: usize,
    /// Whether a column-title row follows the preamble
    pub header_row: bool,
    /// Worksheet to read, 0-based
    pub sheet_index: usize,
}

impl Default for ImportLayout {
    fn default() -> Self {
        Self {
            skip_rows: 3,
            header_row: true,
            sheet_index: 0,
        }
    }
}

/// One data row with its columns named
struct SheetRow<'a> {
    date: Option<&'a str>,
    person: Option<&'a str>,
    institution_note: Option<&'a str>,
    delegate_note_a: Option<&'a str>,
    delegate_note_b: Option<&'a str>,
    institution_amount: Option<&'a str>,
    personal_amount: Option<&'a str>,
    raw_total: Option<&'a str>,
}

impl<'a> SheetRow<'a> {
    fn from_cells(cells: &'a [Cell]) -> Self {
        let get = move |i: usize| cells.get(i).and_then(|c| c.as_deref());
        Self {
            date: get(0),
            person: get(1),
            institution_note: get(2),
            delegate_note_a: get(3),
            delegate_note_b: get(4),
            institution_amount: get(5),
            personal_amount: get(6),
            raw_total: get(7),
        }
    }
}

/// Decode and normalize an uploaded file, stamping it with the current time
pub fn load_upload(path: &Path, layout: &ImportLayout) -> Result<ImportBatch> {
    let sheet = sheet::read_sheet(path, layout.sheet_index)?;
    normalize_sheet(&sheet, layout, Local::now().naive_local())
}

/// Normalize a decoded sheet into an import batch
pub fn normalize_sheet(
    sheet: &RawSheet,
    layout: &ImportLayout,
    uploaded_at: NaiveDateTime,
) -> Result<ImportBatch> {
    let mut data_start = layout.skip_rows;
    if layout.header_row {
        if sheet.len() <= layout.skip_rows {
            return Err(Error::UploadDecode(format!(
                "No column header row found after skipping {} rows",
                layout.skip_rows
            )));
        }
        data_start += 1;
    }

    let width = sheet
        .rows()
        .iter()
        .skip(layout.skip_rows)
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    if width < COLUMN_COUNT {
        return Err(Error::UploadDecode(format!(
            "Expected at least {} columns, found {}",
            COLUMN_COUNT, width
        )));
    }

    let uploaded_at = uploaded_at.format(TIMESTAMP_FORMAT).to_string();
    let rows: Vec<SheetRow> = sheet
        .rows()
        .iter()
        .skip(data_start)
        .map(|cells| SheetRow::from_cells(cells))
        .collect();

    // Names carry across rows that are dropped later
    let persons = forward_fill(rows.iter().map(|row| row.person));

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    let mut total_mismatches = 0;

    for (row, person) in rows.iter().zip(persons) {
        let institution_amount = coerce_amount(row.institution_amount);
        let personal_amount = coerce_amount(row.personal_amount);

        let date = match row.date.filter(|d| era_date::is_canonical(d)) {
            Some(date) => date,
            None => {
                skipped += 1;
                continue;
            }
        };

        let record = ExpenseRecord::new(
            date,
            person,
            clean_note(row.institution_note),
            clean_note(row.delegate_note_a),
            clean_note(row.delegate_note_b),
            institution_amount,
            personal_amount,
            uploaded_at.as_str(),
        );

        if let Some(sheet_total) = row.raw_total.and_then(parse_amount) {
            if (sheet_total - record.total_amount).abs() > f64::EPSILON {
                total_mismatches += 1;
            }
        }

        records.push(record);
    }

    if total_mismatches > 0 {
        debug!(
            "{} rows have a sheet total that differs from the recomputed total",
            total_mismatches
        );
    }
    if skipped > 0 {
        warn!("Skipped {} rows without a valid era date", skipped);
    }
    debug!(
        "Normalized {} rows: {} accepted, {} skipped",
        rows.len(),
        records.len(),
        skipped
    );

    Ok(ImportBatch {
        records,
        skipped,
        total_rows: rows.len(),
        uploaded_at,
    })
}

/// Fill blank values with the nearest non-blank value above them
///
/// Blank means absent or whitespace-only. Leading blanks with nothing above
/// them come back as empty strings.
pub fn forward_fill<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut last: Option<String> = None;
    values
        .into_iter()
        .map(|value| {
            match value {
                Some(v) if !v.as_ref().trim().is_empty() => {
                    last = Some(v.as_ref().to_string());
                }
                _ => {}
            }
            last.clone().unwrap_or_default()
        })
        .collect()
}

/// Numeric value of an amount cell, 0.0 when it is blank or not a number
pub fn coerce_amount(cell: Option<&str>) -> f64 {
    cell.and_then(parse_amount).unwrap_or(0.0)
}

fn parse_amount(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn clean_note(cell: Option<&str>) -> String {
    cell.map(|s| s.trim().to_string()).unwrap_or_default()
}
