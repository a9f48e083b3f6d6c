//! Spreadsheet decoding
//!
//! Turns an uploaded file into a [`RawSheet`]: a grid of optional text cells
//! with positions matching the worksheet. Workbooks (xlsx, xlsm, xlsb, xls,
//! ods) go through calamine; `.csv` files through the csv crate. No column
//! meaning is assigned here, that is the job of [`crate::ingest`].

use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};

/// A decoded cell: `None` for blank cells
pub type Cell = Option<String>;

/// Tabular upload content, one `Vec<Cell>` per sheet row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    /// Build a sheet from decoded rows, dropping trailing blank rows
    pub fn new(mut rows: Vec<Vec<Cell>>) -> Self {
        while rows
            .last()
            .is_some_and(|row| row.iter().all(|cell| cell.is_none()))
        {
            rows.pop();
        }
        Self { rows }
    }

    /// Build a sheet from plain text, treating empty strings as blank cells
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|s| text_cell(s.as_ref())).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row, counting trailing blank cells
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

fn text_cell(s: &str) -> Cell {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Decode an upload, choosing the decoder from the file extension
pub fn read_sheet(path: &Path, sheet_index: usize) -> Result<RawSheet> {
    if !path.is_file() {
        return Err(Error::UploadDecode(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let sheet = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, sheet_index)?,
        "csv" => read_csv(std::fs::File::open(path)?)?,
        _ => {
            return Err(Error::UploadDecode(format!(
                "Unsupported file type: .{} (expected .xlsx, .xls, .ods or .csv)",
                extension
            )))
        }
    };

    debug!(
        "Decoded {} rows x {} columns from {}",
        sheet.len(),
        sheet.width(),
        path.display()
    );
    Ok(sheet)
}

/// Decode one worksheet of a workbook file
pub fn read_workbook(path: &Path, sheet_index: usize) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range_at(sheet_index).ok_or_else(|| {
        Error::UploadDecode(format!("Workbook has no sheet at index {}", sheet_index))
    })??;

    Ok(range_to_sheet(&range))
}

/// Convert a calamine range, re-inserting the blank rows and columns that
/// precede the first used cell
fn range_to_sheet(range: &Range<Data>) -> RawSheet {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells: Vec<Cell> = vec![None; col_offset];
        cells.extend(row.iter().map(data_text));
        rows.push(cells);
    }

    RawSheet::new(rows)
}

fn data_text(cell: &Data) -> Cell {
    match cell {
        Data::Empty => None,
        Data::String(s) => text_cell(s),
        other => Some(other.to_string()),
    }
}

/// Decode CSV content; every record is a row, no header handling
pub fn read_csv<R: Read>(reader: R) -> Result<RawSheet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let cells = record
            .iter()
            .enumerate()
            .map(|(j, field)| {
                if i == 0 && j == 0 {
                    text_cell(field.trim_start_matches('\u{feff}'))
                } else {
                    text_cell(field)
                }
            })
            .collect();
        rows.push(cells);
    }

    Ok(RawSheet::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_text_rows_blank_cells() {
        let sheet = RawSheet::from_text_rows([vec!["a", "", "c"], vec!["", "", ""]]);
        // Trailing blank row is trimmed
        assert_eq!(sheet.len(), 1);
        assert_eq!(
            sheet.rows()[0],
            vec![Some("a".to_string()), None, Some("c".to_string())]
        );
    }

    #[test]
    fn test_interior_blank_rows_are_kept() {
        let sheet = RawSheet::from_text_rows([vec!["a"], vec![""], vec!["b"]]);
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.rows()[1], vec![None]);
    }

    #[test]
    fn test_width_uses_widest_row() {
        let sheet = RawSheet::from_text_rows([vec!["a"], vec!["a", "b", "c"], vec!["a", "b"]]);
        assert_eq!(sheet.width(), 3);
        assert_eq!(RawSheet::default().width(), 0);
    }

    #[test]
    fn test_read_csv_ragged_rows() {
        let csv = "\u{feff}title,,\n113.05.20,Alice,taxi,,,100,,100\n,Bob\n";
        let sheet = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.rows()[0][0].as_deref(), Some("title"));
        assert_eq!(sheet.rows()[1].len(), 8);
        assert_eq!(sheet.rows()[1][3], None);
        assert_eq!(sheet.rows()[2], vec![None, Some("Bob".to_string())]);
    }

    #[test]
    fn test_read_sheet_rejects_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "hello").unwrap();

        let err = read_sheet(file.path(), 0).unwrap_err();
        assert!(matches!(err, Error::UploadDecode(_)));
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn test_read_sheet_missing_file() {
        let err = read_sheet(Path::new("/nonexistent/petty.xlsx"), 0).unwrap_err();
        assert!(err.is_upload_failure());
    }

    #[test]
    fn test_read_sheet_csv_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".CSV").tempfile().unwrap();
        write!(file, "a,b\nc,d\n").unwrap();

        let sheet = read_sheet(file.path(), 0).unwrap();
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.rows()[1][1].as_deref(), Some("d"));
    }

    #[test]
    fn test_read_workbook_rejects_corrupt_file() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        write!(file, "this is not a zip archive").unwrap();

        let err = read_sheet(file.path(), 0).unwrap_err();
        assert!(matches!(err, Error::Spreadsheet(_)));
    }
}
