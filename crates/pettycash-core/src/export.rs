//! Export of query results
//!
//! Supports:
//! - CSV with the same columns as the on-screen table, numbered from 1
//! - Pretty JSON of the whole report, including the grand total

use crate::error::{Error, Result};
use crate::models::QueryReport;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown export format: {} (expected csv or json)", s)),
        }
    }
}

/// Header of the CSV export
pub const CSV_HEADER: [&str; 8] = [
    "序號",
    "民國日期",
    "姓名",
    "摘要",
    "各機構金額",
    "自用金額",
    "總金額",
    "上傳時間",
];

/// Render a report in the requested format
pub fn render(report: &QueryReport, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => report_to_csv(report),
        ExportFormat::Json => report_to_json(report),
    }
}

/// Render the report rows as CSV
pub fn report_to_csv(report: &QueryReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for (i, row) in report.rows.iter().enumerate() {
        let record = &row.record;
        writer.write_record([
            (i + 1).to_string(),
            row.local_date_display.clone(),
            record.person_name.clone(),
            row.summary_text.clone(),
            record.institution_amount.to_string(),
            record.personal_amount.to_string(),
            record.total_amount.to_string(),
            record.uploaded_at.clone(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("CSV is not UTF-8: {}", e)))
}

/// Render the whole report as pretty JSON
pub fn report_to_json(report: &QueryReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseRecord;
    use crate::query::{run_query, QueryFilter, QueryOutcome};

    fn sample_report() -> QueryReport {
        let records = vec![
            ExpenseRecord::new(
                "113.01.05",
                "王小明",
                "文具, 影印",
                "",
                "",
                100.0,
                20.0,
                "2024-06-01 09:30:00",
            ),
            ExpenseRecord::new(
                "113.1.6",
                "",
                "",
                "計程車",
                "",
                0.0,
                250.5,
                "2024-06-01 09:30:00",
            ),
        ];
        match run_query(records, &QueryFilter::new()) {
            QueryOutcome::Report(report) => report,
            QueryOutcome::NoDatedRecords => panic!("expected a report"),
        }
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_csv_export() {
        let csv = report_to_csv(&sample_report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "序號,民國日期,姓名,摘要,各機構金額,自用金額,總金額,上傳時間"
        );
        // Notes containing commas are quoted
        assert_eq!(
            lines[1],
            "1,113.01.05,王小明,\"文具, 影印\",100,20,120,2024-06-01 09:30:00"
        );
        // The display date is normalized to two-digit month and day
        assert_eq!(lines[2], "2,113.01.06,,計程車,0,250.5,250.5,2024-06-01 09:30:00");
    }

    #[test]
    fn test_csv_export_empty_report() {
        let mut report = sample_report();
        report.rows.clear();
        report.row_count = 0;

        let csv = report_to_csv(&report).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_json_export() {
        let json = report_to_json(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["row_count"], 2);
        assert_eq!(value["grand_total"], 370.5);
        assert_eq!(value["date_from"], "2024-01-05");
        assert_eq!(value["rows"][0]["person_name"], "王小明");
        assert_eq!(value["rows"][0]["summary_text"], "文具, 影印");
        assert_eq!(value["rows"][1]["local_date_display"], "113.01.06");
    }

    #[test]
    fn test_render_dispatches_on_format() {
        let report = sample_report();
        assert!(render(&report, ExportFormat::Csv).unwrap().starts_with("序號"));
        assert!(render(&report, ExportFormat::Json).unwrap().starts_with('{'));
    }
}
