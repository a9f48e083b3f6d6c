//! Ledger queries
//!
//! A query always runs over the full record set:
//!
//! 1. Annotate each record with its parsed era date; records whose date does
//!    not parse are left out
//! 2. Keep records inside the inclusive date range (by default the span of
//!    all parseable dates)
//! 3. Keep records for the selected person, if any
//! 4. Keep records with a note in ANY of the selected categories (no
//!    categories selected means no category filtering)
//! 5. Derive the summary text and display date, then total the amounts
//!
//! When no record has a parseable date the query stops before filtering and
//! reports [`QueryOutcome::NoDatedRecords`].

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::era_date;
use crate::models::{Category, ExpenseRecord, QueryReport, QueryRow};

/// Person selector values meaning "everyone"
pub const ALL_PEOPLE: [&str; 2] = ["all", "全部"];

/// Criteria for a ledger query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    /// Inclusive lower bound; `None` uses the earliest date in the data
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound; `None` uses the latest date in the data
    pub date_to: Option<NaiveDate>,
    /// Exact person name; `None` matches everyone
    pub person: Option<String>,
    /// Categories combined with OR
    pub categories: BTreeSet<Category>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both inclusive bounds
    pub fn date_range(self, range: Option<(NaiveDate, NaiveDate)>) -> Self {
        let (from, to) = range.unzip();
        self.between(from, to)
    }

    /// Set either inclusive bound; an unset bound follows the data
    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// The applied range, given the span of the data
    fn resolve_range(&self, bounds: (NaiveDate, NaiveDate)) -> (NaiveDate, NaiveDate) {
        (
            self.date_from.unwrap_or(bounds.0),
            self.date_to.unwrap_or(bounds.1),
        )
    }

    /// Set the person filter; blank or an [`ALL_PEOPLE`] value clears it
    pub fn person(mut self, person: Option<&str>) -> Self {
        self.person = person
            .filter(|p| !p.trim().is_empty() && !ALL_PEOPLE.contains(p))
            .map(str::to_string);
        self
    }

    /// Add a category to the OR set
    pub fn category(mut self, category: Category) -> Self {
        self.categories.insert(category);
        self
    }

    /// Add several categories to the OR set
    pub fn categories<I: IntoIterator<Item = Category>>(mut self, categories: I) -> Self {
        self.categories.extend(categories);
        self
    }

    fn matches_person(&self, record: &ExpenseRecord) -> bool {
        self.person
            .as_deref()
            .map_or(true, |person| record.person_name == person)
    }

    fn matches_categories(&self, record: &ExpenseRecord) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|&c| record.has_note(c))
    }
}

/// A stored record with its parsed date, if the date parses
#[derive(Debug, Clone)]
pub struct DatedRecord {
    pub record: ExpenseRecord,
    pub date: Option<NaiveDate>,
}

/// Result of running a query
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// No record carries a parseable date; nothing was filtered
    NoDatedRecords,
    Report(QueryReport),
}

impl QueryOutcome {
    pub fn report(&self) -> Option<&QueryReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::NoDatedRecords => None,
        }
    }
}

/// Parse the era date of every record
pub fn annotate(records: Vec<ExpenseRecord>) -> Vec<DatedRecord> {
    records
        .into_iter()
        .map(|record| DatedRecord {
            date: era_date::parse(&record.local_date),
            record,
        })
        .collect()
}

/// Earliest and latest parseable date, `None` when there are none
pub fn date_bounds(records: &[DatedRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = records.iter().filter_map(|r| r.date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(min, max), d| (min.min(d), max.max(d))))
}

/// Run a query over the full record set
pub fn run_query(records: Vec<ExpenseRecord>, filter: &QueryFilter) -> QueryOutcome {
    let annotated = annotate(records);

    let Some(bounds) = date_bounds(&annotated) else {
        warn!(
            "None of the {} records has a recognizable date",
            annotated.len()
        );
        return QueryOutcome::NoDatedRecords;
    };
    let (from, to) = filter.resolve_range(bounds);
    let examined = annotated.len();

    let rows: Vec<QueryRow> = annotated
        .into_iter()
        .filter_map(|dated| {
            let date = dated.date?;
            let record = dated.record;
            if date < from || date > to {
                return None;
            }
            if !filter.matches_person(&record) || !filter.matches_categories(&record) {
                return None;
            }
            Some(QueryRow {
                summary_text: record.summary_text(),
                local_date_display: era_date::format(date),
                local_date_parsed: date,
                record,
            })
        })
        .collect();

    let grand_total = rows.iter().map(|row| row.record.total_amount).sum();
    debug!(
        "Query {} to {}: {} of {} records matched",
        from,
        to,
        rows.len(),
        examined
    );

    QueryOutcome::Report(QueryReport {
        row_count: rows.len(),
        rows,
        grand_total,
        date_from: from,
        date_to: to,
    })
}

/// Names available to the person selector
///
/// Distinct non-blank names among records whose date falls inside the
/// filter's date range, in order of first appearance. Person and category
/// criteria of the filter are ignored.
pub fn person_options(records: &[ExpenseRecord], filter: &QueryFilter) -> Vec<String> {
    let dated: Vec<(NaiveDate, &ExpenseRecord)> = records
        .iter()
        .filter_map(|r| era_date::parse(&r.local_date).map(|d| (d, r)))
        .collect();

    let Some(first) = dated.first().map(|(d, _)| *d) else {
        return Vec::new();
    };
    let bounds = dated
        .iter()
        .fold((first, first), |(min, max), (d, _)| (min.min(*d), max.max(*d)));
    let (from, to) = filter.resolve_range(bounds);

    let mut seen = HashSet::new();
    dated
        .into_iter()
        .filter(|(d, _)| *d >= from && *d <= to)
        .map(|(_, r)| r.person_name.as_str())
        .filter(|name| !name.trim().is_empty())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Group the integer part of a value with thousands separators
///
/// Rounds half to even, so `2.5` becomes `2` and `3.5` becomes `4`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round_ties_even();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Grand total line value, e.g. `12,345 元`
pub fn format_grand_total(total: f64, unit: &str) -> String {
    format!("{} {}", format_thousands(total), unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: &str, person: &str, notes: [&str; 3], total: f64) -> ExpenseRecord {
        ExpenseRecord::new(
            date,
            person,
            notes[0],
            notes[1],
            notes[2],
            total,
            0.0,
            "2024-06-01 09:30:00",
        )
    }

    fn report(outcome: QueryOutcome) -> QueryReport {
        match outcome {
            QueryOutcome::Report(report) => report,
            QueryOutcome::NoDatedRecords => panic!("expected a report"),
        }
    }

    fn sample() -> Vec<ExpenseRecord> {
        vec![
            record("113.01.05", "王小明", ["文具", "", ""], 100.0),
            record("113.02.10", "李大華", ["", "計程車", ""], 250.0),
            record("113.03.15", "王小明", ["", "", "郵資"], 75.0),
            record("bad-date", "王小明", ["文具", "", ""], 1000.0),
            record("113.04.20", "陳美玲", ["", "", ""], 40.0),
        ]
    }

    #[test]
    fn test_default_range_spans_data_and_drops_unparseable() {
        let report = report(run_query(sample(), &QueryFilter::new()));
        assert_eq!(report.row_count, 4);
        assert_eq!(report.date_from, ymd(2024, 1, 5));
        assert_eq!(report.date_to, ymd(2024, 4, 20));
        assert!(report.rows.iter().all(|r| r.record.local_date != "bad-date"));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filter =
            QueryFilter::new().date_range(Some((ymd(2024, 2, 10), ymd(2024, 3, 15))));
        let report = report(run_query(sample(), &filter));

        let dates: Vec<&str> = report
            .rows
            .iter()
            .map(|r| r.record.local_date.as_str())
            .collect();
        assert_eq!(dates, vec!["113.02.10", "113.03.15"]);
    }

    #[test]
    fn test_open_ended_range() {
        let filter = QueryFilter::new().between(Some(ymd(2024, 3, 1)), None);
        let report = report(run_query(sample(), &filter));
        assert_eq!(report.row_count, 2);
        assert_eq!(report.date_from, ymd(2024, 3, 1));
        assert_eq!(report.date_to, ymd(2024, 4, 20));

        let filter = QueryFilter::new().between(None, Some(ymd(2024, 1, 31)));
        let report = self::report(run_query(sample(), &filter));
        assert_eq!(report.row_count, 1);
        assert_eq!(report.date_from, ymd(2024, 1, 5));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let filter = QueryFilter::new().date_range(Some((ymd(2024, 3, 1), ymd(2024, 2, 1))));
        let report = report(run_query(sample(), &filter));
        assert_eq!(report.row_count, 0);
        assert_eq!(report.grand_total, 0.0);
    }

    #[test]
    fn test_person_filter() {
        let filter = QueryFilter::new().person(Some("王小明"));
        let report = report(run_query(sample(), &filter));
        assert_eq!(report.row_count, 2);
        assert_eq!(report.grand_total, 175.0);
    }

    #[test]
    fn test_person_sentinels_disable_filter() {
        for sentinel in ["all", "全部", "", "  "] {
            let filter = QueryFilter::new().person(Some(sentinel));
            assert_eq!(filter.person, None);
            let report = report(run_query(sample(), &filter));
            assert_eq!(report.row_count, 4);
        }
    }

    #[test]
    fn test_categories_combine_with_or() {
        let only_delegate_a = vec![record("113.01.05", "A", ["", "計程車", ""], 10.0)];

        let excluded = QueryFilter::new()
            .category(Category::Institution)
            .category(Category::DelegateB);
        assert_eq!(
            report(run_query(only_delegate_a.clone(), &excluded)).row_count,
            0
        );

        let included = QueryFilter::new()
            .category(Category::Institution)
            .category(Category::DelegateA);
        assert_eq!(report(run_query(only_delegate_a, &included)).row_count, 1);
    }

    #[test]
    fn test_no_categories_means_no_category_filter() {
        let report = report(run_query(sample(), &QueryFilter::new()));
        // The record without any note is still present
        assert!(report.rows.iter().any(|r| r.record.person_name == "陳美玲"));
    }

    #[test]
    fn test_category_note_must_be_non_blank() {
        let records = vec![record("113.01.05", "A", ["   ", "", ""], 10.0)];
        let filter = QueryFilter::new().category(Category::Institution);
        assert_eq!(report(run_query(records, &filter)).row_count, 0);
    }

    #[test]
    fn test_all_categories_selected() {
        let filter = QueryFilter::new().categories(Category::all().iter().copied());
        let report = report(run_query(sample(), &filter));
        assert_eq!(report.row_count, 3);
    }

    #[test]
    fn test_grand_total() {
        let filter = QueryFilter::new().date_range(Some((ymd(2024, 1, 1), ymd(2024, 3, 31))));
        let report = report(run_query(sample(), &filter));
        assert_eq!(report.row_count, 3);
        assert_eq!(report.grand_total, 425.0);
    }

    #[test]
    fn test_derived_columns() {
        let records = vec![record("113.5.2", "A", ["機構", "莊", "陳"], 10.0)];
        let report = report(run_query(records, &QueryFilter::new()));

        let row = &report.rows[0];
        assert_eq!(row.summary_text, "機構莊陳");
        assert_eq!(row.local_date_parsed, ymd(2024, 5, 2));
        assert_eq!(row.local_date_display, "113.05.02");
        // The stored text is untouched
        assert_eq!(row.record.local_date, "113.5.2");
    }

    #[test]
    fn test_no_dated_records() {
        let records = vec![
            record("abc", "A", ["", "", ""], 10.0),
            record("113.13.40", "A", ["", "", ""], 10.0),
        ];
        let outcome = run_query(records, &QueryFilter::new());
        assert!(matches!(outcome, QueryOutcome::NoDatedRecords));
        assert!(outcome.report().is_none());

        let outcome = run_query(Vec::new(), &QueryFilter::new());
        assert!(matches!(outcome, QueryOutcome::NoDatedRecords));
    }

    #[test]
    fn test_date_bounds() {
        let annotated = annotate(sample());
        assert_eq!(
            date_bounds(&annotated),
            Some((ymd(2024, 1, 5), ymd(2024, 4, 20)))
        );
        assert_eq!(date_bounds(&[]), None);
    }

    #[test]
    fn test_person_options() {
        let mut records = sample();
        records.push(record("113.02.11", "", ["", "", ""], 1.0));
        records.push(record("113.02.12", "李大華", ["", "", ""], 1.0));

        assert_eq!(
            person_options(&records, &QueryFilter::new()),
            vec!["王小明", "李大華", "陳美玲"]
        );
        let february_to_march =
            QueryFilter::new().date_range(Some((ymd(2024, 2, 1), ymd(2024, 3, 31))));
        assert_eq!(
            person_options(&records, &february_to_march),
            vec!["李大華", "王小明"]
        );
        let from_april = QueryFilter::new().between(Some(ymd(2024, 4, 1)), None);
        assert_eq!(person_options(&records, &from_april), vec!["陳美玲"]);
        assert!(person_options(&[], &QueryFilter::new()).is_empty());
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(425.0), "425");
        assert_eq!(format_thousands(1234.0), "1,234");
        assert_eq!(format_thousands(1234567.4), "1,234,567");
        assert_eq!(format_thousands(-98765.0), "-98,765");
        assert_eq!(format_thousands(2.5), "2");
        assert_eq!(format_thousands(3.5), "4");
        assert_eq!(format_thousands(999.6), "1,000");
    }

    #[test]
    fn test_format_grand_total() {
        assert_eq!(format_grand_total(12345.0, "元"), "12,345 元");
    }
}
