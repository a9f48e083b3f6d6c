//! Domain models for the petty-cash ledger

use chrono::NaiveDate;
use serde::Serialize;

/// One row of the petty-cash ledger
///
/// `total_amount` is always derived from the two component amounts; use
/// [`ExpenseRecord::new`] rather than building the struct by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRecord {
    /// Era-date text as written on the sheet, e.g. `113.05.20`
    pub local_date: String,
    pub person_name: String,
    pub institution_note: String,
    pub delegate_note_a: String,
    pub delegate_note_b: String,
    pub institution_amount: f64,
    pub personal_amount: f64,
    pub total_amount: f64,
    /// `%Y-%m-%d %H:%M:%S`, shared by every row of one import batch
    pub uploaded_at: String,
}

impl ExpenseRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        local_date: impl Into<String>,
        person_name: impl Into<String>,
        institution_note: impl Into<String>,
        delegate_note_a: impl Into<String>,
        delegate_note_b: impl Into<String>,
        institution_amount: f64,
        personal_amount: f64,
        uploaded_at: impl Into<String>,
    ) -> Self {
        Self {
            local_date: local_date.into(),
            person_name: person_name.into(),
            institution_note: institution_note.into(),
            delegate_note_a: delegate_note_a.into(),
            delegate_note_b: delegate_note_b.into(),
            institution_amount,
            personal_amount,
            total_amount: institution_amount + personal_amount,
            uploaded_at: uploaded_at.into(),
        }
    }

    /// The note field belonging to a category
    pub fn note(&self, category: Category) -> &str {
        match category {
            Category::Institution => &self.institution_note,
            Category::DelegateA => &self.delegate_note_a,
            Category::DelegateB => &self.delegate_note_b,
        }
    }

    /// Whether the category's note has any non-whitespace content
    pub fn has_note(&self, category: Category) -> bool {
        !self.note(category).trim().is_empty()
    }

    /// The three notes concatenated, in column order
    pub fn summary_text(&self) -> String {
        let mut summary = String::with_capacity(
            self.institution_note.len() + self.delegate_note_a.len() + self.delegate_note_b.len(),
        );
        summary.push_str(&self.institution_note);
        summary.push_str(&self.delegate_note_a);
        summary.push_str(&self.delegate_note_b);
        summary
    }
}

/// Expense categories, one per note column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// 機構 (institution)
    Institution,
    /// DR莊交辦 (delegated by Dr. Zhuang)
    DelegateA,
    /// DR陳交辦 (delegated by Dr. Chen)
    DelegateB,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Institution => "institution",
            Self::DelegateA => "delegate_a",
            Self::DelegateB => "delegate_b",
        }
    }

    /// Label used on the clerks' sheet
    pub fn label(&self) -> &'static str {
        match self {
            Self::Institution => "機構",
            Self::DelegateA => "DR莊交辦",
            Self::DelegateB => "DR陳交辦",
        }
    }

    pub fn all() -> &'static [Category] {
        &[Self::Institution, Self::DelegateA, Self::DelegateB]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "institution" | "機構" => Ok(Self::Institution),
            "delegate_a" | "delegate-a" | "dr莊交辦" => Ok(Self::DelegateA),
            "delegate_b" | "delegate-b" | "dr陳交辦" => Ok(Self::DelegateB),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of normalizing one upload, before it is committed
#[derive(Debug, Clone)]
pub struct ImportBatch {
    /// Rows that passed date validation, in sheet order
    pub records: Vec<ExpenseRecord>,
    /// Data rows dropped because of a missing or malformed date
    pub skipped: usize,
    /// Data rows examined (accepted + skipped)
    pub total_rows: usize,
    pub uploaded_at: String,
}

impl ImportBatch {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }
}

/// A ledger row that survived query filtering, with derived display columns
#[derive(Debug, Clone, Serialize)]
pub struct QueryRow {
    #[serde(flatten)]
    pub record: ExpenseRecord,
    pub local_date_parsed: NaiveDate,
    pub summary_text: String,
    pub local_date_display: String,
}

/// Filtered rows plus aggregates
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub rows: Vec<QueryRow>,
    pub row_count: usize,
    pub grand_total: f64,
    /// The inclusive range that was applied
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Aggregate numbers over the whole ledger
#[derive(Debug, Clone)]
pub struct LedgerStats {
    pub total_records: i64,
    pub total_amount: f64,
    pub last_uploaded_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str_accepts_keys_and_labels() {
        for &category in Category::all() {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
            assert_eq!(category.label().parse::<Category>(), Ok(category));
        }
        assert_eq!("delegate-a".parse::<Category>(), Ok(Category::DelegateA));
        assert!("misc".parse::<Category>().is_err());
    }

    #[test]
    fn test_has_note_ignores_whitespace() {
        let record = ExpenseRecord::new("113.01.02", "A", "  ", "計程車", "", 1.0, 2.0, "");
        assert!(!record.has_note(Category::Institution));
        assert!(record.has_note(Category::DelegateA));
        assert_eq!(record.summary_text(), "  計程車");
        assert_eq!(record.total_amount, 3.0);
    }
}
