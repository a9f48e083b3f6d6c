//! Ledger operations
//!
//! The ledger is append-only: rows arrive in whole batches and are never
//! updated or deleted.

use rusqlite::{params, Row};
use tracing::{debug, info};

use super::Database;
use crate::error::Result;
use crate::models::{ExpenseRecord, LedgerStats};

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ExpenseRecord> {
    let text = |i: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
    };
    let amount =
        |i: usize| -> rusqlite::Result<f64> { Ok(row.get::<_, Option<f64>>(i)?.unwrap_or(0.0)) };

    Ok(ExpenseRecord {
        local_date: text(0)?,
        person_name: text(1)?,
        institution_note: text(2)?,
        delegate_note_a: text(3)?,
        delegate_note_b: text(4)?,
        institution_amount: amount(5)?,
        personal_amount: amount(6)?,
        total_amount: amount(7)?,
        uploaded_at: text(8)?,
    })
}

impl Database {
    /// Append a batch of records in one transaction
    ///
    /// Either every record of the batch is stored or, on error, none is.
    pub fn append_batch(&self, records: &[ExpenseRecord]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO petty_cash (日期, 姓名, 機構摘要, 莊交辦摘要, 陳交辦摘要, 各機構金額, 自用金額, 總金額, 上傳時間)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;

            for record in records {
                // A name that could not be filled is stored as NULL
                let person = Some(record.person_name.as_str()).filter(|p| !p.is_empty());
                stmt.execute(params![
                    record.local_date,
                    person,
                    record.institution_note,
                    record.delegate_note_a,
                    record.delegate_note_b,
                    record.institution_amount,
                    record.personal_amount,
                    record.total_amount,
                    record.uploaded_at,
                ])?;
            }
        }

        tx.commit()?;
        info!("Appended {} records to ledger", records.len());
        Ok(records.len())
    }

    /// Read every stored record in insertion order
    pub fn read_all(&self) -> Result<Vec<ExpenseRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT 日期, 姓名, 機構摘要, 莊交辦摘要, 陳交辦摘要, 各機構金額, 自用金額, 總金額, 上傳時間
            FROM petty_cash
            ORDER BY rowid
            "#,
        )?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Read {} records from ledger", records.len());
        Ok(records)
    }

    /// Number of stored records
    pub fn count_records(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM petty_cash", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Record count, amount total and most recent upload
    pub fn ledger_stats(&self) -> Result<LedgerStats> {
        let conn = self.conn()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(總金額), 0.0), MAX(上傳時間) FROM petty_cash",
            [],
            |row| {
                Ok(LedgerStats {
                    total_records: row.get(0)?,
                    total_amount: row.get(1)?,
                    last_uploaded_at: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}
