//! SQLite signal store.
//!
//! RULE: Only the store talks to the database.
//! Extractors call store methods; they never execute SQL directly.
//!
//! RULE: Collectors replace a table's whole contents inside one
//! transaction. A failed refresh rolls back and the previous snapshot
//! stays readable. Scoring never writes.
//!
//! Missing tables are a normal condition: every read returns
//! `Ok(None)` when its table does not exist yet.

use crate::error::{ScoreError, ScoreResult};
use rusqlite::{
    params,
    types::{Value, ValueRef},
    Connection, OpenFlags,
};
use serde::Serialize;

mod equity;
mod macro_series;
mod social;

pub use equity::{EquityBar, FundamentalsSnapshot};
pub use macro_series::MacroObservation;
pub use social::{NewsItem, SocialPost, TrendRow};

pub const FRED_MACRO:      &str = "fred_macro";
pub const EQUITY_HISTORY:  &str = "ai_equity_history";
pub const FUNDAMENTALS:    &str = "alpha_vantage_overview";
pub const TREND_INTEREST:  &str = "google_trends_interest";
pub const SOCIAL_POSTS:    &str = "reddit_posts";
pub const NEWS_ITEMS:      &str = "rss_ai_news";

/// Every collector table, in status-report order.
pub const KNOWN_TABLES: [&str; 6] = [
    SOCIAL_POSTS,
    NEWS_ITEMS,
    TREND_INTEREST,
    FRED_MACRO,
    FUNDAMENTALS,
    EQUITY_HISTORY,
];

/// Tables that carry numeric (non-text) signals.
pub const NUMERIC_TABLES: [&str; 4] = [
    FUNDAMENTALS,
    FRED_MACRO,
    TREND_INTEREST,
    EQUITY_HISTORY,
];

/// Row count of one collector table, for status reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table:  String,
    pub exists: bool,
    pub rows:   i64,
}

impl TableStatus {
    pub fn populated(&self) -> bool {
        self.exists && self.rows > 0
    }
}

pub struct SignalStore {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

impl SignalStore {
    /// Open (or create) the store at `path` for reading and writing.
    /// Collectors and test fixtures use this.
    pub fn open(path: &str) -> ScoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files; readers never block the writer.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an existing store read-only. Each scoring invocation may hold
    /// its own connection; no connection is shared across threads.
    pub fn open_read_only(path: &str) -> ScoreResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory store (used in tests).
    pub fn in_memory() -> ScoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ScoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_signal_store.sql"))?;
        Ok(())
    }

    // ── Introspection ─────────────────────────────────────────────

    pub fn table_exists(&self, table: &str) -> ScoreResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of rows in `table`, or `None` when the table is missing.
    pub fn row_count(&self, table: &str) -> ScoreResult<Option<i64>> {
        if !self.table_exists(table)? {
            return Ok(None);
        }
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(Some(count))
    }

    /// Row counts for every known collector table.
    pub fn table_status(&self) -> ScoreResult<Vec<TableStatus>> {
        KNOWN_TABLES
            .iter()
            .map(|table| {
                let rows = self.row_count(table)?;
                Ok(TableStatus {
                    table:  table.to_string(),
                    exists: rows.is_some(),
                    rows:   rows.unwrap_or(0),
                })
            })
            .collect()
    }

    /// Column names of `table` in declaration order.
    pub(crate) fn column_names(&self, table: &str) -> ScoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    // ── Refresh ───────────────────────────────────────────────────

    /// Replace the whole contents of `table` with `rows`.
    ///
    /// Runs in one transaction: if any row is rejected, nothing changes.
    /// Returns the number of rows written.
    pub fn replace_table(
        &self,
        table:   &str,
        columns: &[&str],
        rows:    &[Vec<Value>],
    ) -> ScoreResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(&format!("DELETE FROM {}", quote_ident(table)), [])?;
        insert_rows(&tx, table, columns, rows)?;
        tx.commit()?;
        log::debug!("replaced {table}: {} rows", rows.len());
        Ok(rows.len())
    }
}

fn insert_rows(
    conn:    &Connection,
    table:   &str,
    columns: &[&str],
    rows:    &[Vec<Value>],
) -> ScoreResult<()> {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} ({column_list}) VALUES ({placeholders})",
        quote_ident(table)
    ))?;
    for (i, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(ScoreError::InvalidConfig(format!(
                "{table} row {i} has {} values, expected {}",
                row.len(),
                columns.len()
            )));
        }
        stmt.execute(rusqlite::params_from_iter(row.iter()))?;
    }
    Ok(())
}

/// Quote an SQLite identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Lenient numeric read: integers, reals and numeric text are values,
/// anything else is `None`.
pub(crate) fn cell_as_f64(cell: ValueRef<'_>) -> Option<f64> {
    let value = match cell {
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(f) => f,
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse::<f64>().ok()?,
        ValueRef::Null | ValueRef::Blob(_) => return None,
    };
    value.is_finite().then_some(value)
}

pub(crate) fn cell_as_string(cell: ValueRef<'_>) -> Option<String> {
    match cell {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().map(str::to_string),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

/// Drops rows whose key cells were missing or unreadable.
pub(crate) fn keyed_rows<T>(table: &str, rows: Vec<Option<T>>) -> Vec<T> {
    let total = rows.len();
    let kept: Vec<T> = rows.into_iter().flatten().collect();
    if kept.len() < total {
        log::warn!("{table}: skipped {} rows without key cells", total - kept.len());
    }
    kept
}

pub(crate) fn opt_real(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}

pub(crate) fn opt_text(value: Option<&str>) -> Value {
    value
        .map(|s| Value::Text(s.to_string()))
        .unwrap_or(Value::Null)
}
