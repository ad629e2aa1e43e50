use super::{
    cell_as_f64, cell_as_string, insert_rows, opt_real, opt_text, quote_ident, SignalStore,
    NEWS_ITEMS, SOCIAL_POSTS, TREND_INTEREST,
};
use crate::{error::ScoreResult, signal::SignalRecord};
use rusqlite::{params, types::Value};

/// Columns of the trends table that never carry interest values.
const TREND_META_COLUMNS: [&str; 2] = ["date", "is_partial"];

/// One row of search interest: a value per keyword column, same order
/// as the keyword list given to `replace_trend_interest`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub date:       String,
    pub values:     Vec<Option<f64>>,
    pub is_partial: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SocialPost {
    pub id:           Option<String>,
    pub title:        String,
    pub created_utc:  Option<String>,
    pub score:        Option<i64>,
    pub upvote_ratio: Option<f64>,
    pub selftext:     Option<String>,
    pub permalink:    Option<String>,
    pub url:          Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewsItem {
    pub title:     String,
    pub published: Option<String>,
    pub summary:   Option<String>,
    pub link:      Option<String>,
}

/// Turn a search keyword into a column name: lowercase, anything that
/// is not alphanumeric becomes `_`.
pub fn keyword_column(keyword: &str) -> String {
    keyword
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

fn is_trend_meta(column: &str) -> bool {
    TREND_META_COLUMNS.contains(&column) || column.starts_with("_dlt_")
}

impl SignalStore {
    // ── Search interest ───────────────────────────────────────────

    /// Replace the trends table. The keyword set can change between runs,
    /// so the table is dropped and recreated with one column per keyword.
    /// Runs in one transaction; a rejected schema or row leaves the
    /// previous table in place.
    pub fn replace_trend_interest(&self, keywords: &[&str], rows: &[TrendRow]) -> ScoreResult<usize> {
        let columns: Vec<String> = keywords.iter().map(|k| keyword_column(k)).collect();
        let mut defs = vec!["date TEXT NOT NULL".to_string()];
        defs.extend(columns.iter().map(|c| format!("{} REAL", quote_ident(c))));
        defs.push("is_partial INTEGER NOT NULL DEFAULT 0".to_string());

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} ({defs});",
            table = TREND_INTEREST,
            defs = defs.join(", "),
        ))?;

        let mut all_columns: Vec<&str> = vec!["date"];
        all_columns.extend(columns.iter().map(String::as_str));
        all_columns.push("is_partial");

        let values: Vec<Vec<Value>> = rows
            .iter()
            .map(|r| {
                let mut row = vec![Value::Text(r.date.clone())];
                row.extend(r.values.iter().map(|v| opt_real(*v)));
                row.push(Value::Integer(i64::from(r.is_partial)));
                row
            })
            .collect();
        insert_rows(&tx, TREND_INTEREST, &all_columns, &values)?;
        tx.commit()?;
        log::debug!("replaced {TREND_INTEREST}: {} rows, {} keywords", rows.len(), columns.len());
        Ok(rows.len())
    }

    /// Aggregate interest per row: the mean of every numeric keyword
    /// column, oldest first. A row with no parseable cell has `value: None`.
    pub fn trend_interest(&self) -> ScoreResult<Option<Vec<SignalRecord>>> {
        if !self.table_exists(TREND_INTEREST)? {
            return Ok(None);
        }
        let columns = self.column_names(TREND_INTEREST)?;
        let value_idx: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !is_trend_meta(c))
            .map(|(i, _)| i)
            .collect();
        let date_idx = columns.iter().position(|c| c == "date");

        let order = if date_idx.is_some() { "date, rowid" } else { "rowid" };
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {TREND_INTEREST} ORDER BY {order}"))?;
        let mut rows = stmt.query([])?;

        let mut records = Vec::new();
        let mut n = 0usize;
        while let Some(row) = rows.next()? {
            let cells: Vec<f64> = value_idx
                .iter()
                .filter_map(|&i| row.get_ref(i).ok().and_then(cell_as_f64))
                .collect();
            let mean = (!cells.is_empty()).then(|| cells.iter().sum::<f64>() / cells.len() as f64);
            let timestamp = match date_idx {
                Some(i) => cell_as_string(row.get_ref(i)?).unwrap_or_default(),
                None => n.to_string(),
            };
            records.push(SignalRecord::new(TREND_INTEREST, "interest", "all", &timestamp, mean));
            n += 1;
        }
        Ok(Some(records))
    }

    // ── Social posts ──────────────────────────────────────────────

    pub fn replace_social_posts(&self, rows: &[SocialPost]) -> ScoreResult<usize> {
        let values: Vec<Vec<Value>> = rows
            .iter()
            .map(|p| {
                vec![
                    opt_text(p.id.as_deref()),
                    Value::Text(p.title.clone()),
                    opt_text(p.created_utc.as_deref()),
                    p.score.map(Value::Integer).unwrap_or(Value::Null),
                    opt_real(p.upvote_ratio),
                    opt_text(p.selftext.as_deref()),
                    opt_text(p.permalink.as_deref()),
                    opt_text(p.url.as_deref()),
                ]
            })
            .collect();
        self.replace_table(
            SOCIAL_POSTS,
            &["id", "title", "created_utc", "score", "upvote_ratio", "selftext", "permalink", "url"],
            &values,
        )
    }

    /// Daily post counts, oldest first. `created_utc` is either an ISO
    /// timestamp (first ten characters are the date) or epoch seconds.
    pub fn social_post_volume(&self) -> ScoreResult<Option<Vec<SignalRecord>>> {
        if !self.table_exists(SOCIAL_POSTS)? {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(
            "SELECT CASE
                        WHEN typeof(created_utc) IN ('integer', 'real')
                            THEN date(created_utc, 'unixepoch')
                        WHEN created_utc NOT LIKE '%-%'
                            THEN date(CAST(created_utc AS REAL), 'unixepoch')
                        ELSE substr(created_utc, 1, 10)
                    END AS day,
                    COUNT(*)
             FROM reddit_posts
             WHERE created_utc IS NOT NULL
             GROUP BY day
             HAVING day IS NOT NULL
             ORDER BY day",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let day: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok(SignalRecord::new(SOCIAL_POSTS, "post_count", "all", &day, Some(count as f64)))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(rows))
    }

    /// Most recent posts first, at most `limit`.
    pub fn reddit_posts(&self, limit: usize) -> ScoreResult<Option<Vec<SocialPost>>> {
        if !self.table_exists(SOCIAL_POSTS)? {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, title, created_utc, score, upvote_ratio, selftext, permalink, url
             FROM reddit_posts
             WHERE title IS NOT NULL
             ORDER BY created_utc DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(SocialPost {
                    id:           cell_as_string(row.get_ref(0)?),
                    title:        cell_as_string(row.get_ref(1)?).unwrap_or_default(),
                    created_utc:  cell_as_string(row.get_ref(2)?),
                    score:        cell_as_f64(row.get_ref(3)?).map(|s| s as i64),
                    upvote_ratio: cell_as_f64(row.get_ref(4)?),
                    selftext:     cell_as_string(row.get_ref(5)?),
                    permalink:    cell_as_string(row.get_ref(6)?),
                    url:          cell_as_string(row.get_ref(7)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(rows))
    }

    // ── News ──────────────────────────────────────────────────────

    pub fn replace_news(&self, rows: &[NewsItem]) -> ScoreResult<usize> {
        let values: Vec<Vec<Value>> = rows
            .iter()
            .map(|n| {
                vec![
                    Value::Text(n.title.clone()),
                    opt_text(n.published.as_deref()),
                    opt_text(n.summary.as_deref()),
                    opt_text(n.link.as_deref()),
                ]
            })
            .collect();
        self.replace_table(NEWS_ITEMS, &["title", "published", "summary", "link"], &values)
    }

    /// Most recent headlines first, at most `limit`.
    pub fn news_items(&self, limit: usize) -> ScoreResult<Option<Vec<NewsItem>>> {
        if !self.table_exists(NEWS_ITEMS)? {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(
            "SELECT title, published, summary, link FROM rss_ai_news
             WHERE title IS NOT NULL
             ORDER BY published DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(NewsItem {
                    title:     cell_as_string(row.get_ref(0)?).unwrap_or_default(),
                    published: cell_as_string(row.get_ref(1)?),
                    summary:   cell_as_string(row.get_ref(2)?),
                    link:      cell_as_string(row.get_ref(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(rows))
    }
}
