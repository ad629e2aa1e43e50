use super::{cell_as_f64, cell_as_string, keyed_rows, opt_real, opt_text, SignalStore, FRED_MACRO};
use crate::{error::ScoreResult, signal::SignalRecord};
use rusqlite::{params, types::Value};

/// One macro series observation as written by the FRED collector.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroObservation {
    pub metric:    String,
    pub series_id: Option<String>,
    pub date:      String,
    pub value:     Option<f64>,
}

impl SignalStore {
    // ── Macro series ──────────────────────────────────────────────

    pub fn replace_macro_series(&self, rows: &[MacroObservation]) -> ScoreResult<usize> {
        let values: Vec<Vec<Value>> = rows
            .iter()
            .map(|r| {
                vec![
                    Value::Text(r.metric.clone()),
                    opt_text(r.series_id.as_deref()),
                    Value::Text(r.date.clone()),
                    opt_real(r.value),
                ]
            })
            .collect();
        self.replace_table(FRED_MACRO, &["metric", "series_id", "date", "value"], &values)
    }

    /// Observations of one macro metric (`real_yield_10y`, `m2`, `hy_oas`),
    /// oldest first. `None` when the table has not been created yet.
    pub fn macro_series(&self, metric: &str) -> ScoreResult<Option<Vec<SignalRecord>>> {
        if !self.table_exists(FRED_MACRO)? {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(
            "SELECT series_id, date, value FROM fred_macro
             WHERE metric = ?1
             ORDER BY date, rowid",
        )?;
        let rows = stmt
            .query_map(params![metric], |row| {
                let Some(date) = cell_as_string(row.get_ref(1)?) else {
                    return Ok(None);
                };
                let series_id = cell_as_string(row.get_ref(0)?);
                Ok(Some(SignalRecord::new(
                    FRED_MACRO,
                    metric,
                    series_id.as_deref().unwrap_or(metric),
                    &date,
                    cell_as_f64(row.get_ref(2)?),
                )))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(keyed_rows(FRED_MACRO, rows)))
    }
}
