use super::{
    cell_as_f64, cell_as_string, keyed_rows, opt_real, opt_text, SignalStore, EQUITY_HISTORY,
    FUNDAMENTALS,
};
use crate::{error::ScoreResult, signal::SignalRecord};
use rusqlite::types::Value;

/// One daily close for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityBar {
    pub ticker: String,
    pub date:   String,
    pub close:  Option<f64>,
}

/// Company overview snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FundamentalsSnapshot {
    pub symbol:     String,
    pub name:       Option<String>,
    pub forward_pe: Option<f64>,
    pub pe_ratio:   Option<f64>,
    pub market_cap: Option<f64>,
    pub sector:     Option<String>,
    pub industry:   Option<String>,
}

impl SignalStore {
    // ── Equity history ────────────────────────────────────────────

    pub fn replace_equity_history(&self, rows: &[EquityBar]) -> ScoreResult<usize> {
        let values: Vec<Vec<Value>> = rows
            .iter()
            .map(|r| {
                vec![
                    Value::Text(r.ticker.clone()),
                    Value::Text(r.date.clone()),
                    opt_real(r.close),
                ]
            })
            .collect();
        self.replace_table(EQUITY_HISTORY, &["ticker", "date", "close"], &values)
    }

    /// All closes, grouped by ticker and ordered by date within each ticker.
    pub fn equity_closes(&self) -> ScoreResult<Option<Vec<SignalRecord>>> {
        if !self.table_exists(EQUITY_HISTORY)? {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(
            "SELECT ticker, date, close FROM ai_equity_history
             WHERE close IS NOT NULL
             ORDER BY ticker, date",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let (Some(ticker), Some(date)) =
                    (cell_as_string(row.get_ref(0)?), cell_as_string(row.get_ref(1)?))
                else {
                    return Ok(None);
                };
                Ok(Some(SignalRecord::new(
                    EQUITY_HISTORY,
                    "close",
                    &ticker,
                    &date,
                    cell_as_f64(row.get_ref(2)?),
                )))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(keyed_rows(EQUITY_HISTORY, rows)))
    }

    // ── Fundamentals ──────────────────────────────────────────────

    pub fn replace_fundamentals(&self, rows: &[FundamentalsSnapshot]) -> ScoreResult<usize> {
        let values: Vec<Vec<Value>> = rows
            .iter()
            .map(|r| {
                vec![
                    Value::Text(r.symbol.clone()),
                    opt_text(r.name.as_deref()),
                    opt_real(r.forward_pe),
                    opt_real(r.pe_ratio),
                    opt_real(r.market_cap),
                    opt_text(r.sector.as_deref()),
                    opt_text(r.industry.as_deref()),
                ]
            })
            .collect();
        self.replace_table(
            FUNDAMENTALS,
            &["symbol", "name", "forward_pe", "pe_ratio", "market_cap", "sector", "industry"],
            &values,
        )
    }

    /// Forward and trailing P/E per symbol as two records each
    /// (`forward_pe`, `pe_ratio`). Rows with neither ratio are skipped.
    pub fn fundamentals(&self) -> ScoreResult<Option<Vec<SignalRecord>>> {
        if !self.table_exists(FUNDAMENTALS)? {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(
            "SELECT symbol, forward_pe, pe_ratio FROM alpha_vantage_overview
             WHERE forward_pe IS NOT NULL OR pe_ratio IS NOT NULL
             ORDER BY symbol",
        )?;
        let pairs = stmt
            .query_map([], |row| {
                let Some(symbol) = cell_as_string(row.get_ref(0)?) else {
                    return Ok(None);
                };
                Ok(Some((symbol, cell_as_f64(row.get_ref(1)?), cell_as_f64(row.get_ref(2)?))))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let records = keyed_rows(FUNDAMENTALS, pairs)
            .into_iter()
            .flat_map(|(symbol, forward, trailing)| {
                [
                    SignalRecord::new(FUNDAMENTALS, "forward_pe", &symbol, "", forward),
                    SignalRecord::new(FUNDAMENTALS, "pe_ratio", &symbol, "", trailing),
                ]
            })
            .collect();
        Ok(Some(records))
    }

    /// Full overview rows, for dataset building.
    pub fn fundamentals_detail(&self) -> ScoreResult<Option<Vec<FundamentalsSnapshot>>> {
        if !self.table_exists(FUNDAMENTALS)? {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(
            "SELECT symbol, name, forward_pe, pe_ratio, market_cap, sector, industry
             FROM alpha_vantage_overview
             ORDER BY symbol",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let Some(symbol) = cell_as_string(row.get_ref(0)?) else {
                    return Ok(None);
                };
                Ok(Some(FundamentalsSnapshot {
                    symbol,
                    name:       cell_as_string(row.get_ref(1)?),
                    forward_pe: cell_as_f64(row.get_ref(2)?),
                    pe_ratio:   cell_as_f64(row.get_ref(3)?),
                    market_cap: cell_as_f64(row.get_ref(4)?),
                    sector:     cell_as_string(row.get_ref(5)?),
                    industry:   cell_as_string(row.get_ref(6)?),
                }))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(keyed_rows(FUNDAMENTALS, rows)))
    }
}
