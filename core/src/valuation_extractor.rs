//! Valuation metrics: P/E levels and where prices sit in the cross-section.

use crate::{
    extractor::{mean, Absent, ExtractionContext, MetricExtractor, MetricReadings, Reading},
    store::{EQUITY_HISTORY, FUNDAMENTALS},
    types::Category,
};
use std::collections::BTreeMap;

pub const FORWARD_PE_MEAN: &str = "forward_pe_mean";
pub const PRICE_LEVEL_PCT: &str = "price_level_pct";

pub struct ValuationExtractor;

impl MetricExtractor for ValuationExtractor {
    fn category(&self) -> Category {
        Category::Valuation
    }

    fn metric_names(&self) -> &'static [&'static str] {
        &[FORWARD_PE_MEAN, PRICE_LEVEL_PCT]
    }

    fn extract(&self, ctx: &ExtractionContext<'_>) -> MetricReadings {
        let mut out = MetricReadings::new();
        out.insert(FORWARD_PE_MEAN.into(), forward_pe_mean(ctx));
        out.insert(PRICE_LEVEL_PCT.into(), price_level_pct(ctx));
        out
    }
}

/// Forward and trailing P/E values across the ticker universe.
pub struct PeColumns {
    pub forward:  Vec<f64>,
    pub trailing: Vec<f64>,
}

pub fn pe_columns(ctx: &ExtractionContext<'_>) -> Result<PeColumns, Absent> {
    let records = ctx.read(FUNDAMENTALS, |s| s.fundamentals())?;
    let records: Vec<_> = records
        .into_iter()
        .filter(|r| ctx.config.in_universe(&r.entity_key))
        .collect();
    if records.is_empty() {
        return Err(Absent::unavailable(FUNDAMENTALS));
    }

    let column = |key: &str| -> Vec<f64> {
        records
            .iter()
            .filter(|r| r.metric_key == key)
            .filter_map(|r| r.value)
            .collect()
    };
    let cols = PeColumns {
        forward:  column("forward_pe"),
        trailing: column("pe_ratio"),
    };
    if cols.forward.is_empty() && cols.trailing.is_empty() {
        return Err(Absent::malformed(FUNDAMENTALS, "no numeric P/E values"));
    }
    Ok(cols)
}

/// Mean of the column means that exist.
fn forward_pe_mean(ctx: &ExtractionContext<'_>) -> Reading {
    let cols = pe_columns(ctx)?;
    let means: Vec<f64> = [mean(&cols.forward), mean(&cols.trailing)]
        .into_iter()
        .flatten()
        .collect();
    mean(&means).ok_or_else(|| Absent::malformed(FUNDAMENTALS, "no numeric P/E values"))
}

/// Latest valid close per ticker in the universe, ticker order.
pub fn latest_closes(ctx: &ExtractionContext<'_>) -> Result<Vec<(String, f64)>, Absent> {
    let records = ctx.read(EQUITY_HISTORY, |s| s.equity_closes())?;
    if records.is_empty() {
        return Err(Absent::unavailable(EQUITY_HISTORY));
    }

    let mut latest: BTreeMap<String, f64> = BTreeMap::new();
    for r in records.iter().filter(|r| ctx.config.in_universe(&r.entity_key)) {
        if let Some(v) = r.value {
            latest.insert(r.entity_key.clone(), v);
        }
    }
    if latest.is_empty() {
        return Err(Absent::malformed(EQUITY_HISTORY, "no numeric closes in universe"));
    }
    Ok(latest.into_iter().collect())
}

/// Fraction of tickers whose latest close is below the cross-sectional mean.
fn price_level_pct(ctx: &ExtractionContext<'_>) -> Reading {
    let latest = latest_closes(ctx)?;
    let closes: Vec<f64> = latest.iter().map(|(_, c)| *c).collect();
    let avg = mean(&closes).ok_or_else(|| Absent::unavailable(EQUITY_HISTORY))?;
    let below = closes.iter().filter(|&&c| c < avg).count();
    Ok(below as f64 / closes.len() as f64)
}
