//! Positioning metrics from equity return volatility.

use crate::{
    extractor::{
        mean, pct_changes, sample_std, Absent, ExtractionContext, MetricExtractor,
        MetricReadings, Reading,
    },
    store::EQUITY_HISTORY,
    types::Category,
};
use std::collections::BTreeMap;

pub const EQUITY_VOLATILITY_PROXY: &str = "equity_volatility_proxy";
pub const VOLATILITY_DISPERSION:   &str = "volatility_dispersion";

/// A ticker needs more than this many daily returns to count.
pub const MIN_RETURNS: usize = 5;

pub struct PositioningExtractor;

impl MetricExtractor for PositioningExtractor {
    fn category(&self) -> Category {
        Category::Positioning
    }

    fn metric_names(&self) -> &'static [&'static str] {
        &[EQUITY_VOLATILITY_PROXY, VOLATILITY_DISPERSION]
    }

    fn extract(&self, ctx: &ExtractionContext<'_>) -> MetricReadings {
        let vols = ticker_volatilities(ctx);
        let mut out = MetricReadings::new();
        out.insert(EQUITY_VOLATILITY_PROXY.into(), volatility_proxy(&vols));
        out.insert(VOLATILITY_DISPERSION.into(), dispersion(&vols));
        out
    }
}

/// Daily-return standard deviation per ticker, for tickers with enough
/// history. Every ticker in the store counts, not just the valuation universe.
pub fn ticker_volatilities(ctx: &ExtractionContext<'_>) -> Result<Vec<f64>, Absent> {
    let records = ctx.read(EQUITY_HISTORY, |s| s.equity_closes())?;
    if records.is_empty() {
        return Err(Absent::unavailable(EQUITY_HISTORY));
    }

    let mut by_ticker: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in &records {
        if let Some(v) = r.value {
            by_ticker.entry(r.entity_key.as_str()).or_default().push(v);
        }
    }

    let mut longest = 0;
    let vols: Vec<f64> = by_ticker
        .values()
        .filter_map(|closes| {
            let rets = pct_changes(closes);
            longest = longest.max(rets.len());
            if rets.len() > MIN_RETURNS {
                sample_std(&rets)
            } else {
                None
            }
        })
        .collect();

    if vols.is_empty() {
        return Err(Absent::insufficient(EQUITY_HISTORY, MIN_RETURNS + 1, longest));
    }
    Ok(vols)
}

fn volatility_proxy(vols: &Result<Vec<f64>, Absent>) -> Reading {
    let vols = vols.as_ref().map_err(Clone::clone)?;
    mean(vols).ok_or_else(|| Absent::unavailable(EQUITY_HISTORY))
}

fn dispersion(vols: &Result<Vec<f64>, Absent>) -> Reading {
    let vols = vols.as_ref().map_err(Clone::clone)?;
    sample_std(vols).ok_or_else(|| Absent::insufficient(EQUITY_HISTORY, 2, vols.len()))
}
