//! Liquidity metrics from macro series.

use crate::{
    extractor::{Absent, ExtractionContext, MetricExtractor, MetricReadings, Reading},
    signal::SignalRecord,
    store::FRED_MACRO,
    types::Category,
};

pub const REAL_YIELD:    &str = "US_10Y_real_yield";
pub const M2_YOY:        &str = "US_M2_YoY_growth";
pub const CREDIT_SPREAD: &str = "US_HY_credit_spread";

/// Store metric keys for each macro series.
pub const SERIES_REAL_YIELD: &str = "real_yield_10y";
pub const SERIES_M2:         &str = "m2";
pub const SERIES_HY_OAS:     &str = "hy_oas";

/// Monthly observations per year; YoY needs one more than this.
const YOY_LAG: usize = 12;

pub struct LiquidityExtractor;

impl MetricExtractor for LiquidityExtractor {
    fn category(&self) -> Category {
        Category::Liquidity
    }

    fn metric_names(&self) -> &'static [&'static str] {
        &[REAL_YIELD, M2_YOY, CREDIT_SPREAD]
    }

    fn extract(&self, ctx: &ExtractionContext<'_>) -> MetricReadings {
        let mut out = MetricReadings::new();
        out.insert(REAL_YIELD.into(), latest(ctx, SERIES_REAL_YIELD));
        out.insert(M2_YOY.into(), m2_yoy_growth(ctx));
        out.insert(CREDIT_SPREAD.into(), latest(ctx, SERIES_HY_OAS));
        out
    }
}

/// All observations of one macro series, oldest first.
pub fn series(ctx: &ExtractionContext<'_>, metric: &str) -> Result<Vec<SignalRecord>, Absent> {
    let rows = ctx.read(FRED_MACRO, |s| s.macro_series(metric))?;
    if rows.is_empty() {
        return Err(Absent::unavailable(&format!("{FRED_MACRO}.{metric}")));
    }
    Ok(rows)
}

/// The most recent observation. A blank latest cell is malformed, not
/// a reason to fall back to an older value.
fn latest(ctx: &ExtractionContext<'_>, metric: &str) -> Reading {
    let rows = series(ctx, metric)?;
    rows.last()
        .and_then(|r| r.value)
        .ok_or_else(|| Absent::malformed(&format!("{FRED_MACRO}.{metric}"), "latest value not numeric"))
}

/// `((latest / year_ago) - 1) * 100`.
fn m2_yoy_growth(ctx: &ExtractionContext<'_>) -> Reading {
    let origin = format!("{FRED_MACRO}.{SERIES_M2}");
    let rows = series(ctx, SERIES_M2)?;
    if rows.len() <= YOY_LAG {
        return Err(Absent::insufficient(&origin, YOY_LAG + 1, rows.len()));
    }
    let latest = rows[rows.len() - 1].value;
    let year_ago = rows[rows.len() - 1 - YOY_LAG].value;
    match (latest, year_ago) {
        (Some(now), Some(then)) if then != 0.0 => Ok((now / then - 1.0) * 100.0),
        (Some(_), Some(_)) => Err(Absent::malformed(&origin, "year-ago value is zero")),
        _ => Err(Absent::malformed(&origin, "non-numeric observation")),
    }
}
