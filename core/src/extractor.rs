//! Metric extractor trait and shared reductions.
//!
//! RULE: Every category has exactly one MetricExtractor.
//! RULE: Extractors never fail as a whole. Each metric independently
//! resolves to a value or to an explicit `Absent` reason.
//! RULE: Extractors read the store only through SignalStore methods.

use crate::{
    capex_extractor::CapexExtractor,
    config::ScoringConfig,
    error::ScoreResult,
    liquidity_extractor::LiquidityExtractor,
    positioning_extractor::PositioningExtractor,
    qualitative::QualitativeEntry,
    sentiment_extractor::SentimentExtractor,
    store::SignalStore,
    types::Category,
    valuation_extractor::ValuationExtractor,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a metric has no current value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Absent {
    #[error("{origin}: no data")]
    DataUnavailable { origin: String },

    #[error("{origin}: malformed data ({detail})")]
    MalformedData { origin: String, detail: String },

    #[error("{origin}: need {needed} observations, found {found}")]
    InsufficientHistory {
        origin: String,
        needed: usize,
        found:  usize,
    },

    #[error("{origin}: store error ({detail})")]
    StoreError { origin: String, detail: String },
}

impl Absent {
    pub fn unavailable(source: &str) -> Self {
        Self::DataUnavailable { origin: source.to_string() }
    }

    pub fn malformed(source: &str, detail: impl Into<String>) -> Self {
        Self::MalformedData {
            origin: source.to_string(),
            detail: detail.into(),
        }
    }

    pub fn insufficient(source: &str, needed: usize, found: usize) -> Self {
        Self::InsufficientHistory {
            origin: source.to_string(),
            needed,
            found,
        }
    }
}

pub type Reading = Result<f64, Absent>;

/// Metric name → current value or absence reason.
pub type MetricReadings = BTreeMap<String, Reading>;

/// Everything an extractor may look at. All of it is read-only.
#[derive(Clone, Copy)]
pub struct ExtractionContext<'a> {
    /// `None` when no store has been populated yet.
    pub store:   Option<&'a SignalStore>,
    pub entries: &'a [QualitativeEntry],
    pub config:  &'a ScoringConfig,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        store:   Option<&'a SignalStore>,
        entries: &'a [QualitativeEntry],
        config:  &'a ScoringConfig,
    ) -> Self {
        Self { store, entries, config }
    }

    /// Run one store read, folding "no store", "no table" and store
    /// errors into `Absent`.
    pub fn read<T>(
        &self,
        source: &str,
        read:   impl FnOnce(&SignalStore) -> ScoreResult<Option<T>>,
    ) -> Result<T, Absent> {
        let store = self.store.ok_or_else(|| Absent::unavailable(source))?;
        match read(store) {
            Ok(Some(rows)) => Ok(rows),
            Ok(None) => Err(Absent::unavailable(source)),
            Err(e) => {
                log::warn!("{source}: store read failed: {e}");
                Err(Absent::StoreError {
                    origin: source.to_string(),
                    detail: e.to_string(),
                })
            }
        }
    }

    pub fn entries_in(&self, category: Category) -> impl Iterator<Item = &'a QualitativeEntry> {
        self.entries.iter().filter(move |e| e.is_category(category))
    }
}

/// The contract every category extractor fulfills.
pub trait MetricExtractor: Send + Sync {
    fn category(&self) -> Category;

    /// Stable metric names this extractor may produce.
    fn metric_names(&self) -> &'static [&'static str];

    /// One reading per name in `metric_names()`.
    fn extract(&self, ctx: &ExtractionContext<'_>) -> MetricReadings;
}

/// One extractor per category, in canonical category order.
pub fn all_extractors() -> Vec<Box<dyn MetricExtractor>> {
    vec![
        Box::new(ValuationExtractor),
        Box::new(SentimentExtractor),
        Box::new(PositioningExtractor),
        Box::new(LiquidityExtractor),
        Box::new(CapexExtractor),
    ]
}

/// Run every extractor.
pub fn extract_all(ctx: &ExtractionContext<'_>) -> BTreeMap<Category, MetricReadings> {
    all_extractors()
        .iter()
        .map(|x| {
            let readings = x.extract(ctx);
            for (name, reading) in &readings {
                match reading {
                    Ok(v) => log::debug!("{}.{name} = {v:.4}", x.category()),
                    Err(reason) => log::debug!("{}.{name} absent: {reason}", x.category()),
                }
            }
            (x.category(), readings)
        })
        .collect()
}

// ── Shared reductions ─────────────────────────────────────────────

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Sample standard deviation (n - 1). `None` below two points.
pub fn sample_std(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    Some(var.sqrt())
}

/// z of the last point against the whole series. A flat series has
/// unit spread, so its z is just the deviation from the mean (zero).
pub fn latest_z(series: &[f64]) -> Option<f64> {
    let last = *series.last()?;
    let m = mean(series)?;
    let sd = sample_std(series).filter(|s| *s > 0.0).unwrap_or(1.0);
    Some((last - m) / sd)
}

/// Simple period-over-period returns; steps from a zero price are skipped.
pub fn pct_changes(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}
