//! Keyword-ratio scoring for when no baselines are available.
//!
//! Store-derived components are used where present; every category
//! falls back to a keyword/label ratio over the curated entries.
//! Components map z-scores linearly (`50 + z * z_scale`).

use crate::{
    aggregator::CategoryResult,
    capex_extractor::spending_mentions,
    composite::CompositeResult,
    config::ScoringConfig,
    error::ScoreResult,
    extractor::{latest_z, mean, sample_std, ExtractionContext},
    liquidity_extractor::{series, SERIES_HY_OAS, SERIES_M2, SERIES_REAL_YIELD},
    normalizer::{interpret_percentile, linear_z_score, MetricResult},
    positioning_extractor::ticker_volatilities,
    qualitative::{QualitativeEntry, SentimentLabel},
    sentiment_extractor::{search_interest_z, social_volume_z},
    signal::values,
    store::{SignalStore, NUMERIC_TABLES},
    strategy::{ScoringInputs, ScoringStrategy},
    types::{round_to, Category, MetricName},
    valuation_extractor::{latest_closes, pe_columns},
};
use std::collections::BTreeMap;

pub const METHODOLOGY: &str = "heuristic_keyword_ratio";

/// Raw macro series need more than this many points for a z component.
const MIN_MACRO_POINTS: usize = 5;

pub struct HeuristicStrategy;

impl ScoringStrategy for HeuristicStrategy {
    fn methodology(&self) -> &'static str {
        METHODOLOGY
    }

    fn score(
        &self,
        inputs:    &ScoringInputs<'_>,
        config:    &ScoringConfig,
        timestamp: String,
    ) -> ScoreResult<CompositeResult> {
        let ctx = ExtractionContext::new(inputs.store, inputs.entries, config);

        let mut categories = BTreeMap::new();
        for category in Category::ALL {
            let (score, metrics) = match category {
                Category::Valuation   => valuation(&ctx),
                Category::Sentiment   => sentiment(&ctx),
                Category::Positioning => positioning(&ctx),
                Category::Liquidity   => liquidity(&ctx),
                Category::Capex       => capex(&ctx),
            };
            let result = CategoryResult::from_score(category, score, metrics, config);
            log::debug!("{category}: heuristic score {} ({})", result.score, result.descriptor);
            categories.insert(category, result);
        }

        let confidence = heuristic_confidence(inputs.entries.len(), inputs.store);
        Ok(CompositeResult::assemble(timestamp, categories, confidence, METHODOLOGY, config))
    }
}

/// 0.65 base, 0.75 with ten entries, 0.85 with fifteen, plus 0.02 per
/// populated numeric table, capped at 0.95. A table that cannot be
/// counted is treated as empty.
pub fn heuristic_confidence(n_entries: usize, store: Option<&SignalStore>) -> f64 {
    let base = match n_entries {
        n if n >= 15 => 0.85,
        n if n >= 10 => 0.75,
        _            => 0.65,
    };
    let mut numeric_sources = 0;
    if let Some(store) = store {
        for table in NUMERIC_TABLES {
            match store.row_count(table) {
                Ok(Some(n)) if n > 0 => numeric_sources += 1,
                Ok(_) => {}
                Err(e) => log::warn!("{table}: row count unavailable ({e})"),
            }
        }
    }
    (base + 0.02 * numeric_sources as f64).min(0.95)
}

// ── Helpers ───────────────────────────────────────────────────────

type Scored = (f64, BTreeMap<MetricName, MetricResult>);

/// A heuristic component recorded alongside the category score.
fn component(value: f64, z: f64, risk: f64) -> MetricResult {
    let risk = risk.clamp(0.0, 100.0);
    MetricResult {
        value:          Some(value),
        z_score:        round_to(z, 2),
        percentile:     round_to(risk, 1),
        risk_score:     round_to(risk, 1),
        interpretation: interpret_percentile(risk).to_string(),
        available:      true,
        baseline_mean:  None,
        baseline_std:   None,
    }
}

fn ratio(entries: &[&QualitativeEntry], label: SentimentLabel) -> f64 {
    let hits = entries.iter().filter(|e| e.sentiment == label).count();
    hits as f64 / entries.len().max(1) as f64
}

fn entries_of<'a>(ctx: &ExtractionContext<'a>, category: Category) -> Vec<&'a QualitativeEntry> {
    ctx.entries_in(category).collect()
}

fn mean_of_components(metrics: &BTreeMap<MetricName, MetricResult>) -> Option<f64> {
    let risks: Vec<f64> = metrics.values().map(|m| m.risk_score).collect();
    mean(&risks)
}

// ── Categories ────────────────────────────────────────────────────

fn valuation(ctx: &ExtractionContext<'_>) -> Scored {
    let mut metrics = BTreeMap::new();

    if let Ok(latest) = latest_closes(ctx) {
        let closes: Vec<f64> = latest.iter().map(|(_, c)| *c).collect();
        if let Some(avg) = mean(&closes) {
            let pct = closes.iter().filter(|&&c| c < avg).count() as f64 / closes.len() as f64;
            metrics.insert("price_level_pct".into(), component(pct, 0.0, (1.0 - pct) * 100.0));
        }
    }
    if let Ok(cols) = pe_columns(ctx) {
        for (name, col) in [("forward_pe_pctl", &cols.forward), ("pe_ratio_pctl", &cols.trailing)] {
            if let Some(avg) = mean(col) {
                let pct = col.iter().filter(|&&v| v < avg).count() as f64 / col.len() as f64;
                metrics.insert(name.into(), component(avg, 0.0, pct * 100.0));
            }
        }
    }
    if let Some(score) = mean_of_components(&metrics) {
        return (score, metrics);
    }

    let data = entries_of(ctx, Category::Valuation);
    let high_valuations = data.iter().filter(|e| e.content_contains("billion")).count();
    let skew = ratio(&data, SentimentLabel::PeakHype);
    let score = (50.0 + high_valuations as f64 * 10.0 + skew * 30.0).min(100.0);
    metrics.insert("keyword_ratio".into(), component(high_valuations as f64, 0.0, score));
    (score, metrics)
}

fn sentiment(ctx: &ExtractionContext<'_>) -> Scored {
    let mut metrics = BTreeMap::new();
    let data = entries_of(ctx, Category::Sentiment);
    let peak = ratio(&data, SentimentLabel::PeakHype);
    let warning = ratio(&data, SentimentLabel::Warning);

    let compounds: Vec<f64> = data.iter().filter_map(|e| e.sentiment_score).collect();
    if let Some(avg) = mean(&compounds) {
        let score = ((avg + 1.0) / 2.0 * 100.0 + peak * 20.0 - warning * 10.0).clamp(0.0, 100.0);
        metrics.insert("vader_compound_avg".into(), component(avg, 0.0, score));
        return (score, metrics);
    }

    let scale = ctx.config.z_scale;
    if let Ok(z) = search_interest_z(ctx) {
        metrics.insert("search_interest_z".into(), component(z, z, linear_z_score(z, scale)));
    }
    if let Ok(z) = social_volume_z(ctx) {
        metrics.insert("social_volume_z".into(), component(z, z, linear_z_score(z, scale)));
    }
    if let Some(score) = mean_of_components(&metrics) {
        return (score, metrics);
    }

    let score = (50.0 + peak * 40.0 - warning * 20.0).clamp(0.0, 100.0);
    metrics.insert("keyword_ratio".into(), component(peak, 0.0, score));
    (score, metrics)
}

fn positioning(ctx: &ExtractionContext<'_>) -> Scored {
    let mut metrics = BTreeMap::new();

    if let Ok(vols) = ticker_volatilities(ctx) {
        let avg = mean(&vols).unwrap_or(0.0);
        let min = vols.iter().copied().fold(f64::INFINITY, f64::min);
        let sd = sample_std(&vols).filter(|s| *s > 0.0).unwrap_or(1.0);
        let z = (avg - min) / sd;
        let score = linear_z_score(z, ctx.config.z_scale);
        metrics.insert("volatility_spread_z".into(), component(avg, z, score));
        return (score, metrics);
    }

    let mut data = entries_of(ctx, Category::Positioning);
    if data.is_empty() {
        data = entries_of(ctx, Category::Sentiment);
    }
    let score = if data.len() > 15 { 75.0 } else { 55.0 };
    metrics.insert("entry_volume".into(), component(data.len() as f64, 0.0, score));
    (score, metrics)
}

fn liquidity(ctx: &ExtractionContext<'_>) -> Scored {
    let mut metrics = BTreeMap::new();

    for metric in [SERIES_REAL_YIELD, SERIES_M2, SERIES_HY_OAS] {
        let Ok(rows) = series(ctx, metric) else { continue };
        let raw = values(&rows);
        if raw.len() <= MIN_MACRO_POINTS {
            continue;
        }
        if let Some(z) = latest_z(&raw) {
            let latest = raw.last().copied().unwrap_or(0.0);
            metrics.insert(
                format!("{metric}_z"),
                component(latest, z, linear_z_score(z, ctx.config.z_scale)),
            );
        }
    }
    if let Some(score) = mean_of_components(&metrics) {
        return (score, metrics);
    }

    let mut data = entries_of(ctx, Category::Liquidity);
    if data.is_empty() {
        data = ctx.entries.iter().collect();
    }
    let declines = data
        .iter()
        .filter(|e| e.content_contains("decline") || e.content_contains("down"))
        .count();
    let score = (40.0 + declines as f64 * 5.0).min(100.0);
    metrics.insert("funding_decline_mentions".into(), component(declines as f64, 0.0, score));
    (score, metrics)
}

fn capex(ctx: &ExtractionContext<'_>) -> Scored {
    let mentions = spending_mentions(ctx);
    let score = (50.0 + mentions as f64 * 3.0).min(100.0);
    let mut metrics = BTreeMap::new();
    metrics.insert("spending_mentions".into(), component(mentions as f64, 0.0, score));
    (score, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_tiers_without_store() {
        assert_eq!(heuristic_confidence(3, None), 0.65);
        assert_eq!(heuristic_confidence(10, None), 0.75);
        assert_eq!(heuristic_confidence(40, None), 0.85);
    }
}
