//! Capex metrics from curated entries.

use crate::{
    extractor::{mean, Absent, ExtractionContext, MetricExtractor, MetricReadings, Reading},
    types::Category,
};

pub const CAPEX_MENTION_SCORE: &str = "capex_mention_score";
pub const CAPEX_INTENSITY:     &str = "capex_intensity";

const ENTRIES_SOURCE: &str = "qualitative_entries";

pub struct CapexExtractor;

impl MetricExtractor for CapexExtractor {
    fn category(&self) -> Category {
        Category::Capex
    }

    fn metric_names(&self) -> &'static [&'static str] {
        &[CAPEX_MENTION_SCORE, CAPEX_INTENSITY]
    }

    fn extract(&self, ctx: &ExtractionContext<'_>) -> MetricReadings {
        let mut out = MetricReadings::new();
        out.insert(CAPEX_MENTION_SCORE.into(), mention_score(ctx));
        out.insert(CAPEX_INTENSITY.into(), intensity(ctx));
        out
    }
}

/// Entries whose content names a spending keyword. Capex entries when
/// there are any, otherwise every entry.
pub fn spending_mentions(ctx: &ExtractionContext<'_>) -> usize {
    let capex: Vec<_> = ctx.entries_in(Category::Capex).collect();
    let pool: Vec<_> = if capex.is_empty() {
        ctx.entries.iter().collect()
    } else {
        capex
    };
    pool.iter()
        .filter(|e| {
            let content = e.content.to_lowercase();
            ctx.config
                .spending_keywords
                .iter()
                .any(|k| content.contains(&k.to_lowercase()))
        })
        .count()
}

/// `min(50 + 3 * mentions, 100)`.
fn mention_score(ctx: &ExtractionContext<'_>) -> Reading {
    if ctx.entries.is_empty() {
        return Err(Absent::unavailable(ENTRIES_SOURCE));
    }
    Ok((50.0 + 3.0 * spending_mentions(ctx) as f64).min(100.0))
}

/// Mean numeric score of capex entries.
fn intensity(ctx: &ExtractionContext<'_>) -> Reading {
    let scores: Vec<f64> = ctx
        .entries_in(Category::Capex)
        .filter_map(|e| e.sentiment_score)
        .collect();
    mean(&scores).ok_or_else(|| Absent::unavailable(ENTRIES_SOURCE))
}
