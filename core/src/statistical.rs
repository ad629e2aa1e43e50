//! Baseline-driven scoring: z-score → percentile → risk per metric.

use crate::{
    aggregator::aggregate,
    composite::{coverage_confidence, CompositeResult},
    config::{Baselines, ScoringConfig},
    error::ScoreResult,
    extractor::{extract_all, ExtractionContext},
    strategy::{ScoringInputs, ScoringStrategy},
    types::Category,
};
use std::collections::BTreeMap;

pub const METHODOLOGY: &str = "statistical_z_score_percentile";

pub struct StatisticalStrategy<'b> {
    baselines: &'b Baselines,
}

impl<'b> StatisticalStrategy<'b> {
    pub fn new(baselines: &'b Baselines) -> Self {
        Self { baselines }
    }
}

impl ScoringStrategy for StatisticalStrategy<'_> {
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
        let readings = extract_all(&ctx);
        let empty = BTreeMap::new();

        let categories: BTreeMap<_, _> = Category::ALL
            .iter()
            .map(|&c| {
                let r = readings.get(&c).unwrap_or(&empty);
                (c, aggregate(c, r, self.baselines, config))
            })
            .collect();

        let confidence = coverage_confidence(&categories);
        Ok(CompositeResult::assemble(timestamp, categories, confidence, METHODOLOGY, config))
    }
}
