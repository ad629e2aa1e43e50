//! The scoring engine: the single entry point for producing a
//! CompositeResult.
//!
//! PIPELINE (fixed):
//!   1. Strategy selection (statistical or heuristic)
//!   2. Metric extraction, one extractor per category
//!   3. Normalization of each metric
//!   4. Category aggregation
//!   5. Composite assembly (weights, state, confidence, warnings)
//!
//! RULES:
//!   - Scoring is read-only; it never writes to the store.
//!   - The engine holds only immutable configuration, so one engine
//!     may serve many threads. Each thread brings its own store handle.
//!   - No caching: every call recomputes from current inputs.

use crate::{
    composite::CompositeResult,
    config::{Baselines, ScoringConfig},
    error::ScoreResult,
    store::SignalStore,
    strategy::{self, ScoringInputs, ScoringStrategy},
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;

pub struct BubbleEngine {
    config:    ScoringConfig,
    baselines: Option<Baselines>,
}

impl BubbleEngine {
    pub fn new(config: ScoringConfig, baselines: Option<Baselines>) -> Self {
        Self { config, baselines }
    }

    /// Build from the data/ directory (scoring config + baselines).
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let config = ScoringConfig::load(data_dir)?;
        let baselines = Baselines::load(data_dir)?;
        Ok(Self::new(config, baselines))
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn baselines(&self) -> Option<&Baselines> {
        self.baselines.as_ref()
    }

    /// Score the inputs now.
    pub fn score(&self, inputs: &ScoringInputs<'_>) -> ScoreResult<CompositeResult> {
        self.score_at(inputs, Utc::now())
    }

    /// Score the inputs with a fixed timestamp. Two calls over unchanged
    /// inputs with the same `now` produce identical results.
    pub fn score_at(
        &self,
        inputs: &ScoringInputs<'_>,
        now:    DateTime<Utc>,
    ) -> ScoreResult<CompositeResult> {
        let strategy = strategy::select(inputs, self.baselines.as_ref())?;
        self.score_with(strategy.as_ref(), inputs, now)
    }

    /// Score with an explicitly chosen strategy, bypassing selection.
    pub fn score_with(
        &self,
        strategy: &dyn ScoringStrategy,
        inputs:   &ScoringInputs<'_>,
        now:      DateTime<Utc>,
    ) -> ScoreResult<CompositeResult> {
        log::info!(
            "scoring with {} (store: {}, entries: {})",
            strategy.methodology(),
            inputs.store.is_some(),
            inputs.entries.len()
        );
        let result = strategy.score(inputs, &self.config, timestamp(now))?;
        log::info!(
            "overall {} ({}), confidence {}, coverage {}",
            result.overall_score,
            result.state,
            result.confidence,
            result.data_coverage
        );
        Ok(result)
    }
}

/// ISO-8601 UTC with a `Z` suffix.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Open a store read-only if the file exists. A missing file is the
/// normal "store not yet populated" condition.
pub fn open_store(path: &Path) -> ScoreResult<Option<SignalStore>> {
    if !path.exists() {
        log::warn!("no signal store at {}", path.display());
        return Ok(None);
    }
    let path = path.to_string_lossy();
    Ok(Some(SignalStore::open_read_only(&path)?))
}
