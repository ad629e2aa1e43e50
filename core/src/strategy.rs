//! Scoring strategy trait and selection.
//!
//! RULE: Every strategy produces the same CompositeResult contract.
//! RULE: Selection is deterministic:
//!   baselines and store present   -> statistical
//!   store or entries present      -> heuristic
//!   nothing                       -> ComputationFailure

use crate::{
    composite::CompositeResult,
    config::{Baselines, ScoringConfig},
    error::{ScoreError, ScoreResult},
    heuristic::HeuristicStrategy,
    qualitative::QualitativeEntry,
    statistical::StatisticalStrategy,
    store::SignalStore,
};

/// Everything one scoring invocation reads.
#[derive(Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub store:   Option<&'a SignalStore>,
    pub entries: &'a [QualitativeEntry],
}

impl<'a> ScoringInputs<'a> {
    pub fn new(store: Option<&'a SignalStore>, entries: &'a [QualitativeEntry]) -> Self {
        Self { store, entries }
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_none() && self.entries.is_empty()
    }
}

pub trait ScoringStrategy: Send + Sync {
    /// Stable tag written to `CompositeResult::methodology`.
    fn methodology(&self) -> &'static str;

    fn score(
        &self,
        inputs:    &ScoringInputs<'_>,
        config:    &ScoringConfig,
        timestamp: String,
    ) -> ScoreResult<CompositeResult>;
}

/// Pick a strategy for the inputs at hand.
pub fn select<'b>(
    inputs:    &ScoringInputs<'_>,
    baselines: Option<&'b Baselines>,
) -> ScoreResult<Box<dyn ScoringStrategy + 'b>> {
    match (baselines.filter(|b| !b.is_empty()), inputs.store) {
        (Some(b), Some(_)) => Ok(Box::new(StatisticalStrategy::new(b))),
        _ if !inputs.is_empty() => Ok(Box::new(HeuristicStrategy)),
        _ => Err(ScoreError::ComputationFailure {
            category: None,
            reason:   "no signal store, baselines or qualitative entries available".into(),
        }),
    }
}
