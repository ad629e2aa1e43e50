//! Per-category aggregation of scored metrics.
//!
//! RULE: A metric with no baseline is skipped entirely (not counted).
//! A metric with a baseline is always recorded, available or not.
//! RULE: Category score is the mean of available risk scores, 50 if none.

use crate::{
    config::{Baselines, ScoringConfig, StateThresholds},
    extractor::MetricReadings,
    normalizer::{score_metric, MetricResult, NEUTRAL_SCORE},
    types::{round_to, Category, MetricName},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Five-bucket category state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryState {
    Critical,
    HighRisk,
    Elevated,
    Moderate,
    Normal,
}

impl CategoryState {
    pub fn from_score(score: f64, t: &StateThresholds) -> Self {
        match score {
            s if s >= t.critical => Self::Critical,
            s if s >= t.high     => Self::HighRisk,
            s if s >= t.elevated => Self::Elevated,
            s if s >= t.moderate => Self::Moderate,
            _                    => Self::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::HighRisk => "HIGH_RISK",
            Self::Elevated => "ELEVATED",
            Self::Moderate => "MODERATE",
            Self::Normal   => "NORMAL",
        }
    }
}

impl fmt::Display for CategoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub score:       f64,
    pub state:       CategoryState,
    /// Category-specific label, e.g. SEVERELY_OVERVALUED.
    pub descriptor:  String,
    pub metrics:     BTreeMap<MetricName, MetricResult>,
    pub n_available: usize,
    pub n_total:     usize,
}

impl CategoryResult {
    /// Build a result from a finished score. Used by strategies that do
    /// not score individual metrics against baselines.
    pub fn from_score(
        category: Category,
        score:    f64,
        metrics:  BTreeMap<MetricName, MetricResult>,
        config:   &ScoringConfig,
    ) -> Self {
        let score = round_to(score.clamp(0.0, 100.0), 1);
        let n_total = metrics.len();
        let n_available = metrics.values().filter(|m| m.available).count();
        Self {
            score,
            state: CategoryState::from_score(score, &config.category_thresholds),
            descriptor: config.descriptor(category, score),
            metrics,
            n_available,
            n_total,
        }
    }
}

/// Score every configured metric of `category` against its baseline.
pub fn aggregate(
    category:  Category,
    readings:  &MetricReadings,
    baselines: &Baselines,
    config:    &ScoringConfig,
) -> CategoryResult {
    let mut metrics = BTreeMap::new();
    let mut available = Vec::new();

    for name in config.metric_names(category) {
        let Some(baseline) = baselines.get(category, name) else {
            log::debug!("{category}.{name}: no baseline, skipped");
            continue;
        };
        let value = readings.get(name).and_then(|r| r.as_ref().ok()).copied();
        let result = score_metric(value, baseline);
        if result.available {
            available.push(result.risk_score);
        }
        metrics.insert(name.clone(), result);
    }

    let score = if available.is_empty() {
        NEUTRAL_SCORE
    } else {
        available.iter().sum::<f64>() / available.len() as f64
    };
    let result = CategoryResult::from_score(category, score, metrics, config);
    log::debug!(
        "{category}: score {} ({}) {}/{} metrics",
        result.score,
        result.state,
        result.n_available,
        result.n_total
    );
    result
}
