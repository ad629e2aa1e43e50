//! Composite result assembly shared by every scoring strategy.
//!
//! RULE: overall_score = round(Σ category.score × category.weight, 1).
//! RULE: warning_signals always holds between 1 and max_warnings items.
//! RULE: confidence is in [0, 1] and is 0 when nothing could be scored.

use crate::{
    aggregator::CategoryResult,
    config::{ReferencePeaks, ScoringConfig, StateThresholds},
    types::{round_to, Category},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const NO_WARNINGS: &str = "No critical warnings at this time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BubbleRiskState {
    CriticalBubbleRisk,
    HighBubbleRisk,
    ModerateBubbleRisk,
    ElevatedRisk,
    NormalMarket,
}

impl BubbleRiskState {
    pub fn from_score(score: f64, t: &StateThresholds) -> Self {
        match score {
            s if s >= t.critical => Self::CriticalBubbleRisk,
            s if s >= t.high     => Self::HighBubbleRisk,
            s if s >= t.elevated => Self::ModerateBubbleRisk,
            s if s >= t.moderate => Self::ElevatedRisk,
            _                    => Self::NormalMarket,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalBubbleRisk => "CRITICAL_BUBBLE_RISK",
            Self::HighBubbleRisk     => "HIGH_BUBBLE_RISK",
            Self::ModerateBubbleRisk => "MODERATE_BUBBLE_RISK",
            Self::ElevatedRisk       => "ELEVATED_RISK",
            Self::NormalMarket       => "NORMAL_MARKET",
        }
    }
}

impl fmt::Display for BubbleRiskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Extremity {
    MoreExtreme,
    LessExtreme,
}

/// Similarity of the current score to three historical bubble peaks,
/// each `min(score / peak, 1.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalComparison {
    pub dotcom_2000:  f64,
    pub crypto_2022:  f64,
    pub housing_2008: f64,
    pub comparison:   Extremity,
}

impl HistoricalComparison {
    pub fn against(score: f64, peaks: &ReferencePeaks) -> Self {
        let ratio = |peak: f64| {
            if peak > 0.0 {
                round_to((score / peak).min(1.0), 2)
            } else {
                1.0
            }
        };
        Self {
            dotcom_2000:  ratio(peaks.dotcom_2000),
            crypto_2022:  ratio(peaks.crypto_2022),
            housing_2008: ratio(peaks.housing_2008),
            comparison:   if score > peaks.dotcom_2000 {
                Extremity::MoreExtreme
            } else {
                Extremity::LessExtreme
            },
        }
    }
}

/// The externally consumed scoring artifact. Each invocation produces
/// an independent snapshot; nothing here is mutated after assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub timestamp:             String,
    #[serde(alias = "overall_bubble_score")]
    pub overall_score:         f64,
    #[serde(alias = "bubble_state")]
    pub state:                 BubbleRiskState,
    pub confidence:            f64,
    #[serde(alias = "metrics")]
    pub categories:            BTreeMap<Category, CategoryResult>,
    pub warning_signals:       Vec<String>,
    pub historical_comparison: HistoricalComparison,
    pub methodology:           String,
    pub data_coverage:         String,
}

impl CompositeResult {
    /// Derive every composite field from finished category results.
    pub fn assemble(
        timestamp:   String,
        categories:  BTreeMap<Category, CategoryResult>,
        confidence:  f64,
        methodology: &str,
        config:      &ScoringConfig,
    ) -> Self {
        let overall_score = weighted_score(&categories);
        let (available, total) = coverage(&categories);
        Self {
            timestamp,
            overall_score,
            state: BubbleRiskState::from_score(overall_score, &config.bubble_thresholds),
            confidence: round_to(confidence.clamp(0.0, 1.0), 2),
            warning_signals: warning_signals(&categories, config),
            historical_comparison: HistoricalComparison::against(overall_score, &config.reference_peaks),
            categories,
            methodology: methodology.to_string(),
            data_coverage: format!("{available}/{total} metrics"),
        }
    }

    pub fn category(&self, category: Category) -> Option<&CategoryResult> {
        self.categories.get(&category)
    }
}

/// `round(Σ score × weight, 1)`. A missing category contributes nothing.
pub fn weighted_score(categories: &BTreeMap<Category, CategoryResult>) -> f64 {
    let sum: f64 = categories
        .iter()
        .map(|(c, r)| r.score * c.weight())
        .sum();
    round_to(sum.clamp(0.0, 100.0), 1)
}

/// (available, total) metric counts across categories.
pub fn coverage(categories: &BTreeMap<Category, CategoryResult>) -> (usize, usize) {
    categories.values().fold((0, 0), |(a, t), r| (a + r.n_available, t + r.n_total))
}

/// `available / total`, defined as 0 when there is nothing to count.
pub fn coverage_confidence(categories: &BTreeMap<Category, CategoryResult>) -> f64 {
    match coverage(categories) {
        (_, 0) => 0.0,
        (available, total) => available as f64 / total as f64,
    }
}

/// Rule-driven warnings, in category order then rule order, capped.
pub fn warning_signals(
    categories: &BTreeMap<Category, CategoryResult>,
    config:     &ScoringConfig,
) -> Vec<String> {
    let mut warnings: Vec<String> = categories
        .iter()
        .flat_map(|(category, result)| {
            config.warning_rules.iter().filter(move |rule| {
                rule.category == *category
                    && result.score >= rule.min_score
                    && result.descriptor == rule.descriptor
            })
        })
        .map(|rule| rule.message.clone())
        .collect();
    warnings.truncate(config.max_warnings.max(1));
    if warnings.is_empty() {
        warnings.push(NO_WARNINGS.to_string());
    }
    warnings
}
