//! Human-facing renderings of a CompositeResult: speech text, the
//! simplified bubble state for the conversational layer, and the
//! legacy analysis shape older consumers still read.

use crate::{
    composite::{CompositeResult, HistoricalComparison},
    types::{Category, MetricName},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// low < 33 <= medium < 67 <= high
    pub fn from_score(score: f64) -> Self {
        if score < 33.0 {
            Self::Low
        } else if score < 67.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn personality(&self) -> &'static str {
        match self {
            Self::Low => {
                "Confident and inflated. Feeling euphoric and expansive. \
                 Full of optimism about AI's future. Dismissive of concerns."
            }
            Self::Medium => {
                "Anxious and uncertain. Starting to feel wobbly and uncomfortable. \
                 Aware of growing pressures. Nervous about the future."
            }
            Self::High => {
                "Panicked and unwell. Feeling fragile and about to pop. \
                 Overwhelmed by warning signs. Desperate and unstable."
            }
        }
    }
}

/// What the conversational layer personifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleState {
    pub risk_score:  f64,
    pub risk_level:  RiskLevel,
    pub personality: String,
    pub summary:     String,
}

fn spoken(label: &str) -> String {
    label.replace('_', " ").to_lowercase()
}

/// Speech-ready summary for text-to-speech.
pub fn format_for_speech(result: &CompositeResult) -> String {
    let mut speech = format!(
        "The AI bubble risk score is {:.1} out of 100. Current state: {}. ",
        result.overall_score,
        spoken(result.state.as_str())
    );
    speech.push_str("Individual metrics: ");
    for (category, r) in &result.categories {
        speech.push_str(&format!(
            "{category}, {:.1} out of 100, {}. ",
            r.score,
            spoken(&r.descriptor)
        ));
    }
    if !result.warning_signals.is_empty() {
        speech.push_str("Warning signals: ");
        speech.push_str(&result.warning_signals.join(" "));
    }
    speech
}

/// One line per category plus coverage, for prompts and logs.
pub fn metrics_summary(result: &CompositeResult) -> String {
    let parts: Vec<String> = result
        .categories
        .iter()
        .map(|(c, r)| format!("{}: {:.1}/100 ({})", capitalize(c.as_str()), r.score, r.descriptor))
        .collect();
    format!(
        "{}. Confidence {:.0}%, {}.",
        parts.join(". "),
        result.confidence * 100.0,
        result.data_coverage
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn to_bubble_state(result: &CompositeResult) -> BubbleState {
    let level = RiskLevel::from_score(result.overall_score);
    BubbleState {
        risk_score:  result.overall_score,
        risk_level:  level,
        personality: level.personality().to_string(),
        summary:     metrics_summary(result),
    }
}

// ── Legacy shape ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyMetricScore {
    pub score:      f64,
    pub state:      String,
    pub indicators: BTreeMap<MetricName, Option<f64>>,
    pub weight:     f64,
}

/// The analysis layout used before categories carried full metric results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleAnalysisView {
    pub timestamp:             String,
    pub overall_bubble_score:  f64,
    pub bubble_state:          String,
    pub confidence:            f64,
    pub metrics:               BTreeMap<Category, LegacyMetricScore>,
    pub warning_signals:       Vec<String>,
    pub historical_comparison: HistoricalComparison,
}

impl From<&CompositeResult> for BubbleAnalysisView {
    fn from(result: &CompositeResult) -> Self {
        let metrics = result
            .categories
            .iter()
            .map(|(c, r)| {
                let indicators = r
                    .metrics
                    .iter()
                    .map(|(name, m)| (name.clone(), m.value))
                    .collect();
                (
                    *c,
                    LegacyMetricScore {
                        score: r.score,
                        state: r.descriptor.clone(),
                        indicators,
                        weight: c.weight(),
                    },
                )
            })
            .collect();
        Self {
            timestamp:             result.timestamp.clone(),
            overall_bubble_score:  result.overall_score,
            bubble_state:          result.state.as_str().to_string(),
            confidence:            result.confidence,
            metrics,
            warning_signals:       result.warning_signals.clone(),
            historical_comparison: result.historical_comparison,
        }
    }
}
