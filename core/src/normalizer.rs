//! Maps raw metric values onto the common 0–100 risk scale.
//!
//! RULE: Every risk score leaves this module clamped to [0, 100].
//! RULE: A missing, non-finite or unavailable input is never an error;
//! it resolves to the neutral result (risk 50, "DATA NOT AVAILABLE").

use crate::types::round_to;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

pub const NOT_AVAILABLE: &str = "DATA NOT AVAILABLE";
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Default slope of the linear z mapping (points per standard deviation).
pub const DEFAULT_Z_SCALE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    HigherIsRiskier,
    LowerIsRiskier,
}

/// Which normalization a baseline asks for.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    #[default]
    ZScore,
    Percentile { peers: Vec<f64> },
    MinMax { min: f64, max: f64 },
}

/// Static reference distribution for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    #[serde(default)]
    pub mean:      Option<f64>,
    #[serde(default)]
    pub std:       Option<f64>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub policy:    Policy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source:    Option<String>,
}

fn default_available() -> bool {
    true
}

impl Baseline {
    pub fn z(mean: f64, std: f64, direction: Direction) -> Self {
        Self {
            mean: Some(mean),
            std: Some(std),
            direction,
            available: true,
            policy: Policy::ZScore,
            source: None,
        }
    }

    pub fn min_max(min: f64, max: f64, direction: Direction) -> Self {
        Self {
            mean: None,
            std: None,
            direction,
            available: true,
            policy: Policy::MinMax { min, max },
            source: None,
        }
    }

    pub fn percentile(peers: Vec<f64>, direction: Direction) -> Self {
        Self {
            mean: None,
            std: None,
            direction,
            available: true,
            policy: Policy::Percentile { peers },
            source: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mean: None,
            std: None,
            direction: Direction::HigherIsRiskier,
            available: false,
            policy: Policy::ZScore,
            source: None,
        }
    }
}

/// Score of one metric against its baseline. Built fresh per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub value:          Option<f64>,
    pub z_score:        f64,
    pub percentile:     f64,
    pub risk_score:     f64,
    pub interpretation: String,
    pub available:      bool,
    pub baseline_mean:  Option<f64>,
    pub baseline_std:   Option<f64>,
}

impl MetricResult {
    pub fn not_available(value: Option<f64>, baseline: &Baseline) -> Self {
        Self {
            value,
            z_score:        0.0,
            percentile:     50.0,
            risk_score:     NEUTRAL_SCORE,
            interpretation: NOT_AVAILABLE.to_string(),
            available:      false,
            baseline_mean:  baseline.mean,
            baseline_std:   baseline.std,
        }
    }
}

// ── Primitive mappings ────────────────────────────────────────────

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return NEUTRAL_SCORE;
    }
    score.clamp(0.0, 100.0)
}

/// `(value - mean) / std`; zero when the spread is degenerate.
pub fn z_score(value: f64, mean: f64, std: f64) -> f64 {
    if std == 0.0 || !std.is_finite() {
        return 0.0;
    }
    let z = (value - mean) / std;
    if z.is_finite() { z } else { 0.0 }
}

/// Standard normal CDF scaled to 0–100.
pub fn z_to_percentile(z: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|n| n.cdf(z) * 100.0)
        .unwrap_or(50.0)
}

/// Soft S-curve from percentile to risk, saturating toward the extremes.
pub fn percentile_to_risk(percentile: f64, direction: Direction) -> f64 {
    let normalized = match direction {
        Direction::HigherIsRiskier => (percentile - 50.0) / 50.0,
        Direction::LowerIsRiskier  => (50.0 - percentile) / 50.0,
    };
    clamp_score(50.0 + 50.0 * (1.5 * normalized).tanh())
}

/// Share of peers strictly below `value`, as 0–100, flipped when lower
/// is riskier. No peers ⇒ neutral.
pub fn score_percentile(value: f64, peers: &[f64], direction: Direction) -> f64 {
    let peers: Vec<f64> = peers.iter().copied().filter(|p| p.is_finite()).collect();
    if peers.is_empty() {
        return NEUTRAL_SCORE;
    }
    let below = peers.iter().filter(|&&p| p < value).count();
    let pct = below as f64 / peers.len() as f64 * 100.0;
    match direction {
        Direction::HigherIsRiskier => pct,
        Direction::LowerIsRiskier  => 100.0 - pct,
    }
}

/// Position of `value` between `min` and `max`, clamped, as 0–100.
pub fn score_minmax(value: f64, min: f64, max: f64, direction: Direction) -> f64 {
    if max == min {
        return NEUTRAL_SCORE;
    }
    let pct = ((value - min) / (max - min)).clamp(0.0, 1.0);
    match direction {
        Direction::HigherIsRiskier => pct * 100.0,
        Direction::LowerIsRiskier  => (1.0 - pct) * 100.0,
    }
}

/// `50 + z * scale`, clamped. Used by the heuristic strategy.
pub fn linear_z_score(z: f64, scale: f64) -> f64 {
    clamp_score(50.0 + z * scale)
}

/// Map a -1..1 compound sentiment to 0–100, boosting strongly positive values.
pub fn normalize_compound(compound: Option<f64>) -> f64 {
    let Some(c) = compound.filter(|c| c.is_finite()) else {
        return NEUTRAL_SCORE;
    };
    let base = if c > 0.5 {
        70.0 + (c - 0.5) * 60.0
    } else {
        (c + 1.0) / 2.0 * 100.0
    };
    clamp_score(base)
}

pub fn interpret_percentile(percentile: f64) -> &'static str {
    match percentile {
        p if p >= 95.0 => "EXTREME (top 5%)",
        p if p >= 90.0 => "VERY HIGH (top 10%)",
        p if p >= 75.0 => "HIGH (top 25%)",
        p if p >= 50.0 => "ABOVE AVERAGE",
        p if p >= 25.0 => "BELOW AVERAGE",
        p if p >= 10.0 => "LOW (bottom 10%)",
        _              => "VERY LOW (bottom 5%)",
    }
}

// ── Metric scoring ────────────────────────────────────────────────

/// Score one current value against its baseline.
pub fn score_metric(value: Option<f64>, baseline: &Baseline) -> MetricResult {
    let current = match value {
        Some(v) if v.is_finite() && baseline.available => v,
        _ => return MetricResult::not_available(value, baseline),
    };

    let std = baseline.std.unwrap_or(0.0);
    let (z, percentile, risk) = match &baseline.policy {
        Policy::ZScore => {
            let Some(mean) = baseline.mean else {
                return MetricResult::not_available(value, baseline);
            };
            let z = z_score(current, mean, std);
            let percentile = z_to_percentile(z);
            (z, percentile, percentile_to_risk(percentile, baseline.direction))
        }
        Policy::Percentile { peers } => {
            let risk = score_percentile(current, peers, baseline.direction);
            let percentile = score_percentile(current, peers, Direction::HigherIsRiskier);
            (reference_z(current, baseline), percentile, risk)
        }
        Policy::MinMax { min, max } => {
            let risk = score_minmax(current, *min, *max, baseline.direction);
            let percentile = score_minmax(current, *min, *max, Direction::HigherIsRiskier);
            (reference_z(current, baseline), percentile, risk)
        }
    };

    MetricResult {
        value:          Some(current),
        z_score:        round_to(z, 2),
        percentile:     round_to(percentile, 1),
        risk_score:     round_to(clamp_score(risk), 1),
        interpretation: interpret_percentile(percentile).to_string(),
        available:      true,
        baseline_mean:  baseline.mean,
        baseline_std:   baseline.std,
    }
}

/// z against the baseline's mean/std when it carries one, else 0.
fn reference_z(value: f64, baseline: &Baseline) -> f64 {
    match (baseline.mean, baseline.std) {
        (Some(mean), Some(std)) => z_score(value, mean, std),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_std_is_neutral() {
        let r = score_metric(Some(40.0), &Baseline::z(25.0, 0.0, Direction::HigherIsRiskier));
        assert!(r.available);
        assert_eq!(r.z_score, 0.0);
        assert_eq!(r.percentile, 50.0);
        assert_eq!(r.risk_score, 50.0);
    }

    #[test]
    fn degenerate_bounds_are_neutral() {
        assert_eq!(score_minmax(3.0, 1.0, 1.0, Direction::LowerIsRiskier), 50.0);
        assert_eq!(score_percentile(3.0, &[], Direction::HigherIsRiskier), 50.0);
    }

    #[test]
    fn compound_boost_above_half() {
        assert_eq!(normalize_compound(Some(0.0)), 50.0);
        assert!((normalize_compound(Some(0.75)) - 85.0).abs() < 1e-9);
        assert_eq!(normalize_compound(Some(1.0)), 100.0);
        assert_eq!(normalize_compound(None), 50.0);
    }
}
