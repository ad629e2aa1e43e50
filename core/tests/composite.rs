//! Category aggregation and composite assembly.

use bubble_core::{
    aggregator::{aggregate, CategoryResult, CategoryState},
    composite::{coverage_confidence, weighted_score, Extremity, HistoricalComparison, NO_WARNINGS},
    config::{ReferencePeaks, StateThresholds, WarningRule},
    extractor::{Absent, MetricReadings},
    normalizer::{Baseline, Direction, NOT_AVAILABLE},
    types::Category,
    Baselines, BubbleRiskState, CompositeResult, ScoringConfig,
};
use std::collections::BTreeMap;

fn categories_with(scores: [f64; 5], config: &ScoringConfig) -> BTreeMap<Category, CategoryResult> {
    Category::ALL
        .iter()
        .zip(scores)
        .map(|(&c, s)| (c, CategoryResult::from_score(c, s, BTreeMap::new(), config)))
        .collect()
}

fn assemble(scores: [f64; 5], config: &ScoringConfig) -> CompositeResult {
    let categories = categories_with(scores, config);
    let confidence = coverage_confidence(&categories);
    CompositeResult::assemble("2025-01-01T00:00:00Z".into(), categories, confidence, "test", config)
}

// ── Aggregation ───────────────────────────────────────────────────

/// Metrics without a baseline are skipped; metrics with one always appear.
#[test]
fn unbaselined_metrics_are_skipped() {
    let config = ScoringConfig::default_test();
    let mut baselines = Baselines::default();
    baselines.insert(
        Category::Valuation,
        "forward_pe_mean",
        Baseline::z(25.0, 5.0, Direction::HigherIsRiskier),
    );

    let mut readings = MetricReadings::new();
    readings.insert("forward_pe_mean".into(), Ok(30.0));
    readings.insert("price_level_pct".into(), Ok(0.2));

    let r = aggregate(Category::Valuation, &readings, &baselines, &config);
    assert_eq!(r.n_total, 1);
    assert_eq!(r.n_available, 1);
    assert!(!r.metrics.contains_key("price_level_pct"));
    assert!(r.score > 88.0 && r.score < 89.0, "score {}", r.score);
    assert_eq!(r.state, CategoryState::Critical);
    assert_eq!(r.descriptor, "SEVERELY_OVERVALUED");
}

/// A category whose every metric is absent scores neutral, not an error.
#[test]
fn all_absent_category_is_neutral() {
    let config = ScoringConfig::default_test();
    let baselines = Baselines::default_test();
    let mut readings = MetricReadings::new();
    readings.insert("US_10Y_real_yield".into(), Err(Absent::unavailable("fred_macro")));
    readings.insert("US_M2_YoY_growth".into(), Err(Absent::insufficient("fred_macro.m2", 13, 4)));

    let r = aggregate(Category::Liquidity, &readings, &baselines, &config);
    assert_eq!(r.score, 50.0);
    assert_eq!(r.n_available, 0);
    assert_eq!(r.n_total, 3);
    assert!(r.metrics.values().all(|m| m.interpretation == NOT_AVAILABLE));
    assert_eq!(r.state, CategoryState::Elevated);
}

/// The category score is the plain mean of available risk scores.
#[test]
fn category_score_averages_available_metrics() {
    let config = ScoringConfig::default_test();
    let baselines = Baselines::default_test();
    let mut readings = MetricReadings::new();
    // min-max 50..100, higher is riskier: 75 sits at 50, 100 at the top.
    readings.insert("capex_mention_score".into(), Ok(100.0));
    readings.insert("capex_intensity".into(), Ok(10.0));

    let r = aggregate(Category::Capex, &readings, &baselines, &config);
    assert_eq!(r.metrics["capex_mention_score"].risk_score, 100.0);
    assert_eq!(r.metrics["capex_intensity"].risk_score, 50.0);
    assert_eq!(r.score, 75.0);
    assert_eq!(r.descriptor, "UNSUSTAINABLE");
}

// ── Composite ─────────────────────────────────────────────────────

#[test]
fn overall_score_is_the_weighted_sum() {
    let config = ScoringConfig::default_test();
    let categories = categories_with([70.0, 40.0, 20.0, 50.0, 45.0], &config);
    assert_eq!(weighted_score(&categories), 47.5);

    let result = assemble([70.0, 40.0, 20.0, 50.0, 45.0], &config);
    assert_eq!(result.overall_score, 47.5);
    assert_eq!(result.state, BubbleRiskState::ElevatedRisk);

    let spread = categories_with([25.0, 50.0, 75.0, 100.0, 0.0], &config);
    assert_eq!(weighted_score(&spread), 47.5);
}

#[test]
fn uniform_sixty_six_is_high_bubble_risk() {
    let result = assemble([66.0; 5], &ScoringConfig::default_test());
    assert_eq!(result.overall_score, 66.0);
    assert_eq!(result.state, BubbleRiskState::HighBubbleRisk);
    assert_eq!(result.state.as_str(), "HIGH_BUBBLE_RISK");
}

/// Stretched valuations and euphoric sentiment against easy liquidity.
#[test]
fn mixed_categories_reach_high_bubble_risk() {
    let result = assemble([90.0, 80.0, 50.0, 40.0, 60.0], &ScoringConfig::default_test());
    assert_eq!(result.overall_score, 66.0);
    assert_eq!(result.state, BubbleRiskState::HighBubbleRisk);
    assert_eq!(result.warning_signals.len(), 2);
    assert!(result.warning_signals[0].starts_with("Valuations at extreme levels"));
    assert!(result.warning_signals[1].starts_with("Sentiment at peak euphoria"));
}

#[test]
fn bubble_state_boundaries() {
    let t = StateThresholds::default();
    assert_eq!(BubbleRiskState::from_score(80.0, &t), BubbleRiskState::CriticalBubbleRisk);
    assert_eq!(BubbleRiskState::from_score(79.9, &t), BubbleRiskState::HighBubbleRisk);
    assert_eq!(BubbleRiskState::from_score(50.0, &t), BubbleRiskState::ModerateBubbleRisk);
    assert_eq!(BubbleRiskState::from_score(35.0, &t), BubbleRiskState::ElevatedRisk);
    assert_eq!(BubbleRiskState::from_score(0.0, &t), BubbleRiskState::NormalMarket);
}

/// No matching rule still yields exactly one placeholder warning.
#[test]
fn calm_market_gets_placeholder_warning() {
    let result = assemble([50.0; 5], &ScoringConfig::default_test());
    assert_eq!(result.warning_signals, vec![NO_WARNINGS.to_string()]);
}

#[test]
fn warnings_are_capped() {
    let mut config = ScoringConfig::default_test();
    config.warning_rules = (0..7)
        .map(|i| WarningRule {
            category:   Category::Valuation,
            min_score:  0.0,
            descriptor: "SEVERELY_OVERVALUED".into(),
            message:    format!("valuation warning {i}"),
        })
        .collect();

    let result = assemble([90.0, 50.0, 50.0, 50.0, 50.0], &config);
    assert_eq!(result.warning_signals.len(), 5);
    assert_eq!(result.warning_signals[0], "valuation warning 0");
}

/// The default rules need both the score and the descriptor.
#[test]
fn default_rules_fire_on_extreme_categories() {
    let result = assemble([85.0, 80.0, 50.0, 50.0, 90.0], &ScoringConfig::default_test());
    assert_eq!(result.warning_signals.len(), 3);
    assert!(result.warning_signals[0].starts_with("Valuations at extreme levels"));
    assert!(result.warning_signals[2].starts_with("Capex spending"));
}

/// Nothing to count means zero confidence, never a division by zero.
#[test]
fn empty_coverage_has_zero_confidence() {
    let result = assemble([50.0; 5], &ScoringConfig::default_test());
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.data_coverage, "0/0 metrics");
}

#[test]
fn historical_comparison_caps_at_one() {
    let peaks = ReferencePeaks::default();
    let at_peak = HistoricalComparison::against(85.0, &peaks);
    assert_eq!(at_peak.dotcom_2000, 1.0);
    assert_eq!(at_peak.housing_2008, 1.0);
    assert_eq!(at_peak.comparison, Extremity::LessExtreme);

    let half = HistoricalComparison::against(42.5, &peaks);
    assert_eq!(half.dotcom_2000, 0.5);
    assert_eq!(half.crypto_2022, 0.54);
    assert_eq!(half.housing_2008, 0.59);

    assert_eq!(HistoricalComparison::against(90.0, &peaks).comparison, Extremity::MoreExtreme);
}

/// Published JSON uses snake_case category keys and SCREAMING_SNAKE_CASE states.
#[test]
fn result_serializes_with_stable_names() {
    let result = assemble([66.0; 5], &ScoringConfig::default_test());
    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["state"], "HIGH_BUBBLE_RISK");
    assert_eq!(json["categories"]["capex"]["state"], "HIGH_RISK");
    assert_eq!(json["historical_comparison"]["comparison"], "LESS_EXTREME");

    let back: CompositeResult = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, result);
}

/// Older consumers wrote the score and state under different names.
#[test]
fn legacy_field_names_are_accepted() {
    let result = assemble([40.0; 5], &ScoringConfig::default_test());
    let mut json = serde_json::to_value(&result).expect("serialize");
    let obj = json.as_object_mut().expect("object");
    let score = obj.remove("overall_score").expect("score");
    let state = obj.remove("state").expect("state");
    let categories = obj.remove("categories").expect("categories");
    obj.insert("overall_bubble_score".into(), score);
    obj.insert("bubble_state".into(), state);
    obj.insert("metrics".into(), categories);

    let back: CompositeResult = serde_json::from_value(json).expect("deserialize legacy");
    assert_eq!(back.overall_score, 40.0);
    assert_eq!(back.state, BubbleRiskState::ElevatedRisk);
}
