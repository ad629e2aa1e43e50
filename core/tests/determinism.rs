//! Scoring is a pure function of its inputs.
//!
//! Same store contents, same entries, same timestamp: identical results,
//! whichever thread or connection computes them.

mod common;

use bubble_core::{
    engine::{open_store, timestamp, BubbleEngine},
    heuristic::{self, HeuristicStrategy},
    statistical,
    store::SignalStore,
    Baselines, BubbleRiskState, ScoreError, ScoringConfig, ScoringInputs,
};
use chrono::{TimeZone, Utc};
use common::{empty_store, init_logging, populate, populated_store, sample_entries, SEED};

fn engine() -> BubbleEngine {
    init_logging();
    BubbleEngine::new(ScoringConfig::default_test(), Some(Baselines::default_test()))
}

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap()
}

#[test]
fn same_inputs_produce_identical_results() {
    let engine = engine();
    let store = populated_store(SEED);
    let entries = sample_entries();
    let inputs = ScoringInputs::new(Some(&store), &entries);

    let a = engine.score_at(&inputs, fixed_now()).expect("score a");
    let b = engine.score_at(&inputs, fixed_now()).expect("score b");
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).expect("json a"),
        serde_json::to_string(&b).expect("json b")
    );
}

/// Two stores written from the same seed score the same.
#[test]
fn same_seed_stores_score_the_same() {
    let engine = engine();
    let entries = sample_entries();
    let store_a = populated_store(SEED);
    let store_b = populated_store(SEED);

    let a = engine
        .score_at(&ScoringInputs::new(Some(&store_a), &entries), fixed_now())
        .expect("score a");
    let b = engine
        .score_at(&ScoringInputs::new(Some(&store_b), &entries), fixed_now())
        .expect("score b");
    assert_eq!(a, b);
}

#[test]
fn full_coverage_uses_statistical_strategy() {
    let engine = engine();
    let store = populated_store(SEED);
    let entries = sample_entries();
    let result = engine
        .score_at(&ScoringInputs::new(Some(&store), &entries), fixed_now())
        .expect("score");

    assert_eq!(result.methodology, statistical::METHODOLOGY);
    assert_eq!(result.categories.len(), 5);
    assert_eq!(result.data_coverage, "12/12 metrics");
    assert_eq!(result.confidence, 1.0);
    assert!((0.0..=100.0).contains(&result.overall_score));
    assert_eq!(result.timestamp, "2025-01-31T12:00:00.000000Z");
}

/// An empty store with baselines scores every category neutral at zero confidence.
#[test]
fn empty_store_scores_neutral() {
    let store = empty_store();
    let result = engine()
        .score_at(&ScoringInputs::new(Some(&store), &[]), fixed_now())
        .expect("score");

    assert_eq!(result.methodology, statistical::METHODOLOGY);
    assert_eq!(result.overall_score, 50.0);
    assert_eq!(result.state, BubbleRiskState::ModerateBubbleRisk);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.data_coverage, "0/12 metrics");
    assert!(result.categories.values().all(|c| c.score == 50.0 && c.n_available == 0));
}

#[test]
fn without_baselines_entries_use_heuristic() {
    let engine = BubbleEngine::new(ScoringConfig::default_test(), None);
    let entries = sample_entries();
    let result = engine
        .score_at(&ScoringInputs::new(None, &entries), fixed_now())
        .expect("score");

    assert_eq!(result.methodology, heuristic::METHODOLOGY);
    assert_eq!(result.categories.len(), 5);
    assert_eq!(result.confidence, 0.65);
    let capex = result.category(bubble_core::types::Category::Capex).expect("capex");
    assert_eq!(capex.score, 56.0);
}

/// Baselines alone are not enough: statistical scoring needs a store.
#[test]
fn baselines_without_store_fall_back_to_heuristic() {
    let entries = sample_entries();
    let result = engine()
        .score_at(&ScoringInputs::new(None, &entries), fixed_now())
        .expect("score");
    assert_eq!(result.methodology, heuristic::METHODOLOGY);
}

#[test]
fn nothing_to_score_is_a_computation_failure() {
    let err = engine()
        .score_at(&ScoringInputs::new(None, &[]), fixed_now())
        .expect_err("no inputs");
    assert!(matches!(err, ScoreError::ComputationFailure { category: None, .. }), "{err}");
}

/// Heuristic confidence grows with populated numeric tables.
#[test]
fn heuristic_confidence_counts_numeric_tables() {
    let engine = engine();
    let store = populated_store(SEED);
    let entries = sample_entries();
    let result = engine
        .score_with(&HeuristicStrategy, &ScoringInputs::new(Some(&store), &entries), fixed_now())
        .expect("score");
    // 0.65 base plus four populated numeric tables.
    assert_eq!(result.confidence, 0.73);
    assert_eq!(result.methodology, heuristic::METHODOLOGY);
}

#[test]
fn timestamps_are_utc_with_z_suffix() {
    let ts = timestamp(fixed_now());
    assert!(ts.ends_with('Z'), "{ts}");
    assert!(ts.starts_with("2025-01-31T12:00:00"));
}

#[test]
fn missing_store_file_is_not_an_error() {
    let path = std::env::temp_dir().join(format!("bubble-missing-{}.db", uuid::Uuid::new_v4()));
    assert!(open_store(&path).expect("open").is_none());
}

/// Concurrent readers each hold their own read-only connection and agree.
#[test]
fn concurrent_read_only_scoring_agrees() {
    let path = std::env::temp_dir().join(format!("bubble-{}.db", uuid::Uuid::new_v4()));
    let path_str = path.to_string_lossy().to_string();

    // The writer stays open for the whole test, as a collector would.
    let writer = SignalStore::open(&path_str).expect("writer");
    writer.migrate().expect("migration");
    populate(&writer, SEED);

    let engine = engine();
    let entries = sample_entries();
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    let store = open_store(&path).expect("open").expect("store exists");
                    engine
                        .score_at(&ScoringInputs::new(Some(&store), &entries), fixed_now())
                        .expect("score")
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("thread")).collect()
    });

    let reference = engine
        .score_at(&ScoringInputs::new(Some(&writer), &entries), fixed_now())
        .expect("reference score");
    for r in &results {
        assert_eq!(r, &reference);
    }

    drop(writer);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
    }
}

/// An unreadable store degrades every store-backed component but still scores.
#[test]
fn unreadable_store_still_scores_heuristically() {
    let path = std::env::temp_dir().join(format!("bubble-junk-{}.db", uuid::Uuid::new_v4()));
    std::fs::write(&path, [0x5au8; 100]).expect("write junk");
    let store = SignalStore::open_read_only(&path.to_string_lossy()).expect("lazy open");

    let engine = BubbleEngine::new(ScoringConfig::default_test(), None);
    let entries = sample_entries();
    let result = engine
        .score_at(&ScoringInputs::new(Some(&store), &entries), fixed_now())
        .expect("heuristic score");
    assert_eq!(result.methodology, heuristic::METHODOLOGY);
    assert_eq!(result.confidence, 0.65);
    assert_eq!(heuristic::heuristic_confidence(entries.len(), Some(&store)), 0.65);

    drop(store);
    let _ = std::fs::remove_file(&path);
}
