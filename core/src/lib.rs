//! Bubble risk scoring engine.
//!
//! Signals flow one way:
//!   SignalStore -> extractors -> normalizer -> aggregator -> composite
//!   -> presentation / registry

pub mod aggregator;
pub mod capex_extractor;
pub mod composite;
pub mod config;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod extractor;
pub mod heuristic;
pub mod liquidity_extractor;
pub mod normalizer;
pub mod positioning_extractor;
pub mod presentation;
pub mod qualitative;
pub mod registry;
pub mod sentiment_extractor;
pub mod signal;
pub mod statistical;
pub mod store;
pub mod strategy;
pub mod types;
pub mod valuation_extractor;

pub use composite::{BubbleRiskState, CompositeResult};
pub use config::{Baselines, ScoringConfig};
pub use engine::BubbleEngine;
pub use error::{ScoreError, ScoreResult};
pub use strategy::ScoringInputs;
