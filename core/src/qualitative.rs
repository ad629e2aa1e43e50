//! Curated text-derived entries (the bubble dataset document).
//!
//! RULE: Loading is lenient. A missing document is an empty sequence,
//! a bad record is skipped, a bad document degrades to empty with a warning.

use crate::error::ScoreResult;
use crate::types::Category;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Coarse mood label attached to every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    PeakHype,
    Warning,
    Correction,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PeakHype   => "peak_hype",
            Self::Warning    => "warning",
            Self::Correction => "correction",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeEntry {
    #[serde(default)]
    pub title:           String,
    #[serde(default)]
    pub date:            String,
    pub sentiment:       SentimentLabel,
    /// Compound score in -1..1 for text entries; category-specific for others.
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(default = "default_category")]
    pub category:        String,
    #[serde(default)]
    pub content:         String,
}

fn default_category() -> String {
    Category::Sentiment.as_str().to_string()
}

/// Numbers are kept, anything else (strings, null, objects) is `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw.as_f64().filter(|v| v.is_finite()))
}

impl QualitativeEntry {
    pub fn category(&self) -> Option<Category> {
        Category::parse(&self.category)
    }

    pub fn is_category(&self, category: Category) -> bool {
        self.category == category.as_str()
    }

    pub fn content_contains(&self, needle: &str) -> bool {
        self.content.to_lowercase().contains(needle)
    }
}

/// Parse a dataset document. Never fails.
pub fn parse_entries(text: &str) -> Vec<QualitativeEntry> {
    let records: Vec<serde_json::Value> = match serde_json::from_str(text) {
        Ok(serde_json::Value::Array(records)) => records,
        Ok(_) => {
            log::warn!("entries document is not a JSON array; using no entries");
            return Vec::new();
        }
        Err(e) => {
            log::warn!("entries document unparseable ({e}); using no entries");
            return Vec::new();
        }
    };

    let total = records.len();
    let entries: Vec<QualitativeEntry> = records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value(record) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("skipping entry {i}: {e}");
                None
            }
        })
        .collect();
    if entries.len() < total {
        log::warn!("skipped {} of {total} malformed entries", total - entries.len());
    }
    entries
}

/// Load a dataset document from disk. A missing file is an empty sequence.
pub fn load_entries(path: &Path) -> ScoreResult<Vec<QualitativeEntry>> {
    if !path.exists() {
        log::debug!("no entries document at {}", path.display());
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)?;
    Ok(parse_entries(&text))
}
