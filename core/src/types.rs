//! Shared primitive types used across the entire scoring engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a scored bubble ("market", "personal_user123", ...).
pub type BubbleId = String;

/// Stable name of a single metric inside a category.
pub type MetricName = String;

/// The five scoring categories.
/// Declaration order is the canonical output order. Never reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Valuation,
    Sentiment,
    Positioning,
    Liquidity,
    Capex,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Valuation,
        Category::Sentiment,
        Category::Positioning,
        Category::Liquidity,
        Category::Capex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valuation   => "valuation",
            Self::Sentiment   => "sentiment",
            Self::Positioning => "positioning",
            Self::Liquidity   => "liquidity",
            Self::Capex       => "capex",
        }
    }

    /// Fixed composite weight. The five weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Valuation   => 0.25,
            Self::Sentiment   => 0.20,
            Self::Positioning => 0.15,
            Self::Liquidity   => 0.20,
            Self::Capex       => 0.20,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to `dp` decimal places, the way every published number is rounded.
pub fn round_to(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = Category::ALL.iter().map(|c| c.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12, "weights sum to {total}");
    }

    #[test]
    fn parse_round_trips_every_category() {
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
        }
        assert_eq!(Category::parse("fundamentals"), None);
    }
}
