use crate::normalizer::{Baseline, Direction, DEFAULT_Z_SCALE};
use crate::types::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ── Label scales ──────────────────────────────────────────────────

/// Score cut-offs shared by the category state and the composite state.
/// A score at or above a cut-off earns that bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateThresholds {
    pub critical: f64,
    pub high:     f64,
    pub elevated: f64,
    pub moderate: f64,
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self {
            critical: 80.0,
            high:     65.0,
            elevated: 50.0,
            moderate: 35.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelBand {
    pub min:   f64,
    pub label: String,
}

/// Descending bands; the first band whose `min` the score reaches wins,
/// otherwise `fallback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScale {
    pub bands:    Vec<LabelBand>,
    pub fallback: String,
}

impl LabelScale {
    fn new(bands: &[(f64, &str)], fallback: &str) -> Self {
        Self {
            bands: bands
                .iter()
                .map(|(min, label)| LabelBand { min: *min, label: label.to_string() })
                .collect(),
            fallback: fallback.to_string(),
        }
    }

    pub fn label_for(&self, score: f64) -> &str {
        self.bands
            .iter()
            .find(|b| score >= b.min)
            .map(|b| b.label.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

/// Emits `message` when a category scores at least `min_score` and its
/// descriptor equals `descriptor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningRule {
    pub category:   Category,
    pub min_score:  f64,
    pub descriptor: String,
    pub message:    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePeaks {
    pub dotcom_2000:  f64,
    pub crypto_2022:  f64,
    pub housing_2008: f64,
}

impl Default for ReferencePeaks {
    fn default() -> Self {
        Self {
            dotcom_2000:  85.0,
            crypto_2022:  78.0,
            housing_2008: 72.0,
        }
    }
}

// ── Scoring config ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub category_thresholds: StateThresholds,
    pub bubble_thresholds:   StateThresholds,
    pub descriptors:         BTreeMap<Category, LabelScale>,
    pub warning_rules:       Vec<WarningRule>,
    pub max_warnings:        usize,
    pub reference_peaks:     ReferencePeaks,
    /// Ticker universe for valuation; empty means every symbol in the store.
    pub tickers:             Vec<String>,
    pub spending_keywords:   Vec<String>,
    /// Metric names scored per category, in output order.
    pub metrics:             BTreeMap<Category, Vec<String>>,
    /// Slope of the heuristic linear z mapping.
    pub z_scale:             f64,
    /// Rows pulled per text table when building the entries document.
    pub entry_limit:         usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let descriptors = BTreeMap::from([
            (
                Category::Valuation,
                LabelScale::new(
                    &[(80.0, "SEVERELY_OVERVALUED"), (60.0, "OVERVALUED"), (40.0, "FAIR_VALUE")],
                    "UNDERVALUED",
                ),
            ),
            (
                Category::Sentiment,
                LabelScale::new(
                    &[(75.0, "PEAK_EUPHORIA"), (60.0, "HIGH_OPTIMISM"), (40.0, "BALANCED")],
                    "PESSIMISTIC",
                ),
            ),
            (
                Category::Positioning,
                LabelScale::new(&[(70.0, "OVERCROWDED"), (50.0, "CROWDED")], "BALANCED"),
            ),
            (
                Category::Liquidity,
                LabelScale::new(&[(60.0, "TIGHT"), (40.0, "TIGHTENING")], "ACCOMMODATIVE"),
            ),
            (
                Category::Capex,
                LabelScale::new(&[(75.0, "UNSUSTAINABLE"), (60.0, "ELEVATED")], "SUSTAINABLE"),
            ),
        ]);

        let warning_rules = vec![
            WarningRule {
                category:   Category::Valuation,
                min_score:  75.0,
                descriptor: "SEVERELY_OVERVALUED".into(),
                message:    "Valuations at extreme levels - dot-com bubble comparison".into(),
            },
            WarningRule {
                category:   Category::Sentiment,
                min_score:  75.0,
                descriptor: "PEAK_EUPHORIA".into(),
                message:    "Sentiment at peak euphoria - contrarian indicator".into(),
            },
            WarningRule {
                category:   Category::Capex,
                min_score:  75.0,
                descriptor: "UNSUSTAINABLE".into(),
                message:    "Capex spending outpacing revenue generation".into(),
            },
        ];

        let metrics = BTreeMap::from([
            (Category::Valuation,   names(&["forward_pe_mean", "price_level_pct"])),
            (Category::Sentiment,   names(&["vader_compound_avg", "search_interest_z", "social_volume_z"])),
            (Category::Positioning, names(&["equity_volatility_proxy", "volatility_dispersion"])),
            (Category::Liquidity,   names(&["US_10Y_real_yield", "US_M2_YoY_growth", "US_HY_credit_spread"])),
            (Category::Capex,       names(&["capex_mention_score", "capex_intensity"])),
        ]);

        Self {
            category_thresholds: StateThresholds::default(),
            bubble_thresholds:   StateThresholds::default(),
            descriptors,
            warning_rules,
            max_warnings:        5,
            reference_peaks:     ReferencePeaks::default(),
            tickers:             names(&[
                "NVDA", "MSFT", "GOOGL", "AMZN", "META", "SMCI", "AMD", "AVGO", "QQQ", "BOTZ", "IRBO",
            ]),
            spending_keywords:   names(&["billion", "spending", "capex", "investment"]),
            metrics,
            z_scale:             DEFAULT_Z_SCALE,
            entry_limit:         200,
        }
    }
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ScoringConfig {
    /// Load from `{data_dir}/scoring/scoring_config.json`.
    /// A missing file means defaults; a malformed one is an error.
    /// In tests, use ScoringConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/scoring/scoring_config.json");
        if !Path::new(&path).exists() {
            log::info!("no scoring config at {path}; using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with an open ticker universe, so fixtures can use any symbols.
    pub fn default_test() -> Self {
        Self {
            tickers: Vec::new(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, t) in [("category", &self.category_thresholds), ("bubble", &self.bubble_thresholds)] {
            if !(t.critical >= t.high && t.high >= t.elevated && t.elevated >= t.moderate) {
                anyhow::bail!("{name} thresholds must be descending: {t:?}");
            }
        }
        if self.max_warnings == 0 {
            anyhow::bail!("max_warnings must be at least 1");
        }
        if !(self.z_scale.is_finite() && self.z_scale > 0.0) {
            anyhow::bail!("z_scale must be positive, got {}", self.z_scale);
        }
        Ok(())
    }

    pub fn metric_names(&self, category: Category) -> &[String] {
        self.metrics.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn descriptor(&self, category: Category, score: f64) -> String {
        self.descriptors
            .get(&category)
            .map(|scale| scale.label_for(score).to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string())
    }

    /// True when `ticker` belongs to the configured universe.
    pub fn in_universe(&self, ticker: &str) -> bool {
        self.tickers.is_empty() || self.tickers.iter().any(|t| t.eq_ignore_ascii_case(ticker))
    }
}

// ── Baselines ─────────────────────────────────────────────────────

/// Historical reference distributions, grouped by category.
/// Unknown top-level keys (notes, metadata) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    #[serde(default)]
    pub valuation:   BTreeMap<String, Baseline>,
    #[serde(default)]
    pub sentiment:   BTreeMap<String, Baseline>,
    #[serde(default)]
    pub positioning: BTreeMap<String, Baseline>,
    #[serde(default)]
    pub liquidity:   BTreeMap<String, Baseline>,
    #[serde(default)]
    pub capex:       BTreeMap<String, Baseline>,
}

impl Baselines {
    pub fn category(&self, category: Category) -> &BTreeMap<String, Baseline> {
        match category {
            Category::Valuation   => &self.valuation,
            Category::Sentiment   => &self.sentiment,
            Category::Positioning => &self.positioning,
            Category::Liquidity   => &self.liquidity,
            Category::Capex       => &self.capex,
        }
    }

    pub fn category_mut(&mut self, category: Category) -> &mut BTreeMap<String, Baseline> {
        match category {
            Category::Valuation   => &mut self.valuation,
            Category::Sentiment   => &mut self.sentiment,
            Category::Positioning => &mut self.positioning,
            Category::Liquidity   => &mut self.liquidity,
            Category::Capex       => &mut self.capex,
        }
    }

    pub fn get(&self, category: Category, metric: &str) -> Option<&Baseline> {
        self.category(category).get(metric)
    }

    pub fn insert(&mut self, category: Category, metric: &str, baseline: Baseline) {
        self.category_mut(category).insert(metric.to_string(), baseline);
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.category(*c).is_empty())
    }

    /// Load `{data_dir}/historical/historical_baselines.json`.
    /// `None` when the file does not exist.
    pub fn load(data_dir: &str) -> anyhow::Result<Option<Self>> {
        let path = format!("{data_dir}/historical/historical_baselines.json");
        if !Path::new(&path).exists() {
            log::warn!("no baselines at {path}");
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let baselines: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(Some(baselines))
    }

    /// The shipped historical estimates, hardcoded for tests.
    pub fn default_test() -> Self {
        use Direction::{HigherIsRiskier as Higher, LowerIsRiskier as Lower};
        let mut b = Self::default();
        b.insert(Category::Valuation,   "forward_pe_mean",         Baseline::z(25.0, 5.0, Higher));
        b.insert(Category::Valuation,   "price_level_pct",         Baseline::min_max(0.0, 1.0, Lower));
        b.insert(Category::Sentiment,   "vader_compound_avg",      Baseline::z(0.05, 0.25, Higher));
        b.insert(Category::Sentiment,   "search_interest_z",       Baseline::z(0.0, 1.0, Higher));
        b.insert(Category::Sentiment,   "social_volume_z",         Baseline::z(0.0, 1.0, Higher));
        b.insert(Category::Positioning, "equity_volatility_proxy", Baseline::min_max(0.01, 0.05, Lower));
        b.insert(Category::Positioning, "volatility_dispersion",   Baseline::z(0.01, 0.005, Lower));
        b.insert(Category::Liquidity,   "US_10Y_real_yield",       Baseline::z(0.5, 0.8, Higher));
        b.insert(Category::Liquidity,   "US_M2_YoY_growth",        Baseline::z(6.5, 4.2, Lower));
        b.insert(Category::Liquidity,   "US_HY_credit_spread",     Baseline::z(4.5, 1.5, Higher));
        b.insert(Category::Capex,       "capex_mention_score",     Baseline::min_max(50.0, 100.0, Higher));
        b.insert(Category::Capex,       "capex_intensity",         Baseline::z(10.0, 10.0, Higher));
        b
    }
}
