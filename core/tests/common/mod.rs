//! Shared fixtures for integration tests.
//!
//! Every fixture is deterministic: the same seed writes the same rows.

#![allow(dead_code)]

use bubble_core::{
    qualitative::{QualitativeEntry, SentimentLabel},
    store::{
        EquityBar, FundamentalsSnapshot, MacroObservation, NewsItem, SignalStore, SocialPost,
        TrendRow,
    },
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub const SEED: u64 = 0xB0BB_1E00_2025;

/// Route library log lines through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Migrated in-memory store with no rows.
pub fn empty_store() -> SignalStore {
    let store = SignalStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

/// Migrated in-memory store with every collector table filled.
pub fn populated_store(seed: u64) -> SignalStore {
    let store = empty_store();
    populate(&store, seed);
    store
}

/// Month label `i` months after January 2023.
pub fn month(i: usize) -> String {
    format!("{}-{:02}-01", 2023 + i / 12, i % 12 + 1)
}

pub fn macro_rows(metric: &str, series_id: &str, values: &[Option<f64>]) -> Vec<MacroObservation> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| MacroObservation {
            metric:    metric.to_string(),
            series_id: Some(series_id.to_string()),
            date:      month(i),
            value:     *v,
        })
        .collect()
}

pub fn bars(ticker: &str, closes: &[f64]) -> Vec<EquityBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| EquityBar {
            ticker: ticker.to_string(),
            date:   format!("2025-01-{:02}", i + 1),
            close:  Some(*c),
        })
        .collect()
}

pub fn fundamentals(symbol: &str, forward_pe: Option<f64>, pe_ratio: Option<f64>) -> FundamentalsSnapshot {
    FundamentalsSnapshot {
        symbol: symbol.to_string(),
        name: Some(format!("{symbol} Corp")),
        forward_pe,
        pe_ratio,
        market_cap: Some(1.0e12),
        sector: Some("TECHNOLOGY".into()),
        industry: Some("SEMICONDUCTORS".into()),
    }
}

pub fn post(id: &str, day: u32, title: &str) -> SocialPost {
    SocialPost {
        id:          Some(id.to_string()),
        title:       title.to_string(),
        created_utc: Some(format!("2025-01-{day:02}T12:00:00")),
        score:       Some(10),
        ..Default::default()
    }
}

pub fn populate(store: &SignalStore, seed: u64) {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    // Thirty daily closes per ticker, random walk around a start price.
    let mut equity = Vec::new();
    for (ticker, start) in [("AMD", 120.0), ("MSFT", 400.0), ("NVDA", 480.0)] {
        let mut close: f64 = start;
        let mut closes = Vec::new();
        for _ in 0..30 {
            close *= 1.0 + rng.gen_range(-0.03_f64..0.03);
            closes.push(close);
        }
        equity.extend(bars(ticker, &closes));
    }
    store.replace_equity_history(&equity).expect("equity");

    store
        .replace_fundamentals(&[
            fundamentals("AMD", Some(40.0), Some(100.0)),
            fundamentals("MSFT", Some(30.0), Some(35.0)),
            fundamentals("NVDA", Some(45.0), Some(60.0)),
        ])
        .expect("fundamentals");

    let mut observations = Vec::new();
    let real_yield: Vec<Option<f64>> = (0..24).map(|i| Some(1.0 + i as f64 * 0.05)).collect();
    let m2: Vec<Option<f64>> = (0..24).map(|i| Some(20_000.0 + i as f64 * 100.0)).collect();
    let hy: Vec<Option<f64>> = (0..24).map(|i| Some(3.0 + (i % 5) as f64 * 0.2)).collect();
    observations.extend(macro_rows("real_yield_10y", "DFII10", &real_yield));
    observations.extend(macro_rows("m2", "M2SL", &m2));
    observations.extend(macro_rows("hy_oas", "BAMLH0A0HYM2", &hy));
    store.replace_macro_series(&observations).expect("macro");

    let trends: Vec<TrendRow> = (0..10)
        .map(|i| TrendRow {
            date:       format!("2025-01-{:02}", i + 1),
            values:     vec![Some(20.0 + i as f64 * 5.0), Some(rng.gen_range(10.0_f64..30.0))],
            is_partial: i == 9,
        })
        .collect();
    store
        .replace_trend_interest(&["ChatGPT", "OpenAI"], &trends)
        .expect("trends");

    let mut posts = Vec::new();
    for (day, count) in [(1, 2), (2, 3), (3, 5)] {
        for n in 0..count {
            posts.push(post(&format!("p{day}{n}"), day, "NVDA to the moon, record growth"));
        }
    }
    store.replace_social_posts(&posts).expect("posts");

    store
        .replace_news(&[
            NewsItem {
                title:     "Chipmakers rally on AI demand".into(),
                published: Some("2025-01-03T08:00:00".into()),
                summary:   Some("Shares surge after strong guidance".into()),
                link:      Some("https://news.example/rally".into()),
            },
            NewsItem {
                title:     "Fed holds rate steady".into(),
                published: Some("2025-01-02T18:00:00".into()),
                summary:   Some("Liquidity concerns linger".into()),
                link:      None,
            },
        ])
        .expect("news");
}

pub fn entry(
    category:  &str,
    sentiment: SentimentLabel,
    score:     Option<f64>,
    content:   &str,
) -> QualitativeEntry {
    QualitativeEntry {
        title:           format!("{category} note"),
        date:            "2025-01-15".into(),
        sentiment,
        sentiment_score: score,
        category:        category.to_string(),
        content:         content.to_string(),
    }
}

/// Entries covering sentiment, capex and liquidity.
/// Two capex entries name spending keywords; capex scores average 30.
pub fn sample_entries() -> Vec<QualitativeEntry> {
    vec![
        entry("sentiment", SentimentLabel::PeakHype, Some(0.6), "Retail traders euphoric about chip stocks"),
        entry("sentiment", SentimentLabel::Warning, Some(-0.2), "Some analysts warn of froth"),
        entry("capex", SentimentLabel::PeakHype, Some(40.0), "Hyperscalers plan 200 billion in capex"),
        entry("capex", SentimentLabel::Correction, Some(20.0), "Data center investment slows"),
        entry("liquidity", SentimentLabel::Warning, None, "Funding is down across venture"),
    ]
}
