//! Builds the qualitative entries document from store text and snapshots.
//!
//! Text is classified with a small finance lexicon: each hit counts ±1,
//! flipped when a negation word precedes it within NEGATION_WINDOW words,
//! and the raw sum is squashed to -1..1 as `x / sqrt(x² + 15)`.

use crate::{
    config::ScoringConfig,
    error::ScoreResult,
    liquidity_extractor::{SERIES_HY_OAS, SERIES_M2, SERIES_REAL_YIELD},
    qualitative::{QualitativeEntry, SentimentLabel},
    store::SignalStore,
    types::Category,
};
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't",
    "won't", "can't", "hardly", "barely", "without", "nor",
];

const NEGATION_WINDOW: usize = 3;

/// Squashing constant for the raw lexicon sum.
const NORMALIZATION_ALPHA: f64 = 15.0;

const POSITIVE_WORDS: &[&str] = &[
    "boom", "booming", "surge", "surges", "soar", "soars", "rally", "record", "growth",
    "gain", "gains", "strong", "beat", "beats", "bullish", "optimistic", "breakthrough",
    "exceed", "exceeds", "accelerating", "momentum", "upgrade", "upgraded", "win",
    "winning", "love", "amazing", "great", "best", "incredible", "massive", "revolutionary",
];

const NEGATIVE_WORDS: &[&str] = &[
    "crash", "plunge", "plunges", "selloff", "sell-off", "decline", "declines", "drop",
    "drops", "fall", "falls", "loss", "losses", "weak", "miss", "misses", "bearish",
    "fear", "fears", "concern", "concerns", "risk", "risky", "warning", "overvalued",
    "downturn", "slump", "layoff", "layoffs", "downgrade", "downgraded", "worst", "fraud",
    "collapse", "panic",
];

/// Compound above this is peak hype.
pub const PEAK_HYPE_THRESHOLD: f64 = 0.3;
/// Compound at or below this is a warning.
pub const WARNING_THRESHOLD: f64 = -0.2;

const TREND_HYPE_LEVEL: f64 = 75.0;
const HIGH_MULTIPLE: f64 = 50.0;
const STRESSED_SPREAD: f64 = 4.0;
/// Most recent observations per macro series turned into entries.
const MACRO_OBSERVATIONS: usize = 12;

// ── Lexicon sentiment ─────────────────────────────────────────────

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Compound sentiment in -1..1. Empty or neutral text is 0.
pub fn compound_score(text: &str) -> f64 {
    let words = tokenize(text);
    let positive: HashSet<&str> = POSITIVE_WORDS.iter().copied().collect();
    let negative: HashSet<&str> = NEGATIVE_WORDS.iter().copied().collect();
    let negation: HashSet<&str> = NEGATION_WORDS.iter().copied().collect();

    let negations: Vec<usize> = words
        .iter()
        .enumerate()
        .filter(|(_, w)| negation.contains(w.as_str()))
        .map(|(i, _)| i)
        .collect();

    let mut raw = 0i32;
    for (i, word) in words.iter().enumerate() {
        let polarity = if positive.contains(word.as_str()) {
            1
        } else if negative.contains(word.as_str()) {
            -1
        } else {
            continue;
        };
        let negated = negations.iter().any(|&n| n < i && i - n <= NEGATION_WINDOW);
        raw += if negated { -polarity } else { polarity };
    }

    let x = raw as f64;
    x / (x * x + NORMALIZATION_ALPHA).sqrt()
}

pub fn label_for(compound: f64) -> SentimentLabel {
    if compound >= PEAK_HYPE_THRESHOLD {
        SentimentLabel::PeakHype
    } else if compound <= WARNING_THRESHOLD {
        SentimentLabel::Warning
    } else {
        SentimentLabel::Correction
    }
}

/// (label, compound) for a piece of text.
pub fn classify(text: &str) -> (SentimentLabel, f64) {
    if text.trim().is_empty() {
        return (SentimentLabel::Correction, 0.0);
    }
    let compound = compound_score(text);
    (label_for(compound), compound)
}

/// Keyword categorizer. First matching group wins.
pub fn categorize(text: &str, default: Category) -> Category {
    const GROUPS: &[(Category, &[&str])] = &[
        (Category::Valuation,   &["valuation", "funding", "round", "market cap", "raise", "unicorn"]),
        (Category::Liquidity,   &["rate", "fed", "liquidity", "inflation", "macro"]),
        (Category::Capex,       &["capex", "spending", "investment", "datacenter", "infrastructure"]),
        (Category::Positioning, &["flow", "positioning", "overweight", "underweight", "crowded"]),
    ];
    let lower = text.to_lowercase();
    GROUPS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(c, _)| *c)
        .unwrap_or(default)
}

// ── Dataset building ──────────────────────────────────────────────

/// Calendar date of an ISO timestamp or a unix epoch in seconds.
fn date_prefix(raw: Option<&str>, today: NaiveDate) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() && !s.contains('-') => s
            .parse::<f64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
            .map(|dt| dt.date_naive().to_string())
            .unwrap_or_else(|| today.to_string()),
        Some(s) if !s.is_empty() => s.chars().take(10).collect(),
        _ => today.to_string(),
    }
}

fn entry(
    title:     String,
    date:      String,
    sentiment: SentimentLabel,
    score:     Option<f64>,
    category:  Category,
    content:   String,
) -> QualitativeEntry {
    QualitativeEntry {
        title,
        date,
        sentiment,
        sentiment_score: score,
        category: category.as_str().to_string(),
        content,
    }
}

/// Build entries from every text and snapshot table the store has.
/// Missing tables contribute nothing.
pub fn build_entries(
    store:  &SignalStore,
    config: &ScoringConfig,
    today:  NaiveDate,
) -> ScoreResult<Vec<QualitativeEntry>> {
    let mut entries = Vec::new();

    for post in store.reddit_posts(config.entry_limit)?.unwrap_or_default() {
        let text = format!("{} {}", post.title, post.selftext.as_deref().unwrap_or(""));
        let (label, compound) = classify(&text);
        let content = [
            post.selftext.clone(),
            post.url.clone(),
            post.permalink.as_ref().map(|p| format!("https://reddit.com{p}")),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        entries.push(entry(
            post.title,
            date_prefix(post.created_utc.as_deref(), today),
            label,
            Some(compound),
            Category::Sentiment,
            content,
        ));
    }

    for item in store.news_items(config.entry_limit)?.unwrap_or_default() {
        let summary = item.summary.as_deref().unwrap_or("");
        let text = format!("{} {summary}", item.title);
        let (label, compound) = classify(&text);
        let title = if item.title.is_empty() { "AI news".to_string() } else { item.title.clone() };
        entries.push(entry(
            title,
            date_prefix(item.published.as_deref(), today),
            label,
            Some(compound),
            categorize(&text, Category::Valuation),
            format!("{summary} {}", item.link.as_deref().unwrap_or("")).trim().to_string(),
        ));
    }

    for row in store.trend_interest()?.unwrap_or_default() {
        let Some(interest) = row.value else { continue };
        let label = if interest >= TREND_HYPE_LEVEL {
            SentimentLabel::PeakHype
        } else {
            SentimentLabel::Correction
        };
        entries.push(entry(
            "Google Trends interest for AI terms".into(),
            date_prefix(Some(&row.timestamp), today),
            label,
            None,
            Category::Sentiment,
            format!("Average interest score {interest:.2}"),
        ));
    }

    for metric in [SERIES_REAL_YIELD, SERIES_M2, SERIES_HY_OAS] {
        let rows = store.macro_series(metric)?.unwrap_or_default();
        let start = rows.len().saturating_sub(MACRO_OBSERVATIONS);
        for r in &rows[start..] {
            let stressed = metric == SERIES_HY_OAS && r.value.is_some_and(|v| v > STRESSED_SPREAD);
            let value = r.value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".into());
            entries.push(entry(
                format!("FRED {metric}"),
                date_prefix(Some(&r.timestamp), today),
                if stressed { SentimentLabel::Warning } else { SentimentLabel::Correction },
                None,
                Category::Liquidity,
                format!("{} at {value}", r.entity_key),
            ));
        }
    }

    for f in store.fundamentals_detail()?.unwrap_or_default() {
        let rich = f.forward_pe.unwrap_or(0.0) > HIGH_MULTIPLE || f.pe_ratio.unwrap_or(0.0) > HIGH_MULTIPLE;
        let show = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_else(|| "n/a".into());
        entries.push(entry(
            format!("{} valuation", f.symbol),
            today.to_string(),
            if rich { SentimentLabel::PeakHype } else { SentimentLabel::Correction },
            None,
            Category::Valuation,
            format!(
                "{}: PE={}, FwdPE={}, MCAP={}, Sector={}, Industry={}",
                f.name.as_deref().unwrap_or(&f.symbol),
                show(f.pe_ratio),
                show(f.forward_pe),
                show(f.market_cap),
                f.sector.as_deref().unwrap_or("n/a"),
                f.industry.as_deref().unwrap_or("n/a"),
            ),
        ));
    }

    entries.extend(price_trend_entries(store)?);

    log::info!("built {} entries", entries.len());
    Ok(entries)
}

/// One entry per ticker summarizing first-to-last close movement.
fn price_trend_entries(store: &SignalStore) -> ScoreResult<Vec<QualitativeEntry>> {
    let mut spans: BTreeMap<String, (String, f64, String, f64)> = BTreeMap::new();
    for r in store.equity_closes()?.unwrap_or_default() {
        let Some(close) = r.value else { continue };
        spans
            .entry(r.entity_key.clone())
            .and_modify(|s| {
                s.2 = r.timestamp.clone();
                s.3 = close;
            })
            .or_insert((r.timestamp.clone(), close, r.timestamp.clone(), close));
    }

    Ok(spans
        .into_iter()
        .map(|(ticker, (start, first, end, last))| {
            let pct = if first != 0.0 { (last - first) / first * 100.0 } else { 0.0 };
            entry(
                format!("{ticker} price trend"),
                end.chars().take(10).collect(),
                if pct > HIGH_MULTIPLE { SentimentLabel::PeakHype } else { SentimentLabel::Correction },
                None,
                Category::Valuation,
                format!("{ticker} moved {pct:.2}% from {start} to {end} (from {first} to {last})"),
            )
        })
        .collect())
}

/// Write the entries document as a pretty JSON array.
pub fn write_entries(path: &Path, entries: &[QualitativeEntry]) -> ScoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(entries)?)?;
    log::info!("wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}

// ── Breakdown ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryBreakdown {
    pub total:        usize,
    pub by_category:  BTreeMap<String, usize>,
    pub by_sentiment: BTreeMap<String, usize>,
}

pub fn breakdown(entries: &[QualitativeEntry]) -> EntryBreakdown {
    let mut out = EntryBreakdown {
        total: entries.len(),
        ..Default::default()
    };
    for e in entries {
        *out.by_category.entry(e.category.clone()).or_default() += 1;
        *out.by_sentiment.entry(e.sentiment.as_str().to_string()).or_default() += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_dates_accept_iso_and_epoch() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(date_prefix(Some("2025-01-05T08:00:00"), today), "2025-01-05");
        assert_eq!(date_prefix(Some("1735732800.0"), today), "2025-01-01");
        assert_eq!(date_prefix(Some("soon"), today), "2025-02-01");
        assert_eq!(date_prefix(None, today), "2025-02-01");
    }

    #[test]
    fn negation_flips_polarity() {
        assert!(compound_score("AI stocks surge to record highs") > 0.0);
        assert!(compound_score("this is not a boom") < 0.0);
        assert_eq!(compound_score("quarterly report released"), 0.0);
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(label_for(0.3), SentimentLabel::PeakHype);
        assert_eq!(label_for(-0.2), SentimentLabel::Warning);
        assert_eq!(label_for(0.0), SentimentLabel::Correction);
    }

    #[test]
    fn categorize_first_group_wins() {
        assert_eq!(categorize("Fed signals rate cut", Category::Sentiment), Category::Liquidity);
        assert_eq!(categorize("New datacenter capex plan", Category::Sentiment), Category::Capex);
        assert_eq!(categorize("Chatbot usage grows", Category::Sentiment), Category::Sentiment);
    }
}
