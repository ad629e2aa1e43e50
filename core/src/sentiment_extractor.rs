//! Sentiment metrics: text tone, search interest, social volume.

use crate::{
    extractor::{latest_z, mean, Absent, ExtractionContext, MetricExtractor, MetricReadings, Reading},
    signal::values,
    store::{SOCIAL_POSTS, TREND_INTEREST},
    types::Category,
};

pub const VADER_COMPOUND_AVG: &str = "vader_compound_avg";
pub const SEARCH_INTEREST_Z:  &str = "search_interest_z";
pub const SOCIAL_VOLUME_Z:    &str = "social_volume_z";

/// Search interest needs more than five points before its z means anything.
pub const MIN_TREND_POINTS:  usize = 6;
pub const MIN_SOCIAL_DAYS:   usize = 2;

const ENTRIES_SOURCE: &str = "qualitative_entries";

pub struct SentimentExtractor;

impl MetricExtractor for SentimentExtractor {
    fn category(&self) -> Category {
        Category::Sentiment
    }

    fn metric_names(&self) -> &'static [&'static str] {
        &[VADER_COMPOUND_AVG, SEARCH_INTEREST_Z, SOCIAL_VOLUME_Z]
    }

    fn extract(&self, ctx: &ExtractionContext<'_>) -> MetricReadings {
        let mut out = MetricReadings::new();
        out.insert(VADER_COMPOUND_AVG.into(), compound_average(ctx));
        out.insert(SEARCH_INTEREST_Z.into(), search_interest_z(ctx));
        out.insert(SOCIAL_VOLUME_Z.into(), social_volume_z(ctx));
        out
    }
}

/// Mean compound score of sentiment entries that carry one.
pub fn compound_average(ctx: &ExtractionContext<'_>) -> Reading {
    let scores: Vec<f64> = ctx
        .entries_in(Category::Sentiment)
        .filter_map(|e| e.sentiment_score)
        .collect();
    mean(&scores).ok_or_else(|| Absent::unavailable(ENTRIES_SOURCE))
}

pub fn search_interest_z(ctx: &ExtractionContext<'_>) -> Reading {
    let records = ctx.read(TREND_INTEREST, |s| s.trend_interest())?;
    if records.is_empty() {
        return Err(Absent::unavailable(TREND_INTEREST));
    }
    let series = values(&records);
    if series.is_empty() {
        return Err(Absent::malformed(TREND_INTEREST, "no numeric interest columns"));
    }
    if series.len() < MIN_TREND_POINTS {
        return Err(Absent::insufficient(TREND_INTEREST, MIN_TREND_POINTS, series.len()));
    }
    latest_z(&series).ok_or_else(|| Absent::unavailable(TREND_INTEREST))
}

pub fn social_volume_z(ctx: &ExtractionContext<'_>) -> Reading {
    let records = ctx.read(SOCIAL_POSTS, |s| s.social_post_volume())?;
    if records.is_empty() {
        return Err(Absent::unavailable(SOCIAL_POSTS));
    }
    let series = values(&records);
    if series.len() < MIN_SOCIAL_DAYS {
        return Err(Absent::insufficient(SOCIAL_POSTS, MIN_SOCIAL_DAYS, series.len()));
    }
    latest_z(&series).ok_or_else(|| Absent::unavailable(SOCIAL_POSTS))
}
