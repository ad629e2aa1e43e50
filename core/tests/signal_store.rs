//! Signal store: missing tables, whole-table replacement, rollback.

mod common;

use bubble_core::store::{
    MacroObservation, SignalStore, TrendRow, EQUITY_HISTORY, FRED_MACRO, FUNDAMENTALS,
    KNOWN_TABLES, SOCIAL_POSTS, TREND_INTEREST,
};
use common::{empty_store, macro_rows, populated_store, post, SEED};
use rusqlite::types::Value;

fn values(rows: &[bubble_core::signal::SignalRecord]) -> Vec<Option<f64>> {
    rows.iter().map(|r| r.value).collect()
}

/// Before any collector has run, every read reports "no table", not an error.
#[test]
fn unmigrated_store_reads_none() {
    let store = SignalStore::in_memory().expect("in-memory store");
    assert!(store.equity_closes().expect("read").is_none());
    assert!(store.fundamentals().expect("read").is_none());
    assert!(store.macro_series("m2").expect("read").is_none());
    assert!(store.trend_interest().expect("read").is_none());
    assert!(store.social_post_volume().expect("read").is_none());
    assert!(store.news_items(10).expect("read").is_none());
    assert_eq!(store.row_count(FRED_MACRO).expect("count"), None);

    let status = store.table_status().expect("status");
    assert_eq!(status.len(), KNOWN_TABLES.len());
    assert!(status.iter().all(|t| !t.exists && !t.populated()));
}

#[test]
fn migrated_store_is_empty_not_missing() {
    let store = empty_store();
    assert_eq!(store.equity_closes().expect("read"), Some(vec![]));
    assert_eq!(store.row_count(EQUITY_HISTORY).expect("count"), Some(0));
    assert!(store.table_status().expect("status").iter().all(|t| t.exists));
}

/// A refresh replaces the previous snapshot; it never appends.
#[test]
fn replace_overwrites_previous_rows() {
    let store = empty_store();
    store
        .replace_macro_series(&macro_rows("m2", "M2SL", &[Some(1.0), Some(2.0), Some(3.0)]))
        .expect("first refresh");
    store
        .replace_macro_series(&macro_rows("m2", "M2SL", &[Some(9.0)]))
        .expect("second refresh");

    let rows = store.macro_series("m2").expect("read").expect("table");
    assert_eq!(values(&rows), vec![Some(9.0)]);
    assert_eq!(rows[0].entity_key, "M2SL");
}

/// A rejected row rolls back the whole refresh; readers keep the old snapshot.
#[test]
fn failed_refresh_rolls_back() {
    let store = empty_store();
    store
        .replace_macro_series(&macro_rows("hy_oas", "BAMLH0A0HYM2", &[Some(4.0), Some(4.5)]))
        .expect("initial refresh");

    let good = vec![
        Value::Text("hy_oas".into()),
        Value::Null,
        Value::Text("2025-01-01".into()),
        Value::Real(9.9),
    ];
    let short = vec![Value::Text("hy_oas".into())];
    let err = store.replace_table(FRED_MACRO, &["metric", "series_id", "date", "value"], &[good, short]);
    assert!(err.is_err());

    let rows = store.macro_series("hy_oas").expect("read").expect("table");
    assert_eq!(values(&rows), vec![Some(4.0), Some(4.5)]);
}

/// Two keywords that sanitize to the same column reject the new schema;
/// the previous trends table survives untouched.
#[test]
fn trend_schema_failure_keeps_previous_table() {
    let store = empty_store();
    let rows = vec![TrendRow {
        date:       "2025-01-01".into(),
        values:     vec![Some(10.0), Some(30.0)],
        is_partial: false,
    }];
    store.replace_trend_interest(&["chatgpt", "openai"], &rows).expect("first refresh");

    let clash = store.replace_trend_interest(&["AI Stocks", "ai_stocks"], &rows);
    assert!(clash.is_err());

    let interest = store.trend_interest().expect("read").expect("table");
    assert_eq!(values(&interest), vec![Some(20.0)]);
}

/// Interest per row is the mean of whatever keyword cells parse.
#[test]
fn trend_interest_averages_keyword_columns() {
    let store = empty_store();
    let row = |date: &str, values: Vec<Option<f64>>| TrendRow {
        date: date.into(),
        values,
        is_partial: false,
    };
    store
        .replace_trend_interest(
            &["chatgpt", "openai", "ai stocks"],
            &[
                row("2025-01-02", vec![None, Some(40.0), None]),
                row("2025-01-01", vec![Some(10.0), Some(20.0), Some(30.0)]),
                row("2025-01-03", vec![None, None, None]),
            ],
        )
        .expect("refresh");

    let interest = store.trend_interest().expect("read").expect("table");
    assert_eq!(values(&interest), vec![Some(20.0), Some(40.0), None]);
    assert_eq!(interest[0].timestamp, "2025-01-01");
    assert_eq!(store.row_count(TREND_INTEREST).expect("count"), Some(3));
}

/// Numeric text parses; junk becomes an absent value, not an error.
#[test]
fn lenient_numeric_cells() {
    let store = empty_store();
    let row = |date: &str, value: Value| {
        vec![Value::Text("real_yield_10y".into()), Value::Null, Value::Text(date.into()), value]
    };
    store
        .replace_table(
            FRED_MACRO,
            &["metric", "series_id", "date", "value"],
            &[
                row("2025-01-01", Value::Text("1.75".into())),
                row("2025-02-01", Value::Text("n/a".into())),
                row("2025-03-01", Value::Integer(2)),
            ],
        )
        .expect("refresh");

    let rows = store.macro_series("real_yield_10y").expect("read").expect("table");
    assert_eq!(values(&rows), vec![Some(1.75), None, Some(2.0)]);
    // No series id: the metric itself identifies the series.
    assert_eq!(rows[0].entity_key, "real_yield_10y");
}

#[test]
fn social_volume_counts_posts_per_day() {
    let store = empty_store();
    store
        .replace_social_posts(&[post("a", 2, "x"), post("b", 1, "y"), post("c", 2, "z")])
        .expect("refresh");

    let volume = store.social_post_volume().expect("read").expect("table");
    let days: Vec<&str> = volume.iter().map(|r| r.timestamp.as_str()).collect();
    assert_eq!(days, vec!["2025-01-01", "2025-01-02"]);
    assert_eq!(values(&volume), vec![Some(1.0), Some(2.0)]);
}

#[test]
fn fundamentals_yield_two_records_per_symbol() {
    let store = populated_store(SEED);
    let records = store.fundamentals().expect("read").expect("table");
    assert_eq!(records.len(), 6);
    assert_eq!(records[0].entity_key, "AMD");
    assert_eq!(records[0].metric_key, "forward_pe");
    assert_eq!(records[1].metric_key, "pe_ratio");
    assert_eq!(records[1].value, Some(100.0));
}

#[test]
fn equity_closes_are_grouped_and_ordered() {
    let store = populated_store(SEED);
    let closes = store.equity_closes().expect("read").expect("table");
    assert_eq!(closes.len(), 90);
    assert_eq!(closes[0].entity_key, "AMD");
    assert_eq!(closes[29].timestamp, "2025-01-30");
    assert_eq!(closes[30].entity_key, "MSFT");
}

#[test]
fn observation_rows_keep_their_date_order() {
    let store = empty_store();
    let rows = vec![
        MacroObservation {
            metric:    "m2".into(),
            series_id: Some("M2SL".into()),
            date:      "2024-02-01".into(),
            value:     Some(2.0),
        },
        MacroObservation {
            metric:    "m2".into(),
            series_id: Some("M2SL".into()),
            date:      "2024-01-01".into(),
            value:     Some(1.0),
        },
    ];
    store.replace_macro_series(&rows).expect("refresh");
    let read = store.macro_series("m2").expect("read").expect("table");
    assert_eq!(values(&read), vec![Some(1.0), Some(2.0)]);
}

/// Rows whose key cells cannot be read as text are dropped; the rest survive.
#[test]
fn unreadable_key_cells_skip_the_row() {
    let store = empty_store();
    let bar = |ticker: Value, date: &str, close: f64| {
        vec![ticker, Value::Text(date.into()), Value::Real(close)]
    };
    store
        .replace_table(
            EQUITY_HISTORY,
            &["ticker", "date", "close"],
            &[
                bar(Value::Text("NVDA".into()), "2025-01-01", 100.0),
                bar(Value::Blob(vec![0xff, 0x00]), "2025-01-02", 101.0),
                bar(Value::Text("NVDA".into()), "2025-01-03", 102.0),
            ],
        )
        .expect("refresh");
    let closes = store.equity_closes().expect("read").expect("table");
    assert_eq!(values(&closes), vec![Some(100.0), Some(102.0)]);

    store
        .replace_table(
            FUNDAMENTALS,
            &["symbol", "forward_pe", "pe_ratio"],
            &[
                vec![Value::Blob(vec![1]), Value::Real(30.0), Value::Real(40.0)],
                vec![Value::Text("MSFT".into()), Value::Real(30.0), Value::Real(35.0)],
            ],
        )
        .expect("refresh");
    let records = store.fundamentals().expect("read").expect("table");
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.entity_key == "MSFT"));
    assert_eq!(store.fundamentals_detail().expect("read").expect("table").len(), 1);

    store
        .replace_table(
            FRED_MACRO,
            &["metric", "series_id", "date", "value"],
            &[
                vec![Value::Text("m2".into()), Value::Null, Value::Blob(vec![2]), Value::Real(1.0)],
                vec![Value::Text("m2".into()), Value::Null, Value::Text("2025-01-01".into()), Value::Real(2.0)],
            ],
        )
        .expect("refresh");
    let m2 = store.macro_series("m2").expect("read").expect("table");
    assert_eq!(values(&m2), vec![Some(2.0)]);
}

/// Epoch seconds and ISO strings land in the same calendar-day buckets.
#[test]
fn social_volume_buckets_epoch_timestamps_by_day() {
    let store = empty_store();
    let created = |v: Value| vec![Value::Text("t".into()), v];
    store
        .replace_table(
            SOCIAL_POSTS,
            &["title", "created_utc"],
            &[
                // 2025-01-01 12:00 and 18:00 UTC.
                created(Value::Real(1_735_732_800.0)),
                created(Value::Text("1735754400".into())),
                created(Value::Text("2025-01-01T20:00:00".into())),
                // 2025-01-02 00:30 UTC.
                created(Value::Integer(1_735_777_800)),
            ],
        )
        .expect("refresh");

    let volume = store.social_post_volume().expect("read").expect("table");
    let days: Vec<&str> = volume.iter().map(|r| r.timestamp.as_str()).collect();
    assert_eq!(days, vec!["2025-01-01", "2025-01-02"]);
    assert_eq!(values(&volume), vec![Some(3.0), Some(1.0)]);
}
