//! End-to-end query tests: load a CSV fixture from disk, then drive every
//! view and detail query the dashboards use and assert exact outputs.

use std::io::Write;

use chrono::NaiveDate;
use tempfile::TempDir;

use sentiment_dashboard::aggregate::{aggregate, composition};
use sentiment_dashboard::classify::classify;
use sentiment_dashboard::config::ViewDefaults;
use sentiment_dashboard::error::{HeadlineError, LoadError};
use sentiment_dashboard::filter::filter;
use sentiment_dashboard::headline::extract_headline;
use sentiment_dashboard::loader::Dataset;
use sentiment_dashboard::selection::{
    detail_for, ChartKind, ClickEvent, DetailPanel, HeadlineDetail, PriceDirection, Selection,
};
use sentiment_dashboard::types::{SentimentKind, SentimentSelector};
use sentiment_dashboard::views;

const FIXTURE: &str = "\
Date,Stock,Open Price,Articles,Positive,Neutral,Negative
2023-02-10,ABC,110.0,\"Headline: Earnings beat, analysts upgrade\",0.70,0.20,0.10
2023-01-05,ABC,100.0,\"Headline: Markets rally, investors cheer\",0.50,0.30,0.20
2023-01-20,ABC,104.0,\"No marker in this text\",0.20,0.30,0.50
2023-01-06,XYZ,40.0,\"Headline: XYZ flat\",0.30,0.40,0.30
2023-03-01,XYZ,,\"Headline: Missing price\",0.30,0.40,0.30
2023-04-03,ABC,121.0,\"Headline: Guidance raised\",0.40,0.40,0.20
2023-04-03,ABC,121.5,\"Headline: Second story same day\",0.10,0.10,0.80
";

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Write the fixture to a temp file and load it through the file path.
fn load_fixture() -> (TempDir, Dataset) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sentiment.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(FIXTURE.as_bytes()).unwrap();
    let ds = Dataset::load(&path).unwrap();
    (dir, ds)
}

// ── Loader ──

#[test]
fn test_load_drops_missing_price_and_sorts() {
    let (_dir, ds) = load_fixture();
    assert_eq!(ds.len(), 6);
    assert_eq!(ds.dropped_rows(), 1);
    assert!(ds.records().windows(2).all(|w| w[0].date <= w[1].date));
    assert_eq!(ds.symbols(), vec!["ABC", "XYZ"]);
}

#[test]
fn test_load_missing_file() {
    let err = Dataset::load("/definitely/not/here.csv").unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

// ── Filter ──

#[test]
fn test_filter_properties_over_fixture() {
    let (_dir, ds) = load_fixture();
    let (start, end) = (d("2023-01-01"), d("2023-03-31"));
    let rows = filter(&ds, "ABC", start, end);

    assert_eq!(rows.len(), 3);
    for r in &rows {
        assert_eq!(r.stock, "ABC");
        assert!(r.date >= start && r.date <= end);
        assert!(ds.records().iter().any(|full| full == *r));
    }
    assert!(rows.windows(2).all(|w| w[0].date <= w[1].date));
}

// ── Classifier ──

#[test]
fn test_classify_all_and_explicit() {
    let (_dir, ds) = load_fixture();
    let rows = filter(&ds, "ABC", d("2023-01-01"), d("2023-12-31"));

    let auto: Vec<_> = classify(&rows, SentimentSelector::AutoMax, 0.7)
        .into_iter()
        .map(|l| l.label)
        .collect();
    assert_eq!(
        auto,
        vec![
            SentimentKind::Positive, // 0.50 / 0.30 / 0.20
            SentimentKind::Negative, // 0.20 / 0.30 / 0.50
            SentimentKind::Positive, // 0.70 / 0.20 / 0.10
            SentimentKind::Positive, // 0.40 / 0.40 / 0.20 tie -> Positive
            SentimentKind::Negative, // 0.10 / 0.10 / 0.80
        ]
    );

    let neutral = classify(&rows, SentimentSelector::Explicit(SentimentKind::Neutral), 0.3);
    assert_eq!(neutral.len(), 3);
    assert!(neutral.iter().all(|l| l.label == SentimentKind::Neutral));

    assert!(classify(&rows, SentimentSelector::Explicit(SentimentKind::Positive), 1.0).is_empty());
}

// ── Aggregator ──

#[test]
fn test_two_month_example() {
    let (_dir, ds) = load_fixture();
    let rows = filter(&ds, "ABC", d("2023-01-05"), d("2023-02-28"));
    let buckets = aggregate(&rows);

    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].price, 100.0);
    assert_eq!(buckets[0].pct_change, None);
    assert!((buckets[1].pct_change.unwrap() - 10.0).abs() < 1e-9);
    assert_eq!(buckets[1].scaled_pct_change, Some(0.0));
    // Jan compound: (0.5 - 0.2) + (0.2 - 0.5)
    assert!(buckets[0].compound.abs() < 1e-9);
}

#[test]
fn test_gap_month_is_omitted() {
    let (_dir, ds) = load_fixture();
    let rows = filter(&ds, "ABC", d("2023-01-01"), d("2023-12-31"));
    let months: Vec<_> = aggregate(&rows).iter().map(|b| b.month_end).collect();
    assert_eq!(months, vec![d("2023-01-31"), d("2023-02-28"), d("2023-04-30")]);
}

#[test]
fn test_single_month_window() {
    let (_dir, ds) = load_fixture();
    let rows = filter(&ds, "ABC", d("2023-01-01"), d("2023-01-31"));
    let buckets = aggregate(&rows);
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].price, 100.0);
    assert_eq!(buckets[0].pct_change, None);
    assert_eq!(buckets[0].scaled_pct_change, Some(0.0));
}

#[test]
fn test_empty_window() {
    let (_dir, ds) = load_fixture();
    let rows = filter(&ds, "ABC", d("2024-01-01"), d("2024-12-31"));
    assert!(aggregate(&rows).is_empty());
    assert!(composition(&rows).is_none());
}

// ── Headlines & Selection ──

#[test]
fn test_headline_examples() {
    assert_eq!(extract_headline("Headline: Markets rally, investors cheer").unwrap(), "Markets rally");
    assert_eq!(extract_headline("investors cheer"), Err(HeadlineError::NotFound));
}

#[test]
fn test_click_flow_over_fixture() {
    let (_dir, ds) = load_fixture();
    let query = ViewDefaults::default().resolve(&ds).unwrap();
    let monthly = views::monthly_view(&ds, &query.stock, query.start, query.end);

    let mut selection = Selection::default();
    assert!(matches!(
        detail_for(&ds, &query.stock, &monthly, selection),
        DetailPanel::Empty { .. }
    ));

    selection = selection.click(ClickEvent { chart: ChartKind::MonthlyCompound, x: d("2023-04-30") });
    match detail_for(&ds, &query.stock, &monthly, selection) {
        DetailPanel::Price { info: Some(info) } => {
            assert_eq!(info.price_text(), "$121.00");
            assert_eq!(info.pct_change_text(), "+10.00%");
            assert_eq!(info.direction, Some(PriceDirection::Gain));
        }
        other => panic!("unexpected panel {other:?}"),
    }

    // Two rows on the same date: the first one's headline wins.
    selection = selection.click(ClickEvent { chart: ChartKind::PriceLine, x: d("2023-04-03") });
    assert_eq!(
        detail_for(&ds, &query.stock, &monthly, selection),
        DetailPanel::Headline {
            detail: HeadlineDetail::Found { date: d("2023-04-03"), headline: "Guidance raised".into() }
        }
    );

    // Text without a marker degrades to "not available".
    selection = selection.click(ClickEvent { chart: ChartKind::PriceLine, x: d("2023-01-20") });
    assert_eq!(
        detail_for(&ds, &query.stock, &monthly, selection),
        DetailPanel::Headline { detail: HeadlineDetail::NotAvailable }
    );
}
