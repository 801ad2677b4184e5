//! Per-chart recomputation. Each function rebuilds its view from the base
//! dataset and the current widget values; nothing is cached between calls.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{aggregate, composition};
use crate::classify::classify;
use crate::filter::filter;
use crate::loader::Dataset;
use crate::types::{MonthlyBucket, SentimentComposition, SentimentKind, ViewQuery};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentMarker {
    pub date: NaiveDate,
    pub price: f64,
    pub label: SentimentKind,
    pub color: &'static str,
}

/// Price line for the whole window plus markers for rows passing the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    pub stock: String,
    pub prices: Vec<PricePoint>,
    pub markers: Vec<SentimentMarker>,
}

pub fn line_view(dataset: &Dataset, query: &ViewQuery) -> LineView {
    let rows = filter(dataset, &query.stock, query.start, query.end);
    let markers: Vec<SentimentMarker> = classify(&rows, query.selector, query.threshold)
        .into_iter()
        .map(|l| SentimentMarker {
            date: l.record.date,
            price: l.record.price,
            label: l.label,
            color: l.label.color(),
        })
        .collect();
    debug!(stock = %query.stock, rows = rows.len(), markers = markers.len(), "line view");

    LineView {
        stock: query.stock.clone(),
        prices: rows.iter().map(|r| PricePoint { date: r.date, price: r.price }).collect(),
        markers,
    }
}

pub fn monthly_view(dataset: &Dataset, stock: &str, start: NaiveDate, end: NaiveDate) -> Vec<MonthlyBucket> {
    let rows = filter(dataset, stock, start, end);
    let buckets = aggregate(&rows);
    debug!(stock, rows = rows.len(), buckets = buckets.len(), "monthly view");
    buckets
}

pub fn composition_view(dataset: &Dataset, stock: &str, start: NaiveDate, end: NaiveDate) -> Option<SentimentComposition> {
    composition(&filter(dataset, stock, start, end))
}

/// Everything the three charts need for one set of widget values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub line: LineView,
    pub monthly: Vec<MonthlyBucket>,
    pub composition: Option<SentimentComposition>,
}

pub fn snapshot(dataset: &Dataset, query: &ViewQuery) -> Snapshot {
    Snapshot {
        line: line_view(dataset, query),
        monthly: monthly_view(dataset, &query.stock, query.start, query.end),
        composition: composition_view(dataset, &query.stock, query.start, query.end),
    }
}
