//! Dataset loading and normalization.
//!
//! Reads the sentiment CSV through Arrow's CSV reader so that empty numeric
//! cells surface as nulls, then turns each complete row into a [`Record`].
//! Rows missing the price or any sentiment fraction, or whose date does not
//! parse, are dropped. The resulting table is sorted ascending by date.

use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow_array::cast::AsArray;
use arrow_array::types::Float64Type;
use arrow_array::{Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::headline;
use crate::types::Record;

// Accepted header spellings: raw file names first, display names second.
const DATE_COLS: &[&str] = &["Date"];
const STOCK_COLS: &[&str] = &["Stock"];
const PRICE_COLS: &[&str] = &["Open Price", "Stock Price"];
const ARTICLES_COLS: &[&str] = &["Articles"];
const POSITIVE_COLS: &[&str] = &["Positive", "Positive Sentiment"];
const NEUTRAL_COLS: &[&str] = &["Neutral", "Neutral Sentiment"];
const NEGATIVE_COLS: &[&str] = &["Negative", "Negative Sentiment"];
const COUNT_COLS: &[&str] = &["Article Count", "Articles Count"];

const BATCH_SIZE: usize = 4096;

lazy_static! {
    // Cells read as missing: blank, or one of the usual NA spellings.
    static ref RE_MISSING: Regex =
        Regex::new(r"(?i)^\s*(|na|n/a|nan|null|none)\s*$").expect("static regex");
}

/// The immutable base table every view is computed from.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    dropped: usize,
}

impl Dataset {
    /// Build from already-normalized records. Sorting is stable, so rows
    /// sharing a date keep their file order.
    pub fn from_records(mut records: Vec<Record>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records, dropped: 0 }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_csv_bytes(&bytes)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            dropped = dataset.dropped_rows(),
            symbols = dataset.symbols().len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let format = Format::default().with_header(true);
        let (inferred, _) = format.infer_schema(Cursor::new(bytes), Some(100))?;
        let columns = Columns::resolve(&inferred)?;

        // Re-type every column: numeric ones as nullable Float64, the rest as text.
        let fields: Vec<Field> = inferred
            .fields()
            .iter()
            .enumerate()
            .map(|(idx, f)| {
                let data_type = if columns.is_numeric(idx) { DataType::Float64 } else { DataType::Utf8 };
                Field::new(f.name(), data_type, true)
            })
            .collect();
        let schema = Arc::new(Schema::new(fields));

        let reader = ReaderBuilder::new(schema)
            .with_header(true)
            .with_batch_size(BATCH_SIZE)
            .with_null_regex(RE_MISSING.clone())
            .build(Cursor::new(bytes))?;

        let mut records = Vec::new();
        let mut dropped = 0usize;
        for batch in reader {
            let batch = batch?;
            dropped += columns.extract(&batch, &mut records);
        }

        let mut dataset = Self::from_records(records);
        dataset.dropped = dropped;
        Ok(dataset)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows discarded at load time for missing or unparsable fields.
    pub fn dropped_rows(&self) -> usize {
        self.dropped
    }

    /// Distinct symbols in order of first appearance in the sorted table.
    pub fn symbols(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.stock.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// (min, max) date of the whole table.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.records.first()?.date, self.records.last()?.date))
    }
}

struct Columns {
    date: usize,
    stock: usize,
    price: usize,
    articles: Option<usize>,
    positive: usize,
    neutral: usize,
    negative: usize,
    count: Option<usize>,
}

impl Columns {
    fn resolve(schema: &Schema) -> Result<Self, LoadError> {
        let find = |names: &[&str]| {
            schema
                .fields()
                .iter()
                .position(|f| names.iter().any(|n| f.name().trim() == *n))
        };
        let require = |names: &'static [&'static str]| find(names).ok_or(LoadError::MissingColumn(names[0]));

        Ok(Self {
            date: require(DATE_COLS)?,
            stock: require(STOCK_COLS)?,
            price: require(PRICE_COLS)?,
            articles: find(ARTICLES_COLS),
            positive: require(POSITIVE_COLS)?,
            neutral: require(NEUTRAL_COLS)?,
            negative: require(NEGATIVE_COLS)?,
            count: find(COUNT_COLS),
        })
    }

    fn is_numeric(&self, idx: usize) -> bool {
        idx == self.price
            || idx == self.positive
            || idx == self.neutral
            || idx == self.negative
            || Some(idx) == self.count
    }

    /// Append complete rows of `batch` to `out`, returning how many were dropped.
    fn extract(&self, batch: &RecordBatch, out: &mut Vec<Record>) -> usize {
        let dates = batch.column(self.date).as_string::<i32>();
        let stocks = batch.column(self.stock).as_string::<i32>();
        let prices = batch.column(self.price).as_primitive::<Float64Type>();
        let positives = batch.column(self.positive).as_primitive::<Float64Type>();
        let neutrals = batch.column(self.neutral).as_primitive::<Float64Type>();
        let negatives = batch.column(self.negative).as_primitive::<Float64Type>();
        let articles = self.articles.map(|idx| batch.column(idx).as_string::<i32>());
        let counts = self.count.map(|idx| batch.column(idx).as_primitive::<Float64Type>());

        let mut dropped = 0;
        for i in 0..batch.num_rows() {
            let date = if dates.is_valid(i) { parse_date(dates.value(i)) } else { None };
            let complete = stocks.is_valid(i)
                && [prices, positives, neutrals, negatives]
                    .iter()
                    .all(|col| col.is_valid(i) && col.value(i).is_finite());

            let Some(date) = date.filter(|_| complete) else {
                debug!(row = i, "dropping incomplete row");
                dropped += 1;
                continue;
            };

            let text = articles
                .filter(|a| a.is_valid(i))
                .map(|a| a.value(i).to_string())
                .filter(|t| !t.is_empty());
            let article_count = match counts {
                Some(c) if c.is_valid(i) && c.value(i) >= 0.0 => c.value(i) as u32,
                _ => text.as_deref().map_or(0, |t| headline::extract_headlines(t).len() as u32),
            };

            let positive = positives.value(i);
            let negative = negatives.value(i);
            out.push(Record {
                date,
                stock: stocks.value(i).trim().to_string(),
                articles: text,
                price: prices.value(i),
                article_count,
                positive,
                neutral: neutrals.value(i),
                negative,
                compound: positive - negative,
            });
        }
        dropped
    }
}

/// Parse a date or timestamp string, keeping only the calendar day.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
