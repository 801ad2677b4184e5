use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arrow::csv::Writer;
use arrow_array::{ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::GenerateError;

pub const SYMBOLS: &[(&str, f64)] = &[
    ("AAPL", 150.0),
    ("GOOGL", 140.0),
    ("MSFT", 420.0),
    ("AMZN", 185.0),
    ("TSLA", 250.0),
];

const UPBEAT: &[&str] = &["beats earnings estimates", "unveils new product line", "raises full-year guidance", "wins major contract"];
const DOWNBEAT: &[&str] = &["misses revenue targets", "faces regulatory probe", "announces layoffs", "cuts outlook"];
const FLAT: &[&str] = &["holds annual meeting", "reshuffles board", "confirms dividend", "comments on market conditions"];
const SOURCES: &[&str] = &["Reuters", "Bloomberg", "X", "Reddit", "MarketWatch"];

/// One generated input row, in the raw file layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub date: NaiveDate,
    pub stock: String,
    pub open: Option<f64>,
    pub articles: String,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

/// Random-walk prices with sentiment loosely tied to each day's move.
pub struct SampleGenerator {
    prices: HashMap<String, f64>,
    rng: StdRng,
    /// Probability that a row's open price is left blank.
    pub missing_rate: f64,
}

impl SampleGenerator {
    pub fn new(seed: u64) -> Self {
        let mut prices = HashMap::new();
        for (sym, base) in SYMBOLS {
            prices.insert(sym.to_string(), *base);
        }
        Self {
            prices,
            rng: StdRng::seed_from_u64(seed),
            missing_rate: 0.02,
        }
    }

    /// One row per symbol per weekday, for `days` calendar days from `start`.
    pub fn generate(&mut self, start: NaiveDate, days: usize) -> Vec<SampleRow> {
        let mut rows = Vec::with_capacity(days * SYMBOLS.len());
        for date in start.iter_days().take(days) {
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            for (sym, _) in SYMBOLS {
                rows.push(self.generate_row(date, sym));
            }
        }
        rows
    }

    fn generate_row(&mut self, date: NaiveDate, sym: &str) -> SampleRow {
        let price = self.prices.entry(sym.to_string()).or_insert(100.0);
        let change: f64 = self.rng.gen_range(-0.03..0.03);
        *price *= 1.0 + change;
        let open = *price;

        // Lean the sentiment mix toward the direction of the move.
        let mut positive: f64 = self.rng.gen_range(0.05..0.5) + change.max(0.0) * 10.0;
        let mut negative: f64 = self.rng.gen_range(0.05..0.5) + (-change).max(0.0) * 10.0;
        let mut neutral: f64 = self.rng.gen_range(0.05..0.6);
        let total = positive + neutral + negative;
        positive /= total;
        neutral /= total;
        negative /= total;

        let pool = if positive > negative + 0.15 {
            UPBEAT
        } else if negative > positive + 0.15 {
            DOWNBEAT
        } else {
            FLAT
        };
        let event = pool[self.rng.gen_range(0..pool.len())];
        let source = SOURCES[self.rng.gen_range(0..SOURCES.len())];
        let articles = format!("Headline: {sym} {event}, Source: {source}, Sentiment: mixed coverage");

        let open = if self.rng.gen_bool(self.missing_rate.clamp(0.0, 1.0)) {
            None
        } else {
            Some((open * 100.0).round() / 100.0)
        };

        SampleRow {
            date,
            stock: sym.to_string(),
            open,
            articles,
            positive,
            neutral,
            negative,
        }
    }
}

pub fn to_record_batch(rows: &[SampleRow]) -> Result<RecordBatch, GenerateError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Date", DataType::Utf8, false),
        Field::new("Stock", DataType::Utf8, false),
        Field::new("Open Price", DataType::Float64, true),
        Field::new("Articles", DataType::Utf8, true),
        Field::new("Positive", DataType::Float64, false),
        Field::new("Neutral", DataType::Float64, false),
        Field::new("Negative", DataType::Float64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.date.format("%Y-%m-%d").to_string()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.stock.as_str()))),
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.open))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.articles.as_str()))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.positive))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.neutral))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.negative))),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

pub fn to_csv_bytes(rows: &[SampleRow]) -> Result<Vec<u8>, GenerateError> {
    let batch = to_record_batch(rows)?;
    let mut buf = Vec::new();
    {
        let mut writer = Writer::new(&mut buf);
        writer.write(&batch)?;
    }
    Ok(buf)
}

pub fn write_csv<P: AsRef<Path>>(path: P, rows: &[SampleRow]) -> Result<(), GenerateError> {
    let path = path.as_ref();
    let bytes = to_csv_bytes(rows)?;
    std::fs::write(path, bytes).map_err(|source| GenerateError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), rows = rows.len(), "sample dataset written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() // a Monday
    }

    #[test]
    fn test_generate_skips_weekends() {
        let rows = SampleGenerator::new(7).generate(start(), 7);
        assert_eq!(rows.len(), 5 * SYMBOLS.len());
        assert!(rows.iter().all(|r| !matches!(r.date.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn test_fractions_sum_to_one() {
        let rows = SampleGenerator::new(11).generate(start(), 30);
        for r in &rows {
            let sum = r.positive + r.neutral + r.negative;
            assert!((sum - 1.0).abs() < 1e-9, "fractions sum to {sum}");
        }
    }

    #[test]
    fn test_same_seed_same_rows() {
        let a = SampleGenerator::new(42).generate(start(), 10);
        let b = SampleGenerator::new(42).generate(start(), 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_csv_loads_back_and_drops_blank_prices() {
        let mut gen = SampleGenerator::new(3);
        gen.missing_rate = 0.5;
        let rows = gen.generate(start(), 60);
        let blanks = rows.iter().filter(|r| r.open.is_none()).count();
        assert!(blanks > 0);

        let ds = Dataset::from_csv_bytes(&to_csv_bytes(&rows).unwrap()).unwrap();
        assert_eq!(ds.len(), rows.len() - blanks);
        assert_eq!(ds.dropped_rows(), blanks);
        assert!(ds.records().iter().all(|r| r.article_count == 1));
    }
}
