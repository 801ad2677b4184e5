use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::types::{MonthlyBucket, Record, SentimentComposition};

/// Last calendar day of `date`'s month.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

struct MonthAcc {
    compound: f64,
    first_date: NaiveDate,
    price: f64,
}

/// Resample a filtered view to calendar months.
///
/// Each bucket sums the compound score of its rows and takes the price of its
/// chronologically first row. Percent change is measured against the previous
/// non-empty bucket; months without rows produce no bucket. Scaling is local
/// to the buckets returned here.
pub fn aggregate(rows: &[&Record]) -> Vec<MonthlyBucket> {
    let mut months: BTreeMap<NaiveDate, MonthAcc> = BTreeMap::new();
    for r in rows {
        let acc = months.entry(month_end(r.date)).or_insert(MonthAcc {
            compound: 0.0,
            first_date: r.date,
            price: r.price,
        });
        acc.compound += r.compound;
        if r.date < acc.first_date {
            acc.first_date = r.date;
            acc.price = r.price;
        }
    }

    let mut buckets = Vec::with_capacity(months.len());
    let mut prev_price: Option<f64> = None;
    for (month_end, acc) in months {
        let pct_change = prev_price.and_then(|prev| pct_change(prev, acc.price));
        buckets.push(MonthlyBucket {
            month_end,
            compound: acc.compound,
            price: acc.price,
            pct_change,
            scaled_pct_change: None,
        });
        prev_price = Some(acc.price);
    }

    scale_pct_changes(&mut buckets);
    buckets
}

/// Percent change from `prev` to `cur`; undefined when `prev` is zero.
fn pct_change(prev: f64, cur: f64) -> Option<f64> {
    if prev == 0.0 {
        return None;
    }
    Some((cur - prev) / prev * 100.0)
}

/// Min-max scale the present percent changes into [0, 1].
///
/// When there is nothing to spread (no changes, or all equal) every bucket,
/// including the first, is pinned to 0.
fn scale_pct_changes(buckets: &mut [MonthlyBucket]) {
    let (min, max) = buckets
        .iter()
        .filter_map(|b| b.pct_change)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = max - min;

    if span > 0.0 && span.is_finite() {
        for b in buckets.iter_mut() {
            b.scaled_pct_change = b.pct_change.map(|v| (v - min) / span);
        }
    } else {
        for b in buckets.iter_mut() {
            b.scaled_pct_change = Some(0.0);
        }
    }
}

/// Mean of each sentiment fraction over the view; `None` when empty.
pub fn composition(rows: &[&Record]) -> Option<SentimentComposition> {
    if rows.is_empty() {
        return None;
    }
    let n = rows.len() as f64;
    let (p, u, g) = rows.iter().fold((0.0, 0.0, 0.0), |(p, u, g), r| {
        (p + r.positive, u + r.neutral, g + r.negative)
    });
    Some(SentimentComposition {
        positive: p / n,
        neutral: u / n,
        negative: g / n,
    })
}
