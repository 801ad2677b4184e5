//! Click-driven detail panels.
//!
//! A [`Selection`] is the last thing the user clicked. It is owned by the
//! presentation session (one per TUI run, one per WebSocket connection) and
//! passed into the pure detail queries below; nothing here holds state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::month_end;
use crate::filter::records_on;
use crate::headline::extract_headline;
use crate::loader::Dataset;
use crate::types::MonthlyBucket;

pub const NO_SELECTION_PROMPT: &str = "Select a sentiment point to view the headline.";
pub const NO_HEADLINE_MESSAGE: &str = "No headline available for the selected date.";

/// Which chart a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Daily price line with sentiment markers.
    PriceLine,
    /// Monthly compound sentiment and scaled price change.
    MonthlyCompound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub chart: ChartKind,
    pub x: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "date", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    NoSelection,
    MonthSelected(NaiveDate),
    DateSelected(NaiveDate),
}

impl Selection {
    /// Each click replaces whatever was selected before.
    pub fn click(self, event: ClickEvent) -> Selection {
        let next = match event.chart {
            ChartKind::MonthlyCompound => Selection::MonthSelected(month_end(event.x)),
            ChartKind::PriceLine => Selection::DateSelected(event.x),
        };
        debug!(from = ?self, to = ?next, "selection changed");
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceDirection {
    Gain,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceInfo {
    pub month_end: NaiveDate,
    pub price: f64,
    pub pct_change: Option<f64>,
    pub direction: Option<PriceDirection>,
}

impl PriceInfo {
    pub fn price_text(&self) -> String {
        format!("${:.2}", self.price)
    }

    pub fn pct_change_text(&self) -> String {
        match self.pct_change {
            Some(p) => format!("{p:+.2}%"),
            None => "n/a".to_string(),
        }
    }
}

/// Price details for the bucket ending on `month`, if the current window has one.
pub fn price_info(buckets: &[MonthlyBucket], month: NaiveDate) -> Option<PriceInfo> {
    let bucket = buckets.iter().find(|b| b.month_end == month)?;
    let direction = bucket.pct_change.map(|p| {
        if p >= 0.0 {
            PriceDirection::Gain
        } else {
            PriceDirection::Loss
        }
    });
    Some(PriceInfo {
        month_end: bucket.month_end,
        price: bucket.price,
        pct_change: bucket.pct_change,
        direction,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HeadlineDetail {
    Found { date: NaiveDate, headline: String },
    NotAvailable,
}

impl HeadlineDetail {
    pub fn message(&self) -> String {
        match self {
            HeadlineDetail::Found { date, headline } => format!("Date: {date} - {headline}"),
            HeadlineDetail::NotAvailable => NO_HEADLINE_MESSAGE.to_string(),
        }
    }
}

/// First headline among `stock`'s records on `date`. Records whose text has
/// no marker are skipped.
pub fn headline_for(dataset: &Dataset, stock: &str, date: NaiveDate) -> HeadlineDetail {
    records_on(dataset, stock, date)
        .into_iter()
        .filter_map(|r| r.articles.as_deref())
        .find_map(|text| extract_headline(text).ok())
        .map(|headline| HeadlineDetail::Found { date, headline })
        .unwrap_or(HeadlineDetail::NotAvailable)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum DetailPanel {
    Empty { prompt: &'static str },
    Price { info: Option<PriceInfo> },
    Headline { detail: HeadlineDetail },
}

/// Resolve the detail panel for `selection` against the current window.
pub fn detail_for(dataset: &Dataset, stock: &str, buckets: &[MonthlyBucket], selection: Selection) -> DetailPanel {
    match selection {
        Selection::NoSelection => DetailPanel::Empty { prompt: NO_SELECTION_PROMPT },
        Selection::MonthSelected(month) => DetailPanel::Price { info: price_info(buckets, month) },
        Selection::DateSelected(date) => DetailPanel::Headline { detail: headline_for(dataset, stock, date) },
    }
}
