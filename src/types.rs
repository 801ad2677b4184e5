use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Base Table ──

/// One stock on one day, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    pub stock: String,
    pub articles: Option<String>,
    #[serde(rename = "Stock Price")]
    pub price: f64,
    pub article_count: u32,
    #[serde(rename = "Positive Sentiment")]
    pub positive: f64,
    #[serde(rename = "Neutral Sentiment")]
    pub neutral: f64,
    #[serde(rename = "Negative Sentiment")]
    pub negative: f64,
    pub compound: f64,
}

impl Record {
    pub fn fraction(&self, kind: SentimentKind) -> f64 {
        match kind {
            SentimentKind::Positive => self.positive,
            SentimentKind::Neutral => self.neutral,
            SentimentKind::Negative => self.negative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentKind {
    Positive,
    Neutral,
    Negative,
}

/// Column order, which is also the argmax tie-break order.
pub const ALL_KINDS: [SentimentKind; 3] = [
    SentimentKind::Positive,
    SentimentKind::Neutral,
    SentimentKind::Negative,
];

impl SentimentKind {
    pub fn label(&self) -> &'static str {
        match self {
            SentimentKind::Positive => "Positive",
            SentimentKind::Neutral => "Neutral",
            SentimentKind::Negative => "Negative",
        }
    }

    /// Marker color used by both dashboards.
    pub fn color(&self) -> &'static str {
        match self {
            SentimentKind::Positive => "#2ecc71",
            SentimentKind::Neutral => "#3498db",
            SentimentKind::Negative => "#e74c3c",
        }
    }
}

/// Which sentiment drives the threshold view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SentimentSelector {
    Explicit(SentimentKind),
    #[default]
    AutoMax,
}

impl SentimentSelector {
    pub fn label(&self) -> &'static str {
        match self {
            SentimentSelector::Explicit(kind) => kind.label(),
            SentimentSelector::AutoMax => "All",
        }
    }

    /// Positive -> Neutral -> Negative -> All -> Positive.
    pub fn next(&self) -> Self {
        match self {
            SentimentSelector::Explicit(SentimentKind::Positive) => {
                SentimentSelector::Explicit(SentimentKind::Neutral)
            }
            SentimentSelector::Explicit(SentimentKind::Neutral) => {
                SentimentSelector::Explicit(SentimentKind::Negative)
            }
            SentimentSelector::Explicit(SentimentKind::Negative) => SentimentSelector::AutoMax,
            SentimentSelector::AutoMax => SentimentSelector::Explicit(SentimentKind::Positive),
        }
    }
}

impl std::str::FromStr for SentimentSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "positive sentiment" => Ok(SentimentSelector::Explicit(SentimentKind::Positive)),
            "neutral" | "neutral sentiment" => Ok(SentimentSelector::Explicit(SentimentKind::Neutral)),
            "negative" | "negative sentiment" => Ok(SentimentSelector::Explicit(SentimentKind::Negative)),
            "all" | "all sentiments" => Ok(SentimentSelector::AutoMax),
            other => Err(format!("unknown sentiment type: {other}")),
        }
    }
}

// ── Derived Views ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledRecord<'a> {
    pub record: &'a Record,
    pub label: SentimentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub month_end: NaiveDate,
    pub compound: f64,
    pub price: f64,
    pub pct_change: Option<f64>,
    pub scaled_pct_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentComposition {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl SentimentComposition {
    pub fn get(&self, kind: SentimentKind) -> f64 {
        match kind {
            SentimentKind::Positive => self.positive,
            SentimentKind::Neutral => self.neutral,
            SentimentKind::Negative => self.negative,
        }
    }
}

/// Inputs shared by every view: the dropdowns, slider and date picker.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery {
    pub stock: String,
    pub selector: SentimentSelector,
    pub threshold: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}
