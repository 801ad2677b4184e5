use std::path::PathBuf;

use chrono::NaiveDate;

use crate::loader::Dataset;
use crate::types::{SentimentSelector, ViewQuery};

pub const DEFAULT_THRESHOLD: f64 = 0.7;
pub const DEFAULT_PORT: u16 = 8050;

/// Resolved start-up settings.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub port: u16,
    pub static_dir: PathBuf,
    pub view: ViewDefaults,
}

/// Initial widget values. Anything left unset is filled from the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDefaults {
    pub stock: Option<String>,
    pub selector: SentimentSelector,
    pub threshold: f64,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            stock: None,
            selector: SentimentSelector::AutoMax,
            threshold: DEFAULT_THRESHOLD,
            start: None,
            end: None,
        }
    }
}

impl ViewDefaults {
    /// First symbol and the full date span unless overridden. `None` for an
    /// empty dataset.
    pub fn resolve(&self, dataset: &Dataset) -> Option<ViewQuery> {
        let (min, max) = dataset.date_bounds()?;
        let stock = match &self.stock {
            Some(s) => s.clone(),
            None => dataset.symbols().first()?.to_string(),
        };
        Some(ViewQuery {
            stock,
            selector: self.selector,
            threshold: self.threshold,
            start: self.start.unwrap_or(min),
            end: self.end.unwrap_or(max),
        })
    }
}
