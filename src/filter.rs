use chrono::NaiveDate;

use crate::error::QueryError;
use crate::loader::{parse_date, Dataset};
use crate::types::Record;

/// Rows of `stock` with `start <= date <= end`, in ascending date order.
///
/// An unknown stock or an inverted range yields an empty view.
pub fn filter<'a>(dataset: &'a Dataset, stock: &str, start: NaiveDate, end: NaiveDate) -> Vec<&'a Record> {
    if start > end {
        return Vec::new();
    }
    let records = dataset.records();
    let from = records.partition_point(|r| r.date < start);
    records[from..]
        .iter()
        .take_while(|r| r.date <= end)
        .filter(|r| r.stock == stock)
        .collect()
}

/// Rows of `stock` on exactly `date`, in table order.
pub fn records_on<'a>(dataset: &'a Dataset, stock: &str, date: NaiveDate) -> Vec<&'a Record> {
    filter(dataset, stock, date, date)
}

/// Parse a date-picker bound such as `2023-01-31` or `2023-01-31T00:00:00`.
pub fn parse_bound(s: &str) -> Result<NaiveDate, QueryError> {
    parse_date(s).ok_or_else(|| QueryError::InvalidDate(s.to_string()))
}
