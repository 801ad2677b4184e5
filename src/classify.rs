use crate::types::{LabeledRecord, Record, SentimentKind, SentimentSelector, ALL_KINDS};

/// Label the rows of a filtered view for the sentiment-marker chart.
///
/// With an explicit kind, only rows whose fraction for that kind reaches
/// `threshold` survive, and every survivor carries that kind as its label
/// even if another fraction is larger. With [`SentimentSelector::AutoMax`]
/// every row survives and is labeled by [`dominant`]. `threshold` is not
/// range-checked.
pub fn classify<'a>(rows: &[&'a Record], selector: SentimentSelector, threshold: f64) -> Vec<LabeledRecord<'a>> {
    match selector {
        SentimentSelector::Explicit(kind) => rows
            .iter()
            .copied()
            .filter(|r| r.fraction(kind) >= threshold)
            .map(|r| LabeledRecord { record: r, label: kind })
            .collect(),
        SentimentSelector::AutoMax => rows
            .iter()
            .copied()
            .map(|r| LabeledRecord { record: r, label: dominant(r) })
            .collect(),
    }
}

/// Kind with the largest fraction; ties go to the earlier column.
pub fn dominant(record: &Record) -> SentimentKind {
    let mut best = ALL_KINDS[0];
    for kind in &ALL_KINDS[1..] {
        if record.fraction(*kind) > record.fraction(best) {
            best = *kind;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(day: u32, positive: f64, neutral: f64, negative: f64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            stock: "ABC".into(),
            articles: None,
            price: 10.0,
            article_count: 0,
            positive,
            neutral,
            negative,
            compound: positive - negative,
        }
    }

    #[test]
    fn test_auto_max_labels_every_row() {
        let rows = [rec(1, 0.7, 0.2, 0.1), rec(2, 0.1, 0.8, 0.1), rec(3, 0.1, 0.2, 0.7)];
        let refs: Vec<&Record> = rows.iter().collect();
        let labels: Vec<_> = classify(&refs, SentimentSelector::AutoMax, 0.99)
            .into_iter()
            .map(|l| l.label)
            .collect();
        assert_eq!(labels, vec![SentimentKind::Positive, SentimentKind::Neutral, SentimentKind::Negative]);
    }

    #[test]
    fn test_auto_max_tie_break_order() {
        assert_eq!(dominant(&rec(1, 0.4, 0.4, 0.2)), SentimentKind::Positive);
        assert_eq!(dominant(&rec(1, 0.2, 0.4, 0.4)), SentimentKind::Neutral);
        assert_eq!(dominant(&rec(1, 0.4, 0.2, 0.4)), SentimentKind::Positive);
        assert_eq!(dominant(&rec(1, 0.0, 0.0, 0.0)), SentimentKind::Positive);
    }

    #[test]
    fn test_explicit_label_is_fixed() {
        // Row 2 is mostly negative but still clears the neutral threshold.
        let rows = [rec(1, 0.1, 0.2, 0.7), rec(2, 0.0, 0.35, 0.65), rec(3, 0.1, 0.8, 0.1)];
        let refs: Vec<&Record> = rows.iter().collect();
        let out = classify(&refs, SentimentSelector::Explicit(SentimentKind::Neutral), 0.3);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|l| l.label == SentimentKind::Neutral));
        assert_eq!(out[0].record.date.to_string(), "2023-01-02");
    }

    #[test]
    fn test_threshold_inclusive_and_out_of_range() {
        let rows = [rec(1, 0.7, 0.2, 0.1), rec(2, 1.0, 0.0, 0.0)];
        let refs: Vec<&Record> = rows.iter().collect();
        let positive = SentimentSelector::Explicit(SentimentKind::Positive);
        assert_eq!(classify(&refs, positive, 0.7).len(), 2);
        assert_eq!(classify(&refs, positive, 1.0).len(), 1);
        assert!(classify(&refs[..1], positive, 1.0).is_empty());
        assert_eq!(classify(&refs, positive, -5.0).len(), 2);
        assert!(classify(&refs, positive, 1.5).is_empty());
    }
}
