use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

/// Output label of a measured field (`Close`, `Open_Interest`, ...).
///
/// Labels are interned once per run and shared by every quote, so cloning
/// one is a reference-count bump.
pub type FieldLabel = Arc<str>;

/// One long-format input row: a ticker observed at a timestamp with its
/// measured fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    pub ticker: String,
    pub timestamp: NaiveDateTime,
    pub values: Vec<(FieldLabel, f64)>,
}

impl RawQuote {
    pub fn new(ticker: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            ticker: ticker.into(),
            timestamp,
            values: Vec::new(),
        }
    }

    /// Builder-style helper for attaching a measured value.
    pub fn with_value(mut self, field: impl Into<FieldLabel>, value: f64) -> Self {
        self.values.push((field.into(), value));
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// Value of a field, if this quote carries it.
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(label, _)| label.as_ref() == field)
            .map(|(_, v)| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 31)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn builder_collects_values_in_order() {
        let q = RawQuote::new("TCS-I.NFO", ts(9, 15, 59))
            .with_value("Open", 2600.0)
            .with_value("Close", 2601.0);

        assert_eq!(q.values.len(), 2);
        assert_eq!(q.value("Close"), Some(2601.0));
        assert_eq!(q.value("Volume"), None);
        assert_eq!(q.time_of_day(), NaiveTime::from_hms_opt(9, 15, 59).unwrap());
    }

    #[test]
    fn shared_labels_point_to_same_allocation() {
        let close: FieldLabel = Arc::from("Close");
        let a = RawQuote::new("A", ts(9, 15, 0)).with_value(close.clone(), 1.0);
        let b = RawQuote::new("B", ts(9, 15, 0)).with_value(close.clone(), 2.0);
        assert!(Arc::ptr_eq(&a.values[0].0, &b.values[0].0));
    }
}
