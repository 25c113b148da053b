use std::{collections::HashMap, fmt};

use super::metric_fields::{metric_fields, MetricField};

/// Report value written for anything the API did not provide.
pub const UNAVAILABLE: &str = "N/A";

/// Output row keyed by field name, before it is laid out against the report schema.
pub type ReportRow = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    Unavailable,
}

impl MetricValue {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, MetricValue::Unavailable)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(t) => f.write_str(t),
            MetricValue::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

/// Metrics for one audited URL. Holds exactly one value per entry of
/// [`metric_fields`], in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    url: String,
    values: Vec<MetricValue>,
}

impl MetricRecord {
    /// Record used when the audit could not be fetched at all.
    pub fn unavailable(url: impl Into<String>) -> Self {
        MetricRecord {
            url: url.into(),
            values: vec![MetricValue::Unavailable; metric_fields().len()],
        }
    }

    pub(crate) fn from_values(url: impl Into<String>, values: Vec<MetricValue>) -> Self {
        debug_assert_eq!(values.len(), metric_fields().len());
        MetricRecord {
            url: url.into(),
            values,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        metric_fields()
            .iter()
            .position(|field| field.name == name)
            .and_then(|index| self.values.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static MetricField, &MetricValue)> {
        metric_fields().iter().zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when no metric at all could be read, e.g. after a failed request.
    pub fn all_unavailable(&self) -> bool {
        self.values.iter().all(MetricValue::is_unavailable)
    }

    pub fn to_row(&self) -> ReportRow {
        let mut row: ReportRow = self
            .iter()
            .map(|(field, value)| (field.name.clone(), value.to_string()))
            .collect();
        row.insert("url".to_string(), self.url.clone());
        row
    }
}
