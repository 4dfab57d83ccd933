use crate::error::{MdmError, MdmResult};
use serde::{Deserialize, Serialize};

/// Identity of a metric: account, namespace, and name. Compared by value and
/// usable as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricIdentifier {
    pub monitoring_account: String,
    pub metric_namespace: String,
    pub metric_name: String,
}

impl MetricIdentifier {
    pub fn new(
        monitoring_account: impl Into<String>,
        metric_namespace: impl Into<String>,
        metric_name: impl Into<String>,
    ) -> Self {
        Self {
            monitoring_account: monitoring_account.into(),
            metric_namespace: metric_namespace.into(),
            metric_name: metric_name.into(),
        }
    }

    pub fn validate(&self) -> MdmResult<()> {
        if self.monitoring_account.is_empty() {
            return Err(MdmError::InvalidQuery(
                "monitoring account must not be empty".to_string(),
            ));
        }
        if self.metric_namespace.is_empty() {
            return Err(MdmError::InvalidQuery(
                "metric namespace must not be empty".to_string(),
            ));
        }
        if self.metric_name.is_empty() {
            return Err(MdmError::InvalidQuery(
                "metric name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

const BUILTIN_SAMPLING_TYPES: [&str; 5] = ["Sum", "Count", "Min", "Max", "Average"];

/// A named sampling kind. Built-in kinds are resolved through a registry so
/// that casing is normalized; unrecognized names become ad-hoc instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SamplingType {
    name: String,
}

impl SamplingType {
    pub fn sum() -> Self {
        Self::from_name("Sum")
    }

    pub fn count() -> Self {
        Self::from_name("Count")
    }

    pub fn min() -> Self {
        Self::from_name("Min")
    }

    pub fn max() -> Self {
        Self::from_name("Max")
    }

    pub fn average() -> Self {
        Self::from_name("Average")
    }

    pub fn from_name(name: &str) -> Self {
        for builtin in BUILTIN_SAMPLING_TYPES {
            if builtin.eq_ignore_ascii_case(name) {
                return Self {
                    name: builtin.to_string(),
                };
            }
        }
        Self {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The (metric, dimension names) shape shared by one or more decoded series.
/// Responses before version 3 carry exactly one; version 3 responses carry a
/// table of them referenced by index per record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeriesMetadata {
    pub metric: MetricIdentifier,
    pub dimension_names: Vec<String>,
}

/// One decoded time series record.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredTimeSeries {
    metric: MetricIdentifier,
    dimensions: Vec<(String, String)>,
    evaluated_result: f64,
    values: Vec<(SamplingType, Vec<f64>)>,
}

impl FilteredTimeSeries {
    pub(crate) fn new(
        metric: MetricIdentifier,
        dimensions: Vec<(String, String)>,
        evaluated_result: f64,
        values: Vec<(SamplingType, Vec<f64>)>,
    ) -> Self {
        Self {
            metric,
            dimensions,
            evaluated_result,
            values,
        }
    }

    pub fn metric(&self) -> &MetricIdentifier {
        &self.metric
    }

    /// Dimension name/value pairs in the order they appear on the wire.
    pub fn dimensions(&self) -> &[(String, String)] {
        &self.dimensions
    }

    /// The scalar result of the query's filter expression, NaN when the
    /// server sent no evaluated properties for this series.
    pub fn evaluated_result(&self) -> f64 {
        self.evaluated_result
    }

    pub fn sampling_types(&self) -> impl Iterator<Item = &SamplingType> {
        self.values.iter().map(|(sampling_type, _)| sampling_type)
    }

    pub fn time_series_values(&self, sampling_type: &SamplingType) -> Option<&[f64]> {
        self.values
            .iter()
            .find(|(st, _)| st == sampling_type)
            .map(|(_, values)| values.as_slice())
    }
}

/// Per-response quality indicators. Parsed to keep the stream aligned and
/// logged; not surfaced through the response envelope.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryResultQualityInfo {
    pub estimated_series_count: i32,
    pub dropped_series_count: i32,
    pub drop_reasons: Vec<(String, i32)>,
}

/// Free-form diagnostic message trailing a response. Consumed and logged,
/// never returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryMessage {
    pub topic: u8,
    pub level: u8,
    pub source: u8,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_metric_identifier_equality() {
        let a = MetricIdentifier::new("acct", "ns", "cpu");
        let b = MetricIdentifier::new("acct", "ns", "cpu");
        let c = MetricIdentifier::new("acct", "ns", "memory");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_metric_identifier_as_map_key() {
        let mut map = HashMap::new();
        map.insert(MetricIdentifier::new("acct", "ns", "cpu"), 1);
        map.insert(MetricIdentifier::new("acct", "ns", "memory"), 2);

        assert_eq!(map.get(&MetricIdentifier::new("acct", "ns", "cpu")), Some(&1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_metric_identifier_validation() {
        assert!(MetricIdentifier::new("acct", "ns", "cpu").validate().is_ok());
        assert!(MetricIdentifier::new("", "ns", "cpu").validate().is_err());
        assert!(MetricIdentifier::new("acct", "", "cpu").validate().is_err());
        assert!(MetricIdentifier::new("acct", "ns", "").validate().is_err());
    }

    #[test]
    fn test_sampling_type_registry_normalizes_builtins() {
        assert_eq!(SamplingType::from_name("sum"), SamplingType::sum());
        assert_eq!(SamplingType::from_name("SUM").name(), "Sum");
        assert_eq!(SamplingType::from_name("average"), SamplingType::average());
    }

    #[test]
    fn test_sampling_type_ad_hoc() {
        let custom = SamplingType::from_name("P99.9");
        assert_eq!(custom.name(), "P99.9");
        assert_ne!(custom, SamplingType::sum());
        assert_eq!(custom, SamplingType::from_name("P99.9"));
    }

    #[test]
    fn test_filtered_time_series_value_lookup() {
        let series = FilteredTimeSeries::new(
            MetricIdentifier::new("acct", "ns", "cpu"),
            vec![("host".to_string(), "web01".to_string())],
            5.0,
            vec![
                (SamplingType::sum(), vec![1.0, 2.0]),
                (SamplingType::count(), vec![1.0, 1.0]),
            ],
        );

        assert_eq!(series.time_series_values(&SamplingType::sum()), Some(&[1.0, 2.0][..]));
        assert_eq!(series.time_series_values(&SamplingType::count()), Some(&[1.0, 1.0][..]));
        assert_eq!(series.time_series_values(&SamplingType::max()), None);
        assert_eq!(series.evaluated_result(), 5.0);
        assert_eq!(series.sampling_types().count(), 2);
    }
}
