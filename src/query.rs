use crate::error::{MdmError, MdmResult};
use crate::metrics::{FilteredTimeSeries, MetricIdentifier, SamplingType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One dimension clause of a filtered query. An empty value list selects the
/// dimension (it appears on every returned series) without constraining it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionFilter {
    pub dimension: String,
    pub values: Vec<String>,
}

impl DimensionFilter {
    pub fn select(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            values: Vec::new(),
        }
    }

    pub fn matching(dimension: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            dimension: dimension.into(),
            values,
        }
    }
}

/// The request object posted (as JSON) to the filtered time-series query
/// endpoint. The binary response body is what the wire module decodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredTimeSeriesQueryRequest {
    pub metrics: Vec<MetricIdentifier>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub resolution_minutes: u32,
    pub sampling_types: Vec<SamplingType>,
    pub dimension_filters: Vec<DimensionFilter>,
    pub top: Option<u32>,
}

impl FilteredTimeSeriesQueryRequest {
    pub fn new(
        metrics: Vec<MetricIdentifier>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            metrics,
            start_time,
            end_time,
            resolution_minutes: 1,
            sampling_types: vec![SamplingType::sum()],
            dimension_filters: Vec::new(),
            top: None,
        }
    }

    pub fn with_resolution_minutes(mut self, resolution_minutes: u32) -> Self {
        self.resolution_minutes = resolution_minutes;
        self
    }

    pub fn with_sampling_types(mut self, sampling_types: Vec<SamplingType>) -> Self {
        self.sampling_types = sampling_types;
        self
    }

    pub fn with_dimension_filter(mut self, filter: DimensionFilter) -> Self {
        self.dimension_filters.push(filter);
        self
    }

    pub fn with_top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn validate(&self) -> MdmResult<()> {
        if self.metrics.is_empty() {
            return Err(MdmError::InvalidQuery(
                "at least one metric is required".to_string(),
            ));
        }
        for metric in &self.metrics {
            metric.validate()?;
        }
        if self.start_time > self.end_time {
            return Err(MdmError::InvalidQuery(format!(
                "start time {} is after end time {}",
                self.start_time, self.end_time
            )));
        }
        if self.resolution_minutes == 0 {
            return Err(MdmError::InvalidQuery(
                "resolution must be at least one minute".to_string(),
            ));
        }
        if self.sampling_types.is_empty() {
            return Err(MdmError::InvalidQuery(
                "at least one sampling type is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fully decoded filtered query response.
#[derive(Debug, Clone)]
pub struct FilteredTimeSeriesQueryResponse {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub resolution_minutes: u32,
    pub error_code: i16,
    pub time_series: Vec<FilteredTimeSeries>,
}
