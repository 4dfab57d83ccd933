pub mod error;
pub mod metrics;
pub mod query;
pub mod transport;
pub mod wire;

use error::MdmResult;
use query::{FilteredTimeSeriesQueryRequest, FilteredTimeSeriesQueryResponse};
use std::sync::Arc;
use std::time::Duration;
use transport::{HttpTransport, MetricsTransport};
use wire::FilteredTimeSeriesStream;

const FILTERED_QUERY_PATH: &str = "/api/query/filtered";
const FILTERED_QUERY_STREAM_PATH: &str = "/api/query/filtered/stream";

#[derive(Debug, Clone)]
pub struct MdmConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

impl Default for MdmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5001".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl MdmConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(endpoint) = std::env::var("MDM_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(timeout_str) = std::env::var("MDM_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = timeout_str.parse().unwrap_or(30);
        }

        config
    }
}

/// Client for the multi-dimensional metrics platform's query surface. Builds
/// JSON requests, posts them through the transport, and decodes the binary
/// response bodies.
pub struct MdmClient {
    #[allow(dead_code)]
    config: MdmConfig,
    transport: Arc<dyn MetricsTransport>,
}

impl MdmClient {
    pub fn new(config: MdmConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
        ));
        Self { config, transport }
    }

    /// Swaps the HTTP seam; used by tests and by callers that bring their
    /// own transport stack.
    pub fn with_transport(config: MdmConfig, transport: Arc<dyn MetricsTransport>) -> Self {
        Self { config, transport }
    }

    /// Runs a filtered query and decodes the whole response into memory.
    pub async fn query_filtered_time_series(
        &self,
        request: &FilteredTimeSeriesQueryRequest,
    ) -> MdmResult<FilteredTimeSeriesQueryResponse> {
        request.validate()?;
        let body = serde_json::to_vec(request)?;
        let response_body = self.transport.post_query(FILTERED_QUERY_PATH, body).await?;
        wire::deserialize_query_response(response_body)
    }

    /// Runs a filtered query against the streaming endpoint and returns a
    /// lazy iterator over the records, for results too large to hold at
    /// once.
    pub async fn stream_filtered_time_series(
        &self,
        request: &FilteredTimeSeriesQueryRequest,
    ) -> MdmResult<FilteredTimeSeriesStream> {
        request.validate()?;
        let body = serde_json::to_vec(request)?;
        let response_body = self
            .transport
            .post_query(FILTERED_QUERY_STREAM_PATH, body)
            .await?;
        Ok(wire::stream_query_response(response_body))
    }
}
