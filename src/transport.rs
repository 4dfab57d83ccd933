use crate::error::{MdmError, MdmResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// The HTTP seam. One implementation posts over the network; tests swap in
/// canned response bodies.
#[async_trait]
pub trait MetricsTransport: Send + Sync {
    /// Posts a JSON-encoded query and returns the raw response body.
    async fn post_query(&self, path: &str, body: Vec<u8>) -> MdmResult<Vec<u8>>;
}

/// Thin reqwest-backed transport: one POST per call, a per-request timeout,
/// and a client request id header. Retry and auth belong to the caller.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl MetricsTransport for HttpTransport {
    async fn post_query(&self, path: &str, body: Vec<u8>) -> MdmResult<Vec<u8>> {
        let url = format!("{}{}", self.endpoint, path);
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!("Posting query {} to {}", request_id, url);

        let response = self
            .client
            .post(&url)
            .header("x-ms-client-request-id", &request_id)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MdmError::Network(format!("request {} failed: {}", request_id, e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Query {} failed with HTTP status {}", request_id, status);
            return Err(MdmError::Network(format!(
                "HTTP error from {}: {}",
                url, status
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            MdmError::Network(format!(
                "failed to read response body for {}: {}",
                request_id, e
            ))
        })?;
        Ok(bytes.to_vec())
    }
}
