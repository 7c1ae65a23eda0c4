//! HTTP client for the analysis service's layer API.

use async_trait::async_trait;
use layerscan_core::error::{Result, ScanError};
use reqwest::StatusCode;

use super::types::LayerEnvelope;
use super::AnalysisOracle;
use crate::layer::LayerId;

/// Analysis oracle reached over HTTP.
pub struct ClairClient {
    http: reqwest::Client,
    /// API base URL, e.g. `http://localhost:6060/v1`
    base_url: String,
}

impl ClairClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing HTTP client.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn layers_url(&self) -> String {
        format!("{}/layers", self.base_url)
    }

    fn layer_url(&self, layer: &LayerId) -> String {
        format!("{}/layers/{}?vulnerabilities", self.base_url, layer)
    }
}

#[async_trait]
impl AnalysisOracle for ClairClient {
    async fn push_layer(&self, envelope: &LayerEnvelope) -> Result<()> {
        let url = self.layers_url();

        tracing::debug!(url = %url, layer = %envelope.layer_name(), "Submitting layer");

        let response = self
            .http
            .post(&url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| ScanError::Transport {
                endpoint: url.clone(),
                status: None,
                message: format!("pushing layer: {}", e),
            })?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            StatusCode::UNPROCESSABLE_ENTITY => Err(ScanError::LayerUnanalyzable {
                layer: envelope.layer_name().to_string(),
            }),
            status => Err(ScanError::status(url, status.as_u16())),
        }
    }

    async fn fetch_layer(&self, layer: &LayerId) -> Result<LayerEnvelope> {
        let url = self.layer_url(layer);

        tracing::debug!(url = %url, "Fetching layer analysis");

        let response = self.http.get(&url).send().await.map_err(|e| {
            ScanError::Transport {
                endpoint: url.clone(),
                status: None,
                message: format!("analysing layer {}: {}", layer, e),
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ScanError::status(url, status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| ScanError::Transport {
            endpoint: url.clone(),
            status: Some(status.as_u16()),
            message: format!("reading layer analysis: {}", e),
        })?;

        serde_json::from_slice(&body).map_err(|e| ScanError::Decode {
            endpoint: url,
            message: format!("reading layer analysis: {}", e),
        })
    }
}
