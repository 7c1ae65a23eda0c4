//! Analysis oracle: the external service that accepts layers and reports
//! their vulnerabilities.

mod client;
pub mod types;

use async_trait::async_trait;
use layerscan_core::error::Result;

use crate::layer::LayerId;

pub use client::ClairClient;
pub use types::{ErrorMessage, Feature, Layer, LayerEnvelope, Severity, Vulnerability};

/// Remote layer analysis service.
///
/// `push_layer` maps an explicit refusal to analyze the layer to
/// `ScanError::LayerUnanalyzable`; every other failure is a transport or
/// decode error.
#[async_trait]
pub trait AnalysisOracle: Send + Sync {
    /// Submit a layer (with its parent linkage) for analysis.
    async fn push_layer(&self, envelope: &LayerEnvelope) -> Result<()>;

    /// Fetch the features and vulnerabilities found in a layer.
    async fn fetch_layer(&self, layer: &LayerId) -> Result<LayerEnvelope>;
}
