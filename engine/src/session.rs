//! Scan session.
//!
//! Owns the registry mapping store and the oracle connection for one
//! orchestration context, and hands both to the push and analyze pipelines.
//! Sessions created with [`ScanSession::with_mapping`] can share one store.

use std::sync::Arc;

use layerscan_core::config::ScanConfig;
use layerscan_core::error::Result;

use crate::analysis::ImageAnalysis;
use crate::analyze::LayerAnalyzer;
use crate::dispatch::{route, Pipeline};
use crate::layer::LayerId;
use crate::mapping::RegistryMappingStore;
use crate::oci::{ImageReference, Manifest};
use crate::oracle::{AnalysisOracle, ClairClient};
use crate::push::{LayerPusher, PushReport};
use crate::transport::TransportMode;

/// Push/analyze orchestration context.
pub struct ScanSession {
    oracle: Arc<dyn AnalysisOracle>,
    mapping: Arc<RegistryMappingStore>,
    mode: TransportMode,
}

impl ScanSession {
    /// Create a session with a fresh mapping store.
    pub fn new(oracle: Arc<dyn AnalysisOracle>, mode: TransportMode) -> Self {
        Self::with_mapping(oracle, Arc::new(RegistryMappingStore::new()), mode)
    }

    /// Create a session sharing an existing mapping store.
    pub fn with_mapping(
        oracle: Arc<dyn AnalysisOracle>,
        mapping: Arc<RegistryMappingStore>,
        mode: TransportMode,
    ) -> Self {
        Self {
            oracle,
            mapping,
            mode,
        }
    }

    /// Create a session talking HTTP to the configured oracle.
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        let mode = TransportMode::from_config(config)?;
        let oracle = ClairClient::new(config.oracle_base_url());
        tracing::debug!(oracle = %oracle.base_url(), mode = ?mode, "Scan session created");
        Ok(Self::new(Arc::new(oracle), mode))
    }

    pub fn mapping(&self) -> &Arc<RegistryMappingStore> {
        &self.mapping
    }

    /// Push an image's layers to the oracle.
    ///
    /// An unsupported manifest schema is returned as a recoverable error
    /// before any oracle call.
    pub async fn push(&self, image: &ImageReference, manifest: &Manifest) -> Result<PushReport> {
        let v1 = route(manifest, Pipeline::Push)?;
        let pusher = LayerPusher::new(
            Arc::clone(&self.oracle),
            Arc::clone(&self.mapping),
            self.mode.clone(),
        );
        pusher.push(image, &v1.layer_digests()).await
    }

    /// Retrieve the oracle's findings for an image's layers.
    ///
    /// An unsupported manifest schema is fatal: the error is marked as such
    /// and no partial result is produced.
    pub async fn analyze(
        &self,
        image: &ImageReference,
        manifest: &Manifest,
    ) -> Result<ImageAnalysis> {
        let v1 = route(manifest, Pipeline::Analyze)?;
        let analyzer = LayerAnalyzer::new(Arc::clone(&self.oracle), self.mode.is_local());
        Ok(analyzer
            .analyze(image, &v1.name, &v1.tag, &v1.layer_digests())
            .await)
    }

    /// Origin registry URL of a pushed layer's blob.
    pub fn blob_url(&self, repository: &str, layer: &LayerId) -> Result<String> {
        self.mapping.blob_url(repository, layer)
    }
}
