//! Push pipeline.
//!
//! Submits an image's layers base → top, each one naming its predecessor as
//! parent. The chain is only extended through layers the oracle accepted:
//! after a refused layer the next one starts a new chain.

use std::sync::Arc;

use layerscan_core::error::Result;

use crate::layer::LayerId;
use crate::mapping::{registry_url, RegistryMappingStore};
use crate::oci::ImageReference;
use crate::oracle::{AnalysisOracle, LayerEnvelope};
use crate::transport::TransportMode;

/// Outcome of a push run that did not abort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Layers the oracle accepted, base first
    pub pushed: Vec<LayerId>,
    /// Layers the oracle refused to analyze, base first
    pub skipped: Vec<LayerId>,
}

impl PushReport {
    pub fn total(&self) -> usize {
        self.pushed.len() + self.skipped.len()
    }
}

/// Pushes layer chains to the analysis oracle.
pub struct LayerPusher {
    oracle: Arc<dyn AnalysisOracle>,
    mapping: Arc<RegistryMappingStore>,
    mode: TransportMode,
}

impl LayerPusher {
    pub fn new(
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

    /// Push `layers` (index 0 = base) of `image`.
    ///
    /// A layer the oracle cannot analyze is skipped and resets the parent
    /// chain. Any other error aborts the run; mappings recorded for earlier
    /// layers are kept.
    pub async fn push<S: AsRef<str>>(
        &self,
        image: &ImageReference,
        layers: &[S],
    ) -> Result<PushReport> {
        let total = layers.len();
        let mut report = PushReport::default();

        if total == 0 {
            tracing::warn!(image = %image, "There is no layer to push");
            return Ok(report);
        }

        let local = self.mode.is_local();
        let base_url = self.mode.blob_base_url(image.hostname());
        if local {
            tracing::info!(url = %base_url, "Using local blob server");
        }
        let origin = registry_url(image.hostname());

        let mut parent = String::new();
        for (index, digest) in layers.iter().enumerate() {
            let layer = LayerId::normalize(digest.as_ref(), local);
            tracing::info!(
                layer = %layer.short(),
                index = index + 1,
                total,
                "Pushing layer"
            );

            // Must be visible before the oracle can ask for the blob
            self.mapping.insert(&layer, origin.as_str());

            let envelope = LayerEnvelope::submit(
                layer.as_str(),
                self.mode.blob_path(&base_url, &image.repository, &layer),
                parent.as_str(),
            );

            match self.oracle.push_layer(&envelope).await {
                Ok(()) => {
                    parent = layer.to_string();
                    report.pushed.push(layer);
                }
                Err(e) if e.is_unanalyzable() => {
                    tracing::warn!(
                        layer = %layer.short(),
                        index = index + 1,
                        total,
                        error = %e,
                        "Layer skipped, restarting parent chain"
                    );
                    parent.clear();
                    report.skipped.push(layer);
                }
                Err(e) => {
                    tracing::error!(
                        layer = %layer.short(),
                        index = index + 1,
                        total,
                        error = %e,
                        "Adding layer failed"
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            image = %image,
            pushed = report.pushed.len(),
            skipped = report.skipped.len(),
            "Push complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use layerscan_core::error::ScanError;
    use std::sync::Mutex;

    /// Oracle accepting everything except the named layers.
    struct Recording {
        refuse: Vec<&'static str>,
        sent: Mutex<Vec<LayerEnvelope>>,
    }

    impl Recording {
        fn new(refuse: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                refuse,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AnalysisOracle for Recording {
        async fn push_layer(&self, envelope: &LayerEnvelope) -> Result<()> {
            self.sent.lock().unwrap().push(envelope.clone());
            if self.refuse.iter().any(|r| *r == envelope.layer_name()) {
                return Err(ScanError::LayerUnanalyzable {
                    layer: envelope.layer_name().to_string(),
                });
            }
            Ok(())
        }

        async fn fetch_layer(&self, layer: &LayerId) -> Result<LayerEnvelope> {
            Err(ScanError::Other(format!("unexpected fetch of {}", layer)))
        }
    }

    fn image() -> ImageReference {
        ImageReference::parse("localhost:5000/app:1.0").unwrap()
    }

    #[tokio::test]
    async fn test_push_chains_parents() {
        let oracle = Recording::new(vec![]);
        let pusher = LayerPusher::new(
            oracle.clone(),
            Arc::new(RegistryMappingStore::new()),
            TransportMode::default(),
        );

        let report = pusher
            .push(&image(), &["sha256:l0", "sha256:l1"])
            .await
            .unwrap();

        let sent = oracle.sent.lock().unwrap();
        assert_eq!(sent[0].parent_name(), "");
        assert_eq!(sent[1].parent_name(), "sha256:l0");
        assert_eq!(
            sent[1].layer.as_ref().unwrap().path,
            "http://localhost:5000/v2/app/blobs/sha256:l1"
        );
        assert_eq!(sent[1].layer.as_ref().unwrap().format, "Docker");
        assert_eq!(report.pushed.len(), 2);
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_push_local_mode_paths() {
        let oracle = Recording::new(vec![]);
        let mapping = Arc::new(RegistryMappingStore::new());
        let pusher = LayerPusher::new(
            oracle.clone(),
            mapping.clone(),
            TransportMode::Local {
                server: "10.0.0.5:44480".to_string(),
            },
        );

        pusher.push(&image(), &["sha256:abc"]).await.unwrap();

        let sent = oracle.sent.lock().unwrap();
        let layer = sent[0].layer.as_ref().unwrap();
        assert_eq!(layer.name, "abc");
        assert_eq!(
            layer.path,
            "http://10.0.0.5:44480/local/app/blobs/abc/layer.tar"
        );
        assert_eq!(
            mapping.lookup(&LayerId::from("abc")).unwrap(),
            "http://localhost:5000/v2"
        );
    }

    #[tokio::test]
    async fn test_push_refused_layer_resets_chain() {
        let oracle = Recording::new(vec!["sha256:l1"]);
        let pusher = LayerPusher::new(
            oracle.clone(),
            Arc::new(RegistryMappingStore::new()),
            TransportMode::default(),
        );

        let report = pusher
            .push(&image(), &["sha256:l0", "sha256:l1", "sha256:l2", "sha256:l3"])
            .await
            .unwrap();

        let sent = oracle.sent.lock().unwrap();
        assert_eq!(sent[1].parent_name(), "sha256:l0");
        assert_eq!(sent[2].parent_name(), "");
        assert_eq!(sent[3].parent_name(), "sha256:l2");
        assert_eq!(report.skipped, vec![LayerId::from("sha256:l1")]);
        assert_eq!(report.total(), 4);
    }

    #[tokio::test]
    async fn test_push_empty_is_noop() {
        let oracle = Recording::new(vec![]);
        let mapping = Arc::new(RegistryMappingStore::new());
        let pusher = LayerPusher::new(oracle.clone(), mapping.clone(), TransportMode::default());

        let layers: [&str; 0] = [];
        let report = pusher.push(&image(), &layers).await.unwrap();

        assert_eq!(report, PushReport::default());
        assert!(oracle.sent.lock().unwrap().is_empty());
        assert!(mapping.is_empty());
    }
}
