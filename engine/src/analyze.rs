//! Analyze pipeline.
//!
//! Queries the oracle top → base and keeps whatever layers it can report on.

use std::sync::Arc;

use crate::analysis::ImageAnalysis;
use crate::layer::LayerId;
use crate::oci::ImageReference;
use crate::oracle::AnalysisOracle;

/// Retrieves per-layer vulnerability reports.
pub struct LayerAnalyzer {
    oracle: Arc<dyn AnalysisOracle>,
    local: bool,
}

impl LayerAnalyzer {
    pub fn new(oracle: Arc<dyn AnalysisOracle>, local: bool) -> Self {
        Self { oracle, local }
    }

    /// Analyze `layers` (index 0 = base) of `image`, most recent layer first.
    ///
    /// A layer whose query fails is logged and left out of the result.
    pub async fn analyze<S: AsRef<str>>(
        &self,
        image: &ImageReference,
        image_name: &str,
        tag: &str,
        layers: &[S],
    ) -> ImageAnalysis {
        let total = layers.len();
        let mut results = Vec::with_capacity(total);

        for (index, digest) in layers.iter().rev().enumerate() {
            let layer = LayerId::normalize(digest.as_ref(), self.local);

            match self.oracle.fetch_layer(&layer).await {
                Ok(envelope) => {
                    tracing::info!(
                        layer = %layer.short(),
                        index = index + 1,
                        total,
                        "Analysing layer"
                    );
                    results.push(envelope);
                }
                Err(e) => {
                    tracing::info!(
                        layer = %layer.short(),
                        index = index + 1,
                        total,
                        error = %e,
                        "Analysing layer failed, skipping"
                    );
                }
            }
        }

        ImageAnalysis::new(image.hostname(), image_name, tag, results)
    }
}
