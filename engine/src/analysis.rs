//! Aggregated analysis of an image.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::oracle::{LayerEnvelope, Severity, Vulnerability};

/// Per-layer analysis results of one image, most recent layer first.
///
/// Layers that could not be analyzed are absent; there are no placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub registry: String,
    pub image_name: String,
    pub tag: String,
    pub layers: Vec<LayerEnvelope>,
    pub analyzed_at: DateTime<Utc>,
}

impl ImageAnalysis {
    pub fn new(
        registry: &str,
        image_name: impl Into<String>,
        tag: impl Into<String>,
        layers: Vec<LayerEnvelope>,
    ) -> Self {
        Self {
            registry: display_registry(registry).to_string(),
            image_name: image_name.into(),
            tag: tag.into(),
            layers,
            analyzed_at: Utc::now(),
        }
    }

    /// Features reported across all analyzed layers.
    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(|l| l.features().len()).sum()
    }

    /// Distinct vulnerabilities (by name) across all layers, in first-seen order.
    pub fn vulnerabilities(&self) -> Vec<&Vulnerability> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for layer in &self.layers {
            for feature in layer.features() {
                for vuln in &feature.vulnerabilities {
                    if seen.insert(vuln.name.as_str()) {
                        found.push(vuln);
                    }
                }
            }
        }
        found
    }

    /// Count of distinct vulnerabilities per severity, most severe first.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for vuln in self.vulnerabilities() {
            *counts.entry(vuln.severity()).or_insert(0) += 1;
        }
        counts
    }

    /// Most severe vulnerability found, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.severity_counts().keys().next().copied()
    }
}

/// Strip a scheme prefix and `/v2` suffix from a registry URL.
pub fn display_registry(registry: &str) -> &str {
    let registry = registry
        .strip_prefix("http://")
        .or_else(|| registry.strip_prefix("https://"))
        .unwrap_or(registry);
    registry.strip_suffix("/v2").unwrap_or(registry)
}
