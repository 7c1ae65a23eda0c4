//! Wire types of the analysis service's layer API.
//!
//! Field names are PascalCase on the wire; empty fields are omitted when
//! sending and defaulted when receiving.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Packaging format of every layer we submit.
pub const LAYER_FORMAT: &str = "Docker";

/// Request/response unit of the layer API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerEnvelope {
    #[serde(rename = "Layer", default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<Layer>,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMessage>,
}

impl LayerEnvelope {
    /// Envelope submitting a layer for analysis.
    pub fn submit(
        name: impl Into<String>,
        path: impl Into<String>,
        parent_name: impl Into<String>,
    ) -> Self {
        Self {
            layer: Some(Layer {
                name: name.into(),
                path: path.into(),
                parent_name: parent_name.into(),
                format: LAYER_FORMAT.to_string(),
                ..Default::default()
            }),
            error: None,
        }
    }

    /// Name of the enclosed layer, or empty.
    pub fn layer_name(&self) -> &str {
        self.layer.as_ref().map(|l| l.name.as_str()).unwrap_or("")
    }

    /// Parent name of the enclosed layer, or empty.
    pub fn parent_name(&self) -> &str {
        self.layer
            .as_ref()
            .map(|l| l.parent_name.as_str())
            .unwrap_or("")
    }

    /// Features of the enclosed layer.
    pub fn features(&self) -> &[Feature] {
        self.layer.as_ref().map(|l| l.features.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Layer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub indexed_by_version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// An installed package found in a layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version_format: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub added_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vulnerability {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub severity: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fixed_by: String,
}

impl Vulnerability {
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.severity)
    }
}

/// Error payload returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Vulnerability severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Defcon1,
    Critical,
    High,
    Medium,
    Low,
    Negligible,
    Unknown,
}

impl Severity {
    /// Parse a severity name; anything unrecognized is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "defcon1" => Severity::Defcon1,
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            "negligible" => Severity::Negligible,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Defcon1 => "Defcon1",
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Negligible => "Negligible",
            Severity::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
