//! Image manifest model.
//!
//! Only the schema-v1 layout carries a pipeline. Newer layouts are recognized
//! so they can be rejected explicitly instead of falling through.

use layerscan_core::error::{Result, ScanError};
use serde::{Deserialize, Serialize};

/// Media type of a signed schema-v1 manifest.
pub const SCHEMA_V1_SIGNED_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.v1+prettyjws";

/// Media type of an unsigned schema-v1 manifest.
pub const SCHEMA_V1_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v1+json";

/// Default media type reported for schema-v2 manifests without one.
const SCHEMA_V2_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Image manifest, tagged by schema variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    /// Schema version 1 (`fsLayers` blob sums)
    SchemaV1(SchemaV1Manifest),
    /// Schema version 2 or an OCI manifest/index
    SchemaV2 { media_type: String },
    /// Any other schema version
    Unknown { schema_version: u64 },
}

impl Manifest {
    /// Parse a raw manifest document, dispatching on `schemaVersion`.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| ScanError::Manifest(format!("Invalid manifest JSON: {}", e)))?;

        let schema_version = value
            .get("schemaVersion")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| {
                ScanError::Manifest("Manifest has no integer schemaVersion".to_string())
            })?;

        match schema_version {
            1 => {
                let mut manifest: SchemaV1Manifest =
                    serde_json::from_value(value).map_err(|e| {
                        ScanError::Manifest(format!("Invalid schema-v1 manifest: {}", e))
                    })?;
                // Schema-v1 documents list fsLayers newest first
                manifest.fs_layers.reverse();
                Ok(Manifest::SchemaV1(manifest))
            }
            2 => {
                let media_type = value
                    .get("mediaType")
                    .and_then(|v| v.as_str())
                    .unwrap_or(SCHEMA_V2_MEDIA_TYPE)
                    .to_string();
                Ok(Manifest::SchemaV2 { media_type })
            }
            other => Ok(Manifest::Unknown {
                schema_version: other,
            }),
        }
    }

    /// Human-readable schema discriminator, e.g. `schema-v1`.
    pub fn schema(&self) -> String {
        match self {
            Manifest::SchemaV1(_) => "schema-v1".to_string(),
            Manifest::SchemaV2 { .. } => "schema-v2".to_string(),
            Manifest::Unknown { schema_version } => format!("schema-v{}", schema_version),
        }
    }
}

/// Schema-v1 manifest.
///
/// `fs_layers` is held base first, the reverse of the registry document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaV1Manifest {
    #[serde(rename = "schemaVersion", default = "schema_v1")]
    pub schema_version: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(rename = "fsLayers", default)]
    pub fs_layers: Vec<FsLayer>,
}

fn schema_v1() -> u64 {
    1
}

/// A single layer entry of a schema-v1 manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsLayer {
    #[serde(rename = "blobSum")]
    pub blob_sum: String,
}

impl SchemaV1Manifest {
    /// Build a manifest from digests ordered base first.
    pub fn new(
        name: impl Into<String>,
        tag: impl Into<String>,
        digests: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            schema_version: 1,
            name: name.into(),
            tag: tag.into(),
            architecture: String::new(),
            fs_layers: digests
                .into_iter()
                .map(|blob_sum| FsLayer { blob_sum })
                .collect(),
        }
    }

    /// Layer digests in stack order. Index 0 is the base layer.
    pub fn layer_digests(&self) -> Vec<&str> {
        self.fs_layers.iter().map(|l| l.blob_sum.as_str()).collect()
    }

    pub fn layer_count(&self) -> usize {
        self.fs_layers.len()
    }
}
