//! Manifest sources.
//!
//! A source turns an image name into its resolved reference and manifest,
//! either by asking the image's registry or by reading a local image export.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use layerscan_core::config::ScanConfig;
use layerscan_core::error::{Result, ScanError};
use reqwest::StatusCode;
use serde::Deserialize;

use super::manifest::{Manifest, SchemaV1Manifest, SCHEMA_V1_MEDIA_TYPE, SCHEMA_V1_SIGNED_MEDIA_TYPE};
use super::reference::ImageReference;
use crate::mapping::registry_url;

/// Registry API host serving `docker.io` images.
const DOCKER_HUB_API_HOST: &str = "registry-1.docker.io";

/// Index file of a `docker save` export.
const EXPORT_INDEX: &str = "manifest.json";

/// Resolves an image name to its reference and manifest.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn retrieve(&self, image: &str) -> Result<(ImageReference, Manifest)>;
}

/// Pick the manifest source for the configured mode.
pub fn select_manifest_source(config: &ScanConfig) -> Result<Box<dyn ManifestSource>> {
    if config.local {
        let dir = config.export_dir.clone().ok_or_else(|| {
            ScanError::Config("local mode requires export_dir (a `docker save` export)".to_string())
        })?;
        Ok(Box::new(ExportManifestSource::new(dir)))
    } else {
        Ok(Box::new(RegistryManifestSource::new()))
    }
}

/// Fetches manifests from the image's registry (anonymous access only).
pub struct RegistryManifestSource {
    http: reqwest::Client,
    /// Overrides the registry API base URL (`{scheme}://{host}/v2`)
    endpoint: Option<String>,
}

impl RegistryManifestSource {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: None,
        }
    }

    /// Send every request to `endpoint` instead of the image's registry.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: Some(endpoint.into().trim_end_matches('/').to_string()),
        }
    }

    fn manifest_url(&self, reference: &ImageReference) -> String {
        let base = match self.endpoint {
            Some(ref endpoint) => endpoint.clone(),
            None if reference.registry == "docker.io" => registry_url(DOCKER_HUB_API_HOST),
            None => registry_url(&reference.registry),
        };
        format!(
            "{}/{}/manifests/{}",
            base,
            reference.repository,
            reference.tag_or_digest()
        )
    }
}

impl Default for RegistryManifestSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManifestSource for RegistryManifestSource {
    async fn retrieve(&self, image: &str) -> Result<(ImageReference, Manifest)> {
        let reference = ImageReference::parse(image)?;
        let url = self.manifest_url(&reference);

        tracing::info!(reference = %reference, url = %url, "Downloading manifest");

        let response = self
            .http
            .get(&url)
            .header(
                "Accept",
                format!("{}, {}", SCHEMA_V1_SIGNED_MEDIA_TYPE, SCHEMA_V1_MEDIA_TYPE),
            )
            .send()
            .await
            .map_err(|e| ScanError::Transport {
                endpoint: url.clone(),
                status: None,
                message: format!("downloading manifest: {}", e),
            })?;

        if response.status() != StatusCode::OK {
            return Err(ScanError::status(url, response.status().as_u16()));
        }

        let body = response.bytes().await.map_err(|e| ScanError::Transport {
            endpoint: url.clone(),
            status: None,
            message: format!("reading manifest: {}", e),
        })?;

        let manifest = Manifest::from_slice(&body)?;
        Ok((reference, manifest))
    }
}

/// One image entry of a `docker save` export index.
#[derive(Debug, Deserialize)]
struct ExportEntry {
    #[serde(rename = "RepoTags", default)]
    repo_tags: Option<Vec<String>>,
    #[serde(rename = "Layers", default)]
    layers: Vec<String>,
}

/// Reads manifests from an extracted `docker save` export.
///
/// The export's layer list is already base first; each layer's directory
/// name becomes its digest.
pub struct ExportManifestSource {
    dir: PathBuf,
}

impl ExportManifestSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load_index(&self) -> Result<Vec<ExportEntry>> {
        let path = self.dir.join(EXPORT_INDEX);
        let data = std::fs::read(&path).map_err(|e| {
            ScanError::Manifest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_slice(&data).map_err(|e| {
            ScanError::Manifest(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

#[async_trait]
impl ManifestSource for ExportManifestSource {
    async fn retrieve(&self, image: &str) -> Result<(ImageReference, Manifest)> {
        let reference = ImageReference::parse(image)?;
        let wanted = reference.repo_tag();
        let entries = self.load_index()?;

        let single = entries.len() == 1;
        let entry = entries
            .into_iter()
            .find(|e| {
                single
                    || e.repo_tags
                        .as_ref()
                        .map_or(false, |tags| tags.iter().any(|t| *t == wanted))
            })
            .ok_or_else(|| {
                ScanError::Manifest(format!(
                    "Image '{}' not found in export {}",
                    wanted,
                    self.dir.display()
                ))
            })?;

        let digests = entry
            .layers
            .iter()
            .map(|path| export_layer_digest(path))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            reference = %reference,
            layers = digests.len(),
            "Loaded manifest from local export"
        );

        let manifest = SchemaV1Manifest::new(
            reference.repository.clone(),
            reference.tag_or_digest().to_string(),
            digests,
        );
        Ok((reference, Manifest::SchemaV1(manifest)))
    }
}

/// Digest of a layer from its path inside the export.
///
/// Handles both `<hex>/layer.tar` and `blobs/sha256/<hex>` layouts.
fn export_layer_digest(path: &str) -> Result<String> {
    if let Some(hex) = path.strip_prefix("blobs/sha256/") {
        return Ok(format!("sha256:{}", hex));
    }
    match Path::new(path).parent().and_then(|p| p.file_name()) {
        Some(dir) => Ok(format!("sha256:{}", dir.to_string_lossy())),
        None => Err(ScanError::Manifest(format!(
            "Unrecognized layer path in export: '{}'",
            path
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_export(dir: &Path, index: serde_json::Value) {
        std::fs::write(dir.join(EXPORT_INDEX), serde_json::to_vec(&index).unwrap()).unwrap();
    }

    #[test]
    fn test_export_layer_digest() {
        assert_eq!(export_layer_digest("abc123/layer.tar").unwrap(), "sha256:abc123");
        assert_eq!(export_layer_digest("blobs/sha256/def456").unwrap(), "sha256:def456");
        assert!(export_layer_digest("layer.tar").is_err());
    }

    #[test]
    fn test_manifest_url() {
        let source = RegistryManifestSource::new();
        let r = ImageReference::parse("localhost:5000/app:1.0").unwrap();
        assert_eq!(source.manifest_url(&r), "http://localhost:5000/v2/app/manifests/1.0");

        let r = ImageReference::parse("alpine").unwrap();
        assert_eq!(
            source.manifest_url(&r),
            "https://registry-1.docker.io/v2/library/alpine/manifests/latest"
        );
    }

    #[tokio::test]
    async fn test_export_source_finds_tagged_image() {
        let tmp = TempDir::new().unwrap();
        write_export(
            tmp.path(),
            json!([
                {"Config": "c1.json", "RepoTags": ["busybox:latest"], "Layers": ["bb/layer.tar"]},
                {"Config": "c2.json", "RepoTags": ["alpine:3.4"], "Layers": ["l0/layer.tar", "l1/layer.tar"]}
            ]),
        );

        let source = ExportManifestSource::new(tmp.path());
        let (reference, manifest) = source.retrieve("alpine:3.4").await.unwrap();

        assert_eq!(reference.repository, "library/alpine");
        let Manifest::SchemaV1(v1) = manifest else {
            panic!("expected schema-v1 manifest");
        };
        assert_eq!(v1.tag, "3.4");
        assert_eq!(v1.layer_digests(), vec!["sha256:l0", "sha256:l1"]);
    }

    #[tokio::test]
    async fn test_export_source_missing_image() {
        let tmp = TempDir::new().unwrap();
        write_export(
            tmp.path(),
            json!([
                {"RepoTags": ["a:1"], "Layers": []},
                {"RepoTags": ["b:1"], "Layers": []}
            ]),
        );

        let err = ExportManifestSource::new(tmp.path())
            .retrieve("c:1")
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Manifest(_)));
    }

    #[tokio::test]
    async fn test_export_source_missing_index() {
        let tmp = TempDir::new().unwrap();
        let err = ExportManifestSource::new(tmp.path())
            .retrieve("alpine")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("manifest.json"));
    }

    #[tokio::test]
    async fn test_registry_source_schema_v1() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/team/app/manifests/1.0");
                then.status(200).json_body(json!({
                    "schemaVersion": 1,
                    "name": "team/app",
                    "tag": "1.0",
                    "fsLayers": [{"blobSum": "sha256:top"}, {"blobSum": "sha256:base"}],
                    "history": [
                        {"v1Compatibility": "{\"id\":\"top\",\"parent\":\"base\"}"},
                        {"v1Compatibility": "{\"id\":\"base\"}"}
                    ]
                }));
            })
            .await;

        let source = RegistryManifestSource::with_endpoint(server.url("/v2"));
        let (reference, manifest) = source.retrieve("localhost:5000/team/app:1.0").await.unwrap();
        mock.assert_async().await;

        assert_eq!(reference.registry, "localhost:5000");
        let Manifest::SchemaV1(v1) = manifest else {
            panic!("expected schema-v1 manifest");
        };
        assert_eq!(v1.layer_digests(), vec!["sha256:base", "sha256:top"]);
    }

    #[tokio::test]
    async fn test_registry_source_schema_v2() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/team/app/manifests/2.0");
                then.status(200).json_body(json!({
                    "schemaVersion": 2,
                    "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
                    "layers": []
                }));
            })
            .await;

        let source = RegistryManifestSource::with_endpoint(server.url("/v2"));
        let (_, manifest) = source.retrieve("localhost:5000/team/app:2.0").await.unwrap();
        assert!(matches!(manifest, Manifest::SchemaV2 { .. }));
    }

    #[tokio::test]
    async fn test_registry_source_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/team/app/manifests/missing");
                then.status(404);
            })
            .await;

        let source = RegistryManifestSource::with_endpoint(server.url("/v2"));
        let err = source
            .retrieve("localhost:5000/team/app:missing")
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), Some(404));
    }

    #[test]
    fn test_select_manifest_source_local_requires_export() {
        let config = ScanConfig {
            local: true,
            ..Default::default()
        };
        assert!(matches!(
            select_manifest_source(&config),
            Err(ScanError::Config(_))
        ));
        assert!(select_manifest_source(&ScanConfig::default()).is_ok());
    }
}
