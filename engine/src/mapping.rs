//! Layer → origin registry mapping.
//!
//! Pushing a layer records which registry it came from so the blob can be
//! fetched from there later. Entries live for the lifetime of the store and
//! are never evicted. Concurrent pushes of the same digest from different
//! registries resolve last-writer-wins.

use dashmap::DashMap;
use layerscan_core::error::{Result, ScanError};

use crate::layer::LayerId;

/// Registry base URL for a host.
///
/// Best-effort scheme selection: hosts containing `docker` are assumed to be
/// managed registries served over TLS, everything else is assumed plain HTTP.
/// This is a string heuristic, not a capability check.
pub fn registry_url(host: &str) -> String {
    if host.contains("docker") {
        format!("https://{}/v2", host)
    } else {
        format!("http://{}/v2", host)
    }
}

/// Concurrent mapping from layer identifier to origin registry URL.
#[derive(Debug, Default)]
pub struct RegistryMappingStore {
    entries: DashMap<String, String>,
}

impl RegistryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the origin registry URL for a layer. Overwrites any previous entry.
    pub fn insert(&self, layer: &LayerId, origin_url: impl Into<String>) {
        let origin_url = origin_url.into();
        tracing::debug!(layer = %layer, registry = %origin_url, "Saving registry mapping");
        self.entries.insert(layer.as_str().to_string(), origin_url);
    }

    /// Origin registry URL for a layer.
    pub fn lookup(&self, layer: &LayerId) -> Result<String> {
        self.entries
            .get(layer.as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ScanError::MappingNotFound {
                layer: layer.to_string(),
            })
    }

    /// Resolve where a layer's blob can be fetched from its origin registry.
    pub fn blob_url(&self, repository: &str, layer: &LayerId) -> Result<String> {
        let registry = self.lookup(layer)?;
        Ok(format!("{}/{}/blobs/{}", registry, repository, layer))
    }

    pub fn contains(&self, layer: &LayerId) -> bool {
        self.entries.contains_key(layer.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_registry_url_managed_host() {
        assert_eq!(
            registry_url("registry-1.docker.io"),
            "https://registry-1.docker.io/v2"
        );
        assert_eq!(registry_url("docker.io"), "https://docker.io/v2");
    }

    #[test]
    fn test_registry_url_plain_host() {
        assert_eq!(registry_url("localhost:5000"), "http://localhost:5000/v2");
        assert_eq!(registry_url("quay.io"), "http://quay.io/v2");
    }

    #[test]
    fn test_lookup_missing() {
        let store = RegistryMappingStore::new();
        let err = store.lookup(&LayerId::from("sha256:abc")).unwrap_err();
        assert!(matches!(err, ScanError::MappingNotFound { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_insert_then_lookup() {
        let store = RegistryMappingStore::new();
        let layer = LayerId::from("sha256:abc");
        store.insert(&layer, registry_url("docker.io"));
        assert_eq!(store.lookup(&layer).unwrap(), "https://docker.io/v2");
        assert!(store.contains(&layer));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let store = RegistryMappingStore::new();
        let layer = LayerId::from("sha256:abc");
        store.insert(&layer, "http://first/v2");
        store.insert(&layer, "http://second/v2");
        assert_eq!(store.lookup(&layer).unwrap(), "http://second/v2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookup_is_exact_key() {
        let store = RegistryMappingStore::new();
        store.insert(&LayerId::from("sha256:abcdef123456789"), "http://r/v2");
        assert!(store.lookup(&LayerId::from("sha256:abcde")).is_err());
    }

    #[test]
    fn test_blob_url() {
        let store = RegistryMappingStore::new();
        let layer = LayerId::from("sha256:abc");
        store.insert(&layer, "http://localhost:5000/v2");
        assert_eq!(
            store.blob_url("team/app", &layer).unwrap(),
            "http://localhost:5000/v2/team/app/blobs/sha256:abc"
        );
    }

    #[test]
    fn test_blob_url_missing() {
        let store = RegistryMappingStore::new();
        assert!(store.blob_url("team/app", &LayerId::from("x")).is_err());
    }

    #[test]
    fn test_concurrent_inserts() {
        let store = Arc::new(RegistryMappingStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let layer = LayerId::from(format!("sha256:{}-{}", i, j).as_str());
                        store.insert(&layer, format!("http://registry-{}/v2", i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 800);
        assert_eq!(
            store.lookup(&LayerId::from("sha256:3-42")).unwrap(),
            "http://registry-3/v2"
        );
    }
}
