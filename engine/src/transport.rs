//! Where the analysis service fetches layer blobs from.

use layerscan_core::config::ScanConfig;
use layerscan_core::error::Result;

use crate::layer::LayerId;
use crate::mapping::registry_url;

/// File name of a layer inside a local image export.
pub const LOCAL_BLOB_FILE: &str = "layer.tar";

/// Blob transport used when building layer fetch paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMode {
    /// Blobs come from the origin registry, optionally through a local
    /// proxy (`host:port`) that fronts it.
    Remote { proxy: Option<String> },
    /// Blobs are served from a local image export by the server at `host:port`.
    Local { server: String },
}

impl TransportMode {
    /// Resolve the transport from configuration.
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        if config.local {
            Ok(TransportMode::Local {
                server: config.local_server_address()?,
            })
        } else if config.server.proxy {
            Ok(TransportMode::Remote {
                proxy: Some(config.local_server_address()?),
            })
        } else {
            Ok(TransportMode::Remote { proxy: None })
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, TransportMode::Local { .. })
    }

    /// Base URL that replaces the registry host in blob paths.
    pub fn blob_base_url(&self, registry: &str) -> String {
        match self {
            TransportMode::Local { server } => format!("http://{}/local", server),
            TransportMode::Remote { proxy: Some(proxy) } => format!("http://{}/v2", proxy),
            TransportMode::Remote { proxy: None } => registry_url(registry),
        }
    }

    /// Fetch path of a layer blob under `base_url`.
    pub fn blob_path(&self, base_url: &str, repository: &str, layer: &LayerId) -> String {
        let path = format!("{}/{}/blobs/{}", base_url, repository, layer);
        if self.is_local() {
            format!("{}/{}", path, LOCAL_BLOB_FILE)
        } else {
            path
        }
    }
}

impl Default for TransportMode {
    fn default() -> Self {
        TransportMode::Remote { proxy: None }
    }
}
