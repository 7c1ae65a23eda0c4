//! Layerscan engine - layer-chain push and analysis against a Clair-style oracle.
//!
//! A pushed image becomes an ordered chain of layers, each submitted with a
//! reference to its parent so the oracle can attribute findings to the layer
//! that introduced them. Analysis walks the same chain from the top down.

pub mod analysis;
pub mod analyze;
pub mod dispatch;
pub mod layer;
pub mod mapping;
pub mod oci;
pub mod oracle;
pub mod push;
pub mod session;
pub mod transport;

// Re-export common types
pub use analysis::ImageAnalysis;
pub use analyze::LayerAnalyzer;
pub use dispatch::{route, Pipeline};
pub use layer::LayerId;
pub use mapping::{registry_url, RegistryMappingStore};
pub use oci::{
    select_manifest_source, ExportManifestSource, ImageReference, Manifest, ManifestSource,
    RegistryManifestSource, SchemaV1Manifest,
};
pub use oracle::{AnalysisOracle, ClairClient, LayerEnvelope, Severity};
pub use push::{LayerPusher, PushReport};
pub use session::ScanSession;
pub use transport::TransportMode;

/// Layerscan engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
