//! Image references, manifests and where they come from.

pub mod manifest;
pub mod reference;
mod source;

pub use manifest::{FsLayer, Manifest, SchemaV1Manifest};
pub use reference::ImageReference;
pub use source::{
    select_manifest_source, ExportManifestSource, ManifestSource, RegistryManifestSource,
};
