//! Routes a manifest to the pipeline for its schema variant.

use layerscan_core::error::{Result, ScanError};

use crate::oci::{Manifest, SchemaV1Manifest};

/// Pipeline a manifest is being routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Push,
    Analyze,
}

impl Pipeline {
    /// An unsupported schema ends an analysis run; push callers may recover.
    fn unsupported_is_fatal(&self) -> bool {
        matches!(self, Pipeline::Analyze)
    }
}

/// Select the schema-v1 manifest for `pipeline`, rejecting every other variant.
pub fn route(manifest: &Manifest, pipeline: Pipeline) -> Result<&SchemaV1Manifest> {
    match manifest {
        Manifest::SchemaV1(v1) => Ok(v1),
        Manifest::SchemaV2 { .. } | Manifest::Unknown { .. } => {
            let schema = manifest.schema();
            let fatal = pipeline.unsupported_is_fatal();
            if fatal {
                tracing::error!(schema = %schema, "Schema is not supported yet, aborting analysis");
            } else {
                tracing::warn!(schema = %schema, "Schema is not supported yet");
            }
            Err(ScanError::UnsupportedSchema { schema, fatal })
        }
    }
}
