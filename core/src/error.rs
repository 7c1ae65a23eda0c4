use thiserror::Error;

/// layerscan error types
#[derive(Error, Debug)]
pub enum ScanError {
    /// Manifest schema variant has no pipeline.
    ///
    /// `fatal` is set when the analyze path raised it: analysis must not
    /// continue past an unsupported schema, while push callers may recover.
    #[error("Unsupported manifest schema: {schema}")]
    UnsupportedSchema { schema: String, fatal: bool },

    /// The analysis oracle rejected a layer (HTTP 422)
    #[error("Layer cannot be analyzed: {layer}")]
    LayerUnanalyzable { layer: String },

    /// Connection failure or unexpected HTTP status
    #[error("Transport error: {endpoint} - {message}")]
    Transport {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// Response body could not be decoded
    #[error("Decode error: {endpoint} - {message}")]
    Decode { endpoint: String, message: String },

    /// No registry mapping recorded for a layer
    #[error("Registry mapping not found: {layer}")]
    MappingNotFound { layer: String },

    /// Image reference could not be parsed
    #[error("Image reference error: {0}")]
    ImageReference(String),

    /// Manifest could not be retrieved or parsed
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ScanError {
    /// Build a transport error for an unexpected HTTP status.
    pub fn status(endpoint: impl Into<String>, status: u16) -> Self {
        ScanError::Transport {
            endpoint: endpoint.into(),
            status: Some(status),
            message: format!("receiving http error: {}", status),
        }
    }

    /// Whether the oracle explicitly refused to analyze the layer.
    pub fn is_unanalyzable(&self) -> bool {
        matches!(self, ScanError::LayerUnanalyzable { .. })
    }

    /// Whether the error must terminate the current run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::UnsupportedSchema { fatal: true, .. })
    }

    /// Whether a caller can reasonably continue after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ScanError::UnsupportedSchema { fatal, .. } => !fatal,
            ScanError::LayerUnanalyzable { .. } | ScanError::MappingNotFound { .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by a transport error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ScanError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ScanError {
    fn from(err: serde_yaml::Error) -> Self {
        ScanError::Serialization(err.to_string())
    }
}

/// Result type alias for layerscan operations
pub type Result<T> = std::result::Result<T, ScanError>;
