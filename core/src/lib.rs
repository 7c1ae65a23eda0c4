//! layerscan Core - Foundational Types
//!
//! Error taxonomy and configuration shared by the layerscan engine and CLI.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{LogLevel, OracleConfig, ScanConfig, ServerConfig};
pub use error::{Result, ScanError};

/// layerscan version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
