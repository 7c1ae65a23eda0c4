//! layerscan CLI - push container image layers to a vulnerability scanner
//! and report what it found.

pub mod commands;
pub mod output;
