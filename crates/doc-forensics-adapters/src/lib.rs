//! Document Forensics Adapters - External adapters for doc-forensics.
//!
//! This crate provides adapters for:
//! - Filesystem document source with extraction sidecars
//! - Layered TOML configuration
//! - JSON Lines record output
//! - Log-based progress reporting
//! - Logging setup

pub mod config;
pub mod fs;
pub mod logging;
pub mod output;
pub mod progress;

pub use config::AppConfig;
pub use fs::{sidecar_path, FsDocumentSource};
pub use output::JsonOutput;
pub use progress::LogProgress;
