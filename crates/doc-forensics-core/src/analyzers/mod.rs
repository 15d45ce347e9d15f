//! The three forensic analyzers.

pub mod compression;
pub mod edge;
pub mod font;

pub use compression::{CompressionAnalyzer, CompressionConfig};
pub use edge::{EdgeAnalyzer, EdgeConfig};
pub use font::{FontAnalyzer, FontConfig};
