//! Pure pixel-level helpers shared by the analyzers.
//!
//! Every function takes an explicit row-major buffer plus its shape and keeps
//! no state, so analyzers can call them from any thread.

pub mod blocks;
pub mod components;
pub mod dct;
pub mod gradient;
pub mod histogram;
pub mod stats;
pub mod stroke;

pub use histogram::Histogram;
