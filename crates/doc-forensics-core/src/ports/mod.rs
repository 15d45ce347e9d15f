//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod document_source;
mod progress;
mod record_output;

pub use document_source::DocumentSource;
pub use progress::{ProgressEvent, ProgressSink};
pub use record_output::RecordOutput;
