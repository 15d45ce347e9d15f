//! Test support utilities for doc-forensics.
//!
//! Provides mocks, synthetic document builders, and evidence builders for
//! testing the forensics pipeline and rule engine.
//!
//! # Example
//!
//! ```
//! use doc_forensics_test_support::{MockDocumentSource, OcrBuilder, SyntheticDocumentBuilder};
//!
//! // Create a synthetic check with consistent handwriting
//! let page = SyntheticDocumentBuilder::glyph_row(&[3, 3, 3, 3]);
//! let document = SyntheticDocumentBuilder::document("check-001", &page)
//!     .unwrap()
//!     .with_ocr(OcrBuilder::clean_check());
//!
//! // Create mock document source
//! let source = MockDocumentSource::new(vec![document]);
//! ```

mod builders;
mod mocks;

pub use builders::{ForensicsResultBuilder, OcrBuilder, SyntheticDocumentBuilder};
pub use mocks::{MockDocumentSource, MockProgressSink, MockRecordOutput};
