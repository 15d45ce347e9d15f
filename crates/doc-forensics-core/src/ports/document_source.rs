//! Document source port for loading documents to assess.

use crate::domain::Document;

/// Port for loading documents from a source.
pub trait DocumentSource: Send + Sync {
    /// Returns an iterator over documents from this source.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if a document fails to load.
    fn documents(&self) -> Box<dyn Iterator<Item = anyhow::Result<Document>> + Send + '_>;

    /// Returns the total number of documents, if known.
    fn count_hint(&self) -> Option<usize>;
}
