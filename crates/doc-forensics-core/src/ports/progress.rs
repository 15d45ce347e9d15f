//! Progress reporting port for batch runs.

/// Events emitted while a batch of documents is assessed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Assessment started for a document.
    Started {
        /// Document id.
        document_id: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total documents in batch, if known.
        total: Option<usize>,
    },
    /// Assessment completed for a document.
    Completed {
        /// Document id.
        document_id: String,
        /// Final risk score.
        risk_score: f64,
        /// Whether the risk reached the manual review threshold.
        flagged: bool,
    },
    /// A document was skipped due to an error.
    Skipped {
        /// Document id, or its position when the id is unknown.
        document_id: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All documents have been processed.
    Finished {
        /// Documents assessed successfully.
        processed: usize,
        /// Documents skipped.
        skipped: usize,
        /// Documents flagged for manual review.
        flagged: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
