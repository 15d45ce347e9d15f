//! Progress adapter that reports through the log.

use doc_forensics_core::{ProgressEvent, ProgressSink};
use tracing::{debug, info, warn};

/// Logs batch progress: per-document status and a final summary.
pub struct LogProgress {
    quiet: bool,
}

impl LogProgress {
    /// Creates a progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, only skipped documents are reported
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressSink for LogProgress {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started {
                document_id,
                index,
                total,
            } => {
                if !self.quiet {
                    let total = total.map_or_else(|| "?".to_string(), |t| t.to_string());
                    debug!("[{}/{total}] {document_id}", index + 1);
                }
            }
            ProgressEvent::Completed {
                document_id,
                risk_score,
                flagged,
            } => {
                if self.quiet {
                    return;
                }
                if flagged {
                    info!("{document_id}: risk {risk_score:.2}, flagged for review");
                } else {
                    debug!("{document_id}: risk {risk_score:.2}");
                }
            }
            ProgressEvent::Skipped {
                document_id,
                reason,
            } => {
                warn!("Skipping {document_id}: {reason}");
            }
            ProgressEvent::Finished {
                processed,
                skipped,
                flagged,
            } => {
                if !self.quiet {
                    info!("Assessed {processed} document(s), {flagged} flagged, {skipped} skipped");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex, PoisonError};

    use doc_forensics_core::{Document, DocumentPipeline};
    use doc_forensics_test_support::{MockDocumentSource, MockRecordOutput};

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_handles_every_event() {
        for quiet in [false, true] {
            let progress = LogProgress::new(quiet);
            progress.on_event(ProgressEvent::Started {
                document_id: "check-001".into(),
                index: 0,
                total: None,
            });
            progress.on_event(ProgressEvent::Completed {
                document_id: "check-001".into(),
                risk_score: 0.7,
                flagged: true,
            });
            progress.on_event(ProgressEvent::Skipped {
                document_id: "document 1".into(),
                reason: "unreadable".into(),
            });
            progress.on_event(ProgressEvent::Finished {
                processed: 1,
                skipped: 1,
                flagged: 1,
            });
        }
    }

    #[test]
    fn test_skipped_document_warned_once() {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let source = MockDocumentSource::new(vec![Document::from_bytes(
            "check-002",
            b"not an image".to_vec(),
        )]);

        tracing::subscriber::with_default(subscriber, || {
            DocumentPipeline::default()
                .run(&source, &MockRecordOutput::new(), &LogProgress::new(true))
                .expect("batch completes");
        });

        let logs = buffer.contents();
        assert_eq!(logs.matches("Skipping check-002").count(), 1, "{logs}");
    }
}
