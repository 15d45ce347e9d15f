//! End-to-end assessment of single documents and batches.

use serde::Serialize;
use tracing::info;

use crate::domain::{AssessmentRecord, Document, ForensicsResult, RiskAssessment};
use crate::error::Result;
use crate::orchestrator::ForensicsOrchestrator;
use crate::ports::{DocumentSource, ProgressEvent, ProgressSink, RecordOutput};
use crate::rules::RuleEngine;

/// Forensics and risk for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentAssessment {
    /// Image forensics.
    pub forensics: ForensicsResult,
    /// Fused risk.
    pub risk: RiskAssessment,
}

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Documents assessed and written.
    pub processed: usize,
    /// Documents that failed to load, analyze or write.
    pub skipped: usize,
    /// Documents at or above the manual review threshold.
    pub flagged: usize,
}

/// Runs forensics then rules for each document.
#[derive(Default)]
pub struct DocumentPipeline {
    orchestrator: ForensicsOrchestrator,
    engine: RuleEngine,
}

impl DocumentPipeline {
    /// Creates a pipeline.
    #[must_use]
    pub const fn new(orchestrator: ForensicsOrchestrator, engine: RuleEngine) -> Self {
        Self {
            orchestrator,
            engine,
        }
    }

    /// Assesses one document.
    ///
    /// # Errors
    ///
    /// Returns the first image, analysis or rule evaluation error.
    pub fn assess(&self, document: &Document) -> Result<DocumentAssessment> {
        let forensics = self.orchestrator.analyze_image(document.image_input())?;
        let risk = self.engine.evaluate(Some(&forensics), document.ocr.as_ref())?;
        Ok(DocumentAssessment { forensics, risk })
    }

    /// Assesses every document from `source`, writing one record each.
    ///
    /// A document that fails is reported as skipped and the batch continues.
    /// Output is flushed once at the end.
    ///
    /// # Errors
    ///
    /// Returns an error only if the final flush fails.
    pub fn run(
        &self,
        source: &dyn DocumentSource,
        output: &dyn RecordOutput,
        progress: &dyn ProgressSink,
    ) -> anyhow::Result<BatchSummary> {
        let total = source.count_hint();
        let mut summary = BatchSummary::default();
        info!("Assessing {} documents", total.map_or_else(|| "?".into(), |t| t.to_string()));

        for (index, loaded) in source.documents().enumerate() {
            let document = match loaded {
                Ok(document) => document,
                Err(e) => {
                    progress.on_event(ProgressEvent::Skipped {
                        document_id: format!("document {index}"),
                        reason: format!("{e:#}"),
                    });
                    summary.skipped += 1;
                    continue;
                }
            };

            progress.on_event(ProgressEvent::Started {
                document_id: document.id.clone(),
                index,
                total,
            });

            match self.assess_and_write(&document, output) {
                Ok(risk_score) => {
                    let flagged = risk_score >= self.engine.policy().manual_review_threshold;
                    summary.processed += 1;
                    if flagged {
                        summary.flagged += 1;
                    }
                    progress.on_event(ProgressEvent::Completed {
                        document_id: document.id,
                        risk_score,
                        flagged,
                    });
                }
                Err(e) => {
                    progress.on_event(ProgressEvent::Skipped {
                        document_id: document.id,
                        reason: format!("{e:#}"),
                    });
                    summary.skipped += 1;
                }
            }
        }

        output.flush()?;
        progress.on_event(ProgressEvent::Finished {
            processed: summary.processed,
            skipped: summary.skipped,
            flagged: summary.flagged,
        });
        Ok(summary)
    }

    fn assess_and_write(
        &self,
        document: &Document,
        output: &dyn RecordOutput,
    ) -> anyhow::Result<f64> {
        let assessment = self.assess(document)?;
        let record = AssessmentRecord::new(&document.id, &assessment.forensics, &assessment.risk)?;
        output.write(&record)?;
        Ok(assessment.risk.risk_score)
    }
}
