//! Flattened record handed to the persistence collaborator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ConfidenceFactor, ForensicsResult, RiskAssessment, Violation};

/// One stored assessment: scores as columns, per-aspect analysis as JSON blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    /// Caller-supplied document identifier.
    pub document_id: String,
    /// SHA-256 of the analyzed bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,
    /// Overall forensic score.
    pub forensics_score: f64,
    /// Edge analysis blob.
    pub edge_analysis: serde_json::Value,
    /// Compression analysis blob.
    pub compression_analysis: serde_json::Value,
    /// Font analysis blob.
    pub font_analysis: serde_json::Value,
    /// Anomaly labels.
    pub detected_anomalies: Vec<String>,
    /// Risk score.
    pub risk_score: f64,
    /// Triggered rules with their descriptions and weights.
    pub violations: Vec<Violation>,
    /// Per-subsystem confidence factors.
    pub confidence_factors: BTreeMap<String, ConfidenceFactor>,
    /// Recommended follow-up actions.
    pub recommendations: Vec<String>,
}

impl AssessmentRecord {
    /// Maps analysis values into a record.
    ///
    /// # Errors
    ///
    /// Returns an error if a sub-result fails to serialize.
    pub fn new(
        document_id: impl Into<String>,
        forensics: &ForensicsResult,
        risk: &RiskAssessment,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            document_id: document_id.into(),
            source_digest: forensics.source_digest.clone(),
            forensics_score: forensics.overall_score,
            edge_analysis: serde_json::to_value(&forensics.edge_analysis)?,
            compression_analysis: serde_json::to_value(&forensics.compression_analysis)?,
            font_analysis: serde_json::to_value(&forensics.font_analysis)?,
            detected_anomalies: forensics.detected_anomalies.clone(),
            risk_score: risk.risk_score,
            violations: risk.violations.clone(),
            confidence_factors: risk.confidence_factors.clone(),
            recommendations: risk.recommendations.clone(),
        })
    }
}
