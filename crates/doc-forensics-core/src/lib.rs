//! Document Forensics Core - Domain logic, analyzers and risk rules
//!
//! This crate contains the core domain types, the preprocessor, the edge,
//! compression and font analyzers, the orchestrator that fuses them, and the
//! rule engine that turns forensic scores and extracted fields into a risk
//! assessment.

pub mod analyzers;
pub mod domain;
pub mod error;
pub mod imaging;
pub mod orchestrator;
pub mod pipeline;
pub mod ports;
pub mod preprocess;
pub mod rules;

pub use analyzers::{
    CompressionAnalyzer, CompressionConfig, EdgeAnalyzer, EdgeConfig, FontAnalyzer, FontConfig,
};
pub use domain::{
    anomaly, AssessmentRecord, Document, DocumentImage, ForensicAnalyzer, ForensicsResult,
    ImageInput, OcrResult, RawImage, RiskAssessment,
};
pub use error::{ForensicsError, Result};
pub use orchestrator::{AnomalyThresholds, ForensicsOrchestrator};
pub use pipeline::{BatchSummary, DocumentAssessment, DocumentPipeline};
pub use ports::{DocumentSource, ProgressEvent, ProgressSink, RecordOutput};
pub use preprocess::Preprocessor;
pub use rules::{RiskPolicy, Rule, RuleEngine, RuleKind, RuleSet};
