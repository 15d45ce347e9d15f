//! Error taxonomy for the forensics engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the forensics engine.
#[derive(Debug, Error)]
pub enum ForensicsError {
    /// The image source does not exist or cannot be read.
    #[error("image not found: {}", path.display())]
    ImageNotFound {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bytes do not decode into a raster image, or its dimensions are invalid.
    #[error("invalid image: {0}")]
    ImageFormat(String),

    /// An analyzer failed mid-processing. No partial result is produced.
    #[error("{analyzer} analysis failed")]
    Analysis {
        /// Name of the failing analyzer.
        analyzer: &'static str,
        /// Cause reported by the analyzer.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A rule predicate could not be evaluated. Indicates a defect, not bad input.
    #[error("rule '{rule}' could not be evaluated: {reason}")]
    RuleEvaluation {
        /// Id of the rule.
        rule: String,
        /// What was missing or malformed.
        reason: String,
    },

    /// A rule set failed validation at construction.
    #[error("invalid rule set: {0}")]
    InvalidRuleSet(String),
}

impl ForensicsError {
    /// Wraps an analyzer failure, keeping the full `anyhow` context chain.
    #[must_use]
    pub fn analysis(analyzer: &'static str, cause: anyhow::Error) -> Self {
        Self::Analysis {
            analyzer,
            source: cause.into(),
        }
    }

    /// Returns true for errors caused by the caller's input rather than the engine.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::ImageNotFound { .. } | Self::ImageFormat(_))
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, ForensicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_names_analyzer() {
        let err = ForensicsError::analysis("edge", anyhow::anyhow!("block size is zero"));
        assert_eq!(err.to_string(), "edge analysis failed");

        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("block size is zero"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_errors() {
        let err = ForensicsError::ImageFormat("zero width".into());
        assert!(err.is_client_error());

        let err = ForensicsError::ImageNotFound {
            path: PathBuf::from("missing.png"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "image not found: missing.png");
    }
}
