//! Analyzer trait shared by the forensic checks.

use super::RawImage;

/// A forensic check over one decoded document image.
///
/// Implementations hold only immutable configuration, so a single instance
/// can analyze many documents concurrently.
pub trait ForensicAnalyzer: Send + Sync {
    /// Result produced by this analyzer.
    type Output: Send;

    /// Returns the name of this analyzer.
    fn name(&self) -> &'static str;

    /// Analyzes an image.
    ///
    /// # Errors
    ///
    /// Returns an error if analysis fails. The orchestrator aborts the whole
    /// document on the first analyzer error.
    fn analyze(&self, image: &RawImage) -> anyhow::Result<Self::Output>;
}
