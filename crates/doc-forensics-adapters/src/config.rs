//! Configuration file support for doc-forensics.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/doc-forensics/config.toml` (lowest priority)
//! - Project-local: `.doc-forensics.toml` (searched up directory tree)
//!
//! Every value is optional; anything left unset falls back to the core
//! defaults when the orchestrator and rule engine are built.

use std::path::{Path, PathBuf};

use anyhow::Context;
use doc_forensics_core::{
    AnomalyThresholds, CompressionAnalyzer, CompressionConfig, EdgeAnalyzer, EdgeConfig,
    FontAnalyzer, FontConfig, ForensicsOrchestrator, RiskPolicy, Rule, RuleEngine, RuleSet,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".doc-forensics.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Edge analysis settings.
    pub edge: EdgeSection,
    /// Compression analysis settings.
    pub compression: CompressionSection,
    /// Font analysis settings.
    pub font: FontSection,
    /// Anomaly label thresholds.
    pub anomalies: AnomalySection,
    /// Risk rules.
    pub rules: RulesSection,
}

/// Edge analysis configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeSection {
    /// Gradient magnitude that counts as an edge.
    pub edge_threshold: Option<f64>,
    /// Smallest edge region that is scored.
    pub min_region_pixels: Option<usize>,
    /// Endpoints per thinned edge pixel above which a region is broken.
    pub continuity_threshold: Option<f64>,
    /// Clone detection block size in pixels.
    pub block_size: Option<usize>,
    /// Clone detection block stride in pixels (1 finds copies at any offset).
    pub block_stride: Option<usize>,
    /// Upper bound on compared blocks; the most textured are kept.
    pub max_blocks: Option<usize>,
    /// Correlation at or above which two blocks match (above 0.0, up to 1.0).
    pub similarity_threshold: Option<f64>,
}

/// Compression analysis configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CompressionSection {
    /// AC energy below which a block is treated as flat.
    pub flat_energy: Option<f64>,
    /// Multiple of the baseline local variance that flags a neighbourhood.
    pub variance_multiplier: Option<f64>,
    /// Heterogeneity that maps to a full inconsistency score.
    pub heterogeneity_scale: Option<f64>,
    /// Bins in the first-order AC coefficient histogram; must exceed `max_lag`.
    pub histogram_bins: Option<usize>,
    /// Largest histogram lag searched for periodicity.
    pub max_lag: Option<usize>,
}

/// Font analysis configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FontSection {
    /// Minimum ink/paper contrast before text is looked for.
    pub min_contrast: Option<u8>,
    /// Smallest text region area in pixels.
    pub min_region_area: Option<u32>,
    /// Largest text region as a fraction of the page (above 0.0, up to 1.0).
    pub max_region_fraction: Option<f64>,
    /// Upper bound on measured regions.
    pub max_regions: Option<usize>,
    /// Stroke width variation that counts as inconsistent.
    pub stroke_cv_tolerance: Option<f64>,
    /// Ink density variation that counts as inconsistent.
    pub density_cv_tolerance: Option<f64>,
}

/// Anomaly label configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AnomalySection {
    /// Clone score threshold (0.0-1.0).
    pub clone: Option<f64>,
    /// Continuity score threshold (0.0-1.0).
    pub continuity: Option<f64>,
    /// Edge regions required before continuity is trusted.
    pub min_continuity_regions: Option<usize>,
    /// Artifact strength threshold (0.0-1.0).
    pub artifact: Option<f64>,
    /// Periodicity threshold (0.0-1.0).
    pub pattern: Option<f64>,
    /// Compression inconsistency threshold (0.0-1.0).
    pub inconsistency: Option<f64>,
}

/// Rule engine configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RulesSection {
    /// Risk at or above which manual review is recommended (0.0-1.0).
    pub manual_review_threshold: Option<f64>,
    /// Replacement rule set. The built-in rules apply when unset.
    pub set: Option<Vec<Rule>>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/doc-forensics/config.toml`
    /// 2. Project-local: `.doc-forensics.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    #[must_use]
    pub fn load() -> Self {
        let cwd = std::env::current_dir().ok();
        Self::load_from(xdg_config_path().as_deref(), cwd.as_deref())
    }

    /// Load configuration from an explicit user file and project search root.
    #[must_use]
    pub fn load_from(user_config: Option<&Path>, project_root: Option<&Path>) -> Self {
        let mut config = Self::default();

        if let Some(user_path) = user_config {
            if user_path.exists() {
                info!("Loading XDG config: {}", user_path.display());
                if let Some(user) = load_file(user_path) {
                    config = user;
                }
            } else {
                debug!("XDG config not found: {}", user_path.display());
            }
        }

        if let Some(project_path) = project_root.and_then(find_config_in_parents) {
            info!("Loading project config: {}", project_path.display());
            if let Some(project) = load_file(&project_path) {
                config.merge(project);
            }
        }

        if let Err(e) = config.validate() {
            warn!("{e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending key.
    pub fn validate(&self) -> Result<(), String> {
        let unit_ranges = [
            ("edge.similarity_threshold", self.edge.similarity_threshold),
            ("edge.continuity_threshold", self.edge.continuity_threshold),
            ("font.max_region_fraction", self.font.max_region_fraction),
            ("anomalies.clone", self.anomalies.clone),
            ("anomalies.continuity", self.anomalies.continuity),
            ("anomalies.artifact", self.anomalies.artifact),
            ("anomalies.pattern", self.anomalies.pattern),
            ("anomalies.inconsistency", self.anomalies.inconsistency),
            (
                "rules.manual_review_threshold",
                self.rules.manual_review_threshold,
            ),
        ];
        for (key, value) in unit_ranges {
            if let Some(t) = value {
                if !(0.0..=1.0).contains(&t) {
                    return Err(format!("{key} must be 0.0-1.0, got {t}"));
                }
            }
        }

        if let Some(size) = self.edge.block_size {
            if size < 2 {
                return Err(format!("edge.block_size must be at least 2, got {size}"));
            }
        }
        if self.edge.block_stride == Some(0) {
            return Err("edge.block_stride must be positive".to_string());
        }
        if let Some(lag) = self.compression.max_lag {
            if lag < 2 {
                return Err(format!("compression.max_lag must be at least 2, got {lag}"));
            }
        }
        if self.compression.histogram_bins == Some(0) {
            return Err("compression.histogram_bins must be positive".to_string());
        }
        if let Some(ref rules) = self.rules.set {
            if rules.is_empty() {
                return Err("rules.set must contain at least one rule".to_string());
            }
        }

        // Cross-field constraints live with the analyzers.
        self.edge_config()
            .validate()
            .map_err(|e| format!("edge: {e}"))?;
        self.compression_config()
            .validate()
            .map_err(|e| format!("compression: {e}"))?;
        self.font_config()
            .validate()
            .map_err(|e| format!("font: {e}"))?;

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Edge
        self.edge.edge_threshold = other.edge.edge_threshold.or(self.edge.edge_threshold);
        self.edge.min_region_pixels = other
            .edge
            .min_region_pixels
            .or(self.edge.min_region_pixels);
        self.edge.continuity_threshold = other
            .edge
            .continuity_threshold
            .or(self.edge.continuity_threshold);
        self.edge.block_size = other.edge.block_size.or(self.edge.block_size);
        self.edge.block_stride = other.edge.block_stride.or(self.edge.block_stride);
        self.edge.max_blocks = other.edge.max_blocks.or(self.edge.max_blocks);
        self.edge.similarity_threshold = other
            .edge
            .similarity_threshold
            .or(self.edge.similarity_threshold);

        // Compression
        self.compression.flat_energy = other
            .compression
            .flat_energy
            .or(self.compression.flat_energy);
        self.compression.variance_multiplier = other
            .compression
            .variance_multiplier
            .or(self.compression.variance_multiplier);
        self.compression.heterogeneity_scale = other
            .compression
            .heterogeneity_scale
            .or(self.compression.heterogeneity_scale);
        self.compression.histogram_bins = other
            .compression
            .histogram_bins
            .or(self.compression.histogram_bins);
        self.compression.max_lag = other.compression.max_lag.or(self.compression.max_lag);

        // Font
        self.font.min_contrast = other.font.min_contrast.or(self.font.min_contrast);
        self.font.min_region_area = other.font.min_region_area.or(self.font.min_region_area);
        self.font.max_region_fraction = other
            .font
            .max_region_fraction
            .or(self.font.max_region_fraction);
        self.font.max_regions = other.font.max_regions.or(self.font.max_regions);
        self.font.stroke_cv_tolerance = other
            .font
            .stroke_cv_tolerance
            .or(self.font.stroke_cv_tolerance);
        self.font.density_cv_tolerance = other
            .font
            .density_cv_tolerance
            .or(self.font.density_cv_tolerance);

        // Anomalies
        self.anomalies.clone = other.anomalies.clone.or(self.anomalies.clone);
        self.anomalies.continuity = other.anomalies.continuity.or(self.anomalies.continuity);
        self.anomalies.min_continuity_regions = other
            .anomalies
            .min_continuity_regions
            .or(self.anomalies.min_continuity_regions);
        self.anomalies.artifact = other.anomalies.artifact.or(self.anomalies.artifact);
        self.anomalies.pattern = other.anomalies.pattern.or(self.anomalies.pattern);
        self.anomalies.inconsistency = other
            .anomalies
            .inconsistency
            .or(self.anomalies.inconsistency);

        // Rules
        self.rules.manual_review_threshold = other
            .rules
            .manual_review_threshold
            .or(self.rules.manual_review_threshold);
        self.rules.set = other.rules.set.or_else(|| self.rules.set.take());
    }

    /// Edge settings over the defaults.
    fn edge_config(&self) -> EdgeConfig {
        let e = &self.edge;
        let defaults = EdgeConfig::default();
        EdgeConfig {
            edge_threshold: e.edge_threshold.unwrap_or(defaults.edge_threshold),
            min_region_pixels: e.min_region_pixels.unwrap_or(defaults.min_region_pixels),
            continuity_threshold: e
                .continuity_threshold
                .unwrap_or(defaults.continuity_threshold),
            block_size: e.block_size.unwrap_or(defaults.block_size),
            block_stride: e.block_stride.unwrap_or(defaults.block_stride),
            max_blocks: e.max_blocks.unwrap_or(defaults.max_blocks),
            similarity_threshold: e
                .similarity_threshold
                .unwrap_or(defaults.similarity_threshold),
            ..defaults
        }
    }

    /// Compression settings over the defaults.
    fn compression_config(&self) -> CompressionConfig {
        let c = &self.compression;
        let defaults = CompressionConfig::default();
        CompressionConfig {
            flat_energy: c.flat_energy.unwrap_or(defaults.flat_energy),
            variance_multiplier: c
                .variance_multiplier
                .unwrap_or(defaults.variance_multiplier),
            heterogeneity_scale: c
                .heterogeneity_scale
                .unwrap_or(defaults.heterogeneity_scale),
            histogram_bins: c.histogram_bins.unwrap_or(defaults.histogram_bins),
            max_lag: c.max_lag.unwrap_or(defaults.max_lag),
            ..defaults
        }
    }

    /// Font settings over the defaults.
    fn font_config(&self) -> FontConfig {
        let f = &self.font;
        let defaults = FontConfig::default();
        FontConfig {
            min_contrast: f.min_contrast.unwrap_or(defaults.min_contrast),
            min_region_area: f.min_region_area.unwrap_or(defaults.min_region_area),
            max_region_fraction: f
                .max_region_fraction
                .unwrap_or(defaults.max_region_fraction),
            max_regions: f.max_regions.unwrap_or(defaults.max_regions),
            stroke_cv_tolerance: f
                .stroke_cv_tolerance
                .unwrap_or(defaults.stroke_cv_tolerance),
            density_cv_tolerance: f
                .density_cv_tolerance
                .unwrap_or(defaults.density_cv_tolerance),
            ..defaults
        }
    }

    /// Build an orchestrator from the configured values over the defaults.
    #[must_use]
    pub fn orchestrator(&self) -> ForensicsOrchestrator {
        let a = &self.anomalies;
        let threshold_defaults = AnomalyThresholds::default();
        let thresholds = AnomalyThresholds {
            clone: a.clone.unwrap_or(threshold_defaults.clone),
            continuity: a.continuity.unwrap_or(threshold_defaults.continuity),
            min_continuity_regions: a
                .min_continuity_regions
                .unwrap_or(threshold_defaults.min_continuity_regions),
            artifact: a.artifact.unwrap_or(threshold_defaults.artifact),
            pattern: a.pattern.unwrap_or(threshold_defaults.pattern),
            inconsistency: a.inconsistency.unwrap_or(threshold_defaults.inconsistency),
        };

        ForensicsOrchestrator::new(
            EdgeAnalyzer::new(self.edge_config()),
            CompressionAnalyzer::new(self.compression_config()),
            FontAnalyzer::new(self.font_config()),
            thresholds,
        )
    }

    /// Build a rule engine from the configured rule set and policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured rule set is invalid.
    pub fn rule_engine(&self) -> anyhow::Result<RuleEngine> {
        let rules = self
            .rules
            .set
            .clone()
            .unwrap_or_else(RuleSet::default_rules);
        let rules = RuleSet::new(rules).context("Invalid rules.set")?;

        let policy = RiskPolicy {
            manual_review_threshold: self
                .rules
                .manual_review_threshold
                .unwrap_or(RiskPolicy::default().manual_review_threshold),
        };

        Ok(RuleEngine::new(rules, policy))
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("doc-forensics").join("config.toml"))
}

/// Search for `.doc-forensics.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
