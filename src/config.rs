//! Analysis settings, optionally read from a TOML file.
//!
//! ```toml
//! # rusty-peaks.toml
//! channel = "254"
//! max_samples = 6000
//! min_height = 0.1
//! relative_height = 0.95
//!
//! [tolerances]
//! position = 3.0
//! height = 0.5
//! ```
//!
//! Every key is optional; absent keys keep their defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::table::TableScale;
use crate::analysis::tolerance::ToleranceOverrides;
use crate::analysis::widths::FWHM;
use crate::error::AnalysisError;

/// Settings for one analysis run.  Passed explicitly to every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Intensity channel to analyze.
    pub channel: String,

    /// Truncate every trace to this many samples.
    pub max_samples: usize,

    /// Absolute peak detection threshold; `0.1 * max(signal)` when unset.
    pub min_height: Option<f64>,

    /// Fraction of the prominence at which widths are measured, in (0, 1].
    pub relative_height: f64,

    /// Samples per second for positions.
    pub position_scale: f64,

    /// Samples per second for widths.
    pub width_scale: f64,

    /// Column header prefix, numbered from 1.
    pub peak_label_prefix: String,

    pub tolerances: ToleranceOverrides,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            channel: "254".to_string(),
            max_samples: 6000,
            min_height: None,
            relative_height: FWHM,
            position_scale: 10.0,
            width_scale: 10.0,
            peak_label_prefix: "Peak ".to_string(),
            tolerances: ToleranceOverrides::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range settings before any trace is touched.
    pub fn validate(&self) -> std::result::Result<(), AnalysisError> {
        if !(self.relative_height > 0.0 && self.relative_height <= 1.0) {
            return Err(AnalysisError::parameter(
                "relative_height",
                format!("must lie in (0, 1], got {}", self.relative_height),
            ));
        }
        if self.max_samples == 0 {
            return Err(AnalysisError::parameter("max_samples", "must be at least 1"));
        }
        if let Some(h) = self.min_height {
            if !h.is_finite() {
                return Err(AnalysisError::parameter(
                    "min_height",
                    format!("must be a finite number, got {h}"),
                ));
            }
        }
        for (name, scale) in [
            ("position_scale", self.position_scale),
            ("width_scale", self.width_scale),
        ] {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(AnalysisError::parameter(
                    name,
                    format!("must be a positive number, got {scale}"),
                ));
            }
        }
        for (name, tolerance) in [
            ("tolerances.position", self.tolerances.position),
            ("tolerances.fwhm", self.tolerances.fwhm),
            ("tolerances.height", self.tolerances.height),
        ] {
            if let Some(t) = tolerance {
                if !(t.is_finite() && t >= 0.0) {
                    return Err(AnalysisError::parameter(
                        name,
                        format!("must be a non-negative number, got {t}"),
                    ));
                }
            }
        }
        if self.channel.is_empty() {
            return Err(AnalysisError::parameter("channel", "must not be empty"));
        }
        Ok(())
    }

    pub fn table_scale(&self) -> TableScale {
        TableScale {
            position: self.position_scale,
            width: self.width_scale,
        }
    }

    /// Header of the `i`-th peak column, zero-based.
    pub fn peak_label(&self, i: usize) -> String {
        format!("{}{}", self.peak_label_prefix, i + 1)
    }
}
