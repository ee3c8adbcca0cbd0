//! Configuration value types for enhancement and remote job submission.
//!
//! This module contains the immutable configuration values consumed by the
//! enhancement engine and the remote job client. Both are plain serde-derive
//! value types with explicit validation, so a bad configuration is rejected
//! once at the boundary instead of deep inside a pixel loop.

use crate::core::errors::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Contrast correction method applied by the enhancement engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContrastMethod {
    /// No contrast correction.
    None,
    /// Global histogram equalization (on the luma channel for color images).
    HistEq,
    /// Contrast-limited adaptive histogram equalization (on the lightness
    /// channel for color images).
    #[default]
    Clahe,
}

impl FromStr for ContrastMethod {
    type Err = std::convert::Infallible;

    /// Parses a contrast method name.
    ///
    /// Unknown names are mapped to [`ContrastMethod::None`] with a warning
    /// rather than rejected: the contrast stage treats an unrecognized method
    /// as a no-op, and callers wanting strictness should validate upstream.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "hist_eq" => Self::HistEq,
            "clahe" => Self::Clahe,
            "none" => Self::None,
            other => {
                warn!(
                    method = other,
                    "unknown contrast method, skipping contrast stage"
                );
                Self::None
            }
        })
    }
}

/// Configuration for enhancing a single image.
///
/// `clip_limit` and `tile_grid` are only meaningful for
/// [`ContrastMethod::Clahe`]; they are validated regardless so a typo does not
/// silently survive until the method is switched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancementConfig {
    /// Contrast correction method.
    pub contrast_method: ContrastMethod,
    /// Whether to apply white-balance correction after the contrast stage.
    pub white_balance: bool,
    /// CLAHE contrast amplification cap (multiple of the uniform bin count).
    pub clip_limit: f32,
    /// CLAHE tile grid as (rows, cols).
    pub tile_grid: (u32, u32),
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            contrast_method: ContrastMethod::Clahe,
            white_balance: true,
            clip_limit: 3.0,
            tile_grid: (8, 8),
        }
    }
}

impl EnhancementConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// * `clip_limit` is not a positive finite number
    /// * either tile grid dimension is zero
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.clip_limit.is_finite() || self.clip_limit <= 0.0 {
            return Err(PipelineError::config_error_with_context(
                "clip_limit",
                &self.clip_limit.to_string(),
                "must be a positive finite number",
            ));
        }

        let (rows, cols) = self.tile_grid;
        if rows == 0 || cols == 0 {
            return Err(PipelineError::config_error_with_context(
                "tile_grid",
                &format!("({}, {})", rows, cols),
                "both grid dimensions must be at least 1",
            ));
        }

        Ok(())
    }

    /// Returns true when the configuration changes nothing on any input.
    pub fn is_identity(&self) -> bool {
        self.contrast_method == ContrastMethod::None && !self.white_balance
    }
}

/// Options sent to the remote processing node at job submission time.
///
/// Each field maps to a node-side option by its wire name; all toggles only
/// change remote-side behavior and are opaque to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Ground sample distance of the produced orthophoto, in meters/pixel.
    #[serde(rename = "orthophoto-resolution")]
    pub orthophoto_resolution: f64,
    /// Generate a digital surface model.
    pub dsm: bool,
    /// Skip textured 3D model generation.
    #[serde(rename = "skip-3dmodel")]
    pub skip_3dmodel: bool,
    /// Skip report generation.
    #[serde(rename = "skip-report")]
    pub skip_report: bool,
    /// Fast orthophoto mode (skips the full reconstruction).
    #[serde(rename = "fast-orthophoto")]
    pub fast_orthophoto: bool,
    /// Automatic boundary detection.
    #[serde(rename = "auto-boundary")]
    pub auto_boundary: bool,
    /// Trade processing time for lower disk usage on the node.
    #[serde(rename = "optimize-disk-space")]
    pub optimize_disk_space: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            orthophoto_resolution: 0.1,
            dsm: true,
            skip_3dmodel: true,
            skip_report: true,
            fast_orthophoto: true,
            auto_boundary: true,
            optimize_disk_space: true,
        }
    }
}

impl SubmitOptions {
    /// Creates options with the given orthophoto resolution and default toggles.
    pub fn with_resolution(orthophoto_resolution: f64) -> Self {
        Self {
            orthophoto_resolution,
            ..Self::default()
        }
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the orthophoto resolution is not positive.
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.orthophoto_resolution.is_finite() || self.orthophoto_resolution <= 0.0 {
            return Err(PipelineError::config_error_with_context(
                "orthophoto-resolution",
                &self.orthophoto_resolution.to_string(),
                "must be a positive finite number",
            ));
        }
        Ok(())
    }

    /// Serializes the options into the `[{"name": ..., "value": ...}]` form
    /// expected by the node's task creation endpoint.
    pub fn to_wire(&self) -> serde_json::Value {
        let map = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            // Struct serialization to a non-object cannot happen for this type.
            _ => serde_json::Map::new(),
        };

        serde_json::Value::Array(
            map.into_iter()
                .map(|(name, value)| serde_json::json!({ "name": name, "value": value }))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_method_parsing() {
        assert_eq!("hist_eq".parse::<ContrastMethod>(), Ok(ContrastMethod::HistEq));
        assert_eq!("clahe".parse::<ContrastMethod>(), Ok(ContrastMethod::Clahe));
        assert_eq!("none".parse::<ContrastMethod>(), Ok(ContrastMethod::None));
    }

    #[test]
    fn test_unknown_contrast_method_is_noop() {
        // Typos degrade to a skipped contrast stage, not an error.
        assert_eq!("histeq".parse::<ContrastMethod>(), Ok(ContrastMethod::None));
        assert_eq!("CLAHE".parse::<ContrastMethod>(), Ok(ContrastMethod::None));
    }

    #[test]
    fn test_enhancement_config_validation() {
        let config = EnhancementConfig::default();
        assert!(config.validate().is_ok());

        let bad_clip = EnhancementConfig {
            clip_limit: 0.0,
            ..EnhancementConfig::default()
        };
        assert!(bad_clip.validate().is_err());

        let bad_grid = EnhancementConfig {
            tile_grid: (0, 8),
            ..EnhancementConfig::default()
        };
        assert!(bad_grid.validate().is_err());
    }

    #[test]
    fn test_identity_config() {
        let identity = EnhancementConfig {
            contrast_method: ContrastMethod::None,
            white_balance: false,
            ..EnhancementConfig::default()
        };
        assert!(identity.is_identity());
        assert!(!EnhancementConfig::default().is_identity());
    }

    #[test]
    fn test_submit_options_wire_names() {
        let options = SubmitOptions::with_resolution(0.05);
        let wire = options.to_wire();
        let entries = wire.as_array().expect("wire form is an array");

        let names: Vec<&str> = entries
            .iter()
            .map(|e| e["name"].as_str().expect("option name is a string"))
            .collect();

        for expected in [
            "orthophoto-resolution",
            "dsm",
            "skip-3dmodel",
            "skip-report",
            "fast-orthophoto",
            "auto-boundary",
            "optimize-disk-space",
        ] {
            assert!(names.contains(&expected), "missing option {}", expected);
        }

        let resolution = entries
            .iter()
            .find(|e| e["name"] == "orthophoto-resolution")
            .expect("resolution option present");
        assert_eq!(resolution["value"], serde_json::json!(0.05));
    }

    #[test]
    fn test_submit_options_validation() {
        assert!(SubmitOptions::default().validate().is_ok());
        assert!(SubmitOptions::with_resolution(-0.1).validate().is_err());
    }
}
