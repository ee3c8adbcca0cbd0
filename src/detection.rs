//! Object detection collaborator seam.
//!
//! Detection itself is delegated to a pretrained external model; this module
//! only defines the record type its output is normalized into and the trait
//! the pipeline calls through. Keeping the detector behind a caller-owned
//! trait object (rather than a process-wide singleton) keeps unit tests
//! hermetic and resource lifetimes explicit.

use crate::core::errors::{PipelineError, PipelineResult};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// One detected object: label, confidence, and pixel-space bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Class label reported by the model.
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Bounding box corners `(x1, y1, x2, y2)` with `x1 < x2` and `y1 < y2`.
    pub bbox: (f32, f32, f32, f32),
}

impl DetectionRecord {
    /// Creates a validated detection record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the confidence is outside `[0, 1]` or the
    /// box corners are not strictly ordered.
    pub fn new(
        label: impl Into<String>,
        confidence: f32,
        bbox: (f32, f32, f32, f32),
    ) -> PipelineResult<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(PipelineError::invalid_input(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }
        let (x1, y1, x2, y2) = bbox;
        if x1 >= x2 || y1 >= y2 {
            return Err(PipelineError::invalid_input(format!(
                "degenerate bounding box ({}, {}, {}, {})",
                x1, y1, x2, y2
            )));
        }
        Ok(Self {
            label: label.into(),
            confidence,
            bbox,
        })
    }
}

/// Object detection collaborator.
///
/// Implementations wrap an external pretrained model. The pipeline treats the
/// detector as a black box: failures are surfaced verbatim, never diagnosed.
pub trait ObjectDetector {
    /// Runs detection on one image and returns the records found.
    fn detect(&self, image: &RgbImage) -> PipelineResult<Vec<DetectionRecord>>;
}

/// Detections for one image, keyed by the image's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDetections {
    /// Image name (file stem, no extension).
    pub name: String,
    /// Records reported by the detector.
    pub records: Vec<DetectionRecord>,
}
