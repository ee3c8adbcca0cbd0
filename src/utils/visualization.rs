//! Visualization utilities for detection results.
//!
//! Draws detection bounding boxes (and labels, when a font is available) onto
//! a copy of the source image. Only used for human inspection; the records
//! themselves are persisted through the result sink.

use crate::core::errors::{PipelineError, PipelineResult};
use crate::detection::DetectionRecord;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;

const BBOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const LABEL_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Configuration for rendering detections.
#[derive(Debug, Default)]
pub struct VisualizationConfig {
    /// Font used for labels. Without a font, only boxes are drawn.
    pub font: Option<FontVec>,
    /// Label text height in pixels.
    pub label_scale: f32,
}

impl VisualizationConfig {
    /// Creates a configuration that draws boxes only.
    pub fn boxes_only() -> Self {
        Self {
            font: None,
            label_scale: 16.0,
        }
    }

    /// Loads a TTF/OTF font file for label rendering.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `InvalidInput` if it is
    /// not a parseable font.
    pub fn with_font_file(path: &Path) -> PipelineResult<Self> {
        let bytes = std::fs::read(path)?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| {
            PipelineError::invalid_input(format!("invalid font {}: {}", path.display(), e))
        })?;
        Ok(Self {
            font: Some(font),
            label_scale: 16.0,
        })
    }
}

/// Draws detection boxes and labels onto a copy of the image.
///
/// Boxes are clamped to the image bounds; degenerate boxes (after clamping)
/// are skipped rather than drawn.
pub fn draw_detections(
    image: &RgbImage,
    detections: &[DetectionRecord],
    config: &VisualizationConfig,
) -> RgbImage {
    let mut canvas = image.clone();
    let (width, height) = (image.width() as f32, image.height() as f32);

    for det in detections {
        let (x1, y1, x2, y2) = det.bbox;
        let x1 = x1.clamp(0.0, width - 1.0);
        let y1 = y1.clamp(0.0, height - 1.0);
        let x2 = x2.clamp(0.0, width);
        let y2 = y2.clamp(0.0, height);
        if x2 - x1 < 1.0 || y2 - y1 < 1.0 {
            continue;
        }

        let rect = Rect::at(x1 as i32, y1 as i32).of_size((x2 - x1) as u32, (y2 - y1) as u32);
        draw_hollow_rect_mut(&mut canvas, rect, BBOX_COLOR);

        if let Some(font) = &config.font {
            let label = format!("{} {:.2}", det.label, det.confidence);
            let text_y = (y1 - config.label_scale).max(0.0) as i32;
            draw_text_mut(
                &mut canvas,
                LABEL_COLOR,
                x1 as i32,
                text_y,
                PxScale::from(config.label_scale),
                font,
                &label,
            );
        }
    }

    canvas
}
