//! White-balance correction via chrominance neutralization.
//!
//! A systematic color cast shows up as a/b channel means displaced from the
//! neutral point (128 in the 8-bit CIELAB encoding). The correction computes
//! both means in one pass and then shifts every pixel's chrominance toward
//! neutral by an amount proportional to the displacement, scaled by the
//! pixel's own lightness fraction so shadows are corrected less than
//! highlights. This is a global statistics-driven correction, not a per-pixel
//! adaptive one: one pass for the means, one pass for the shift.

use crate::core::errors::{PipelineError, PipelineResult};
use crate::processors::colorspace::{lab_to_rgb, rgb_to_lab};
use image::{DynamicImage, RgbImage};

/// Gain applied to the chrominance shift.
const CAST_GAIN: f32 = 1.1;

/// Applies white-balance correction to an image.
///
/// Grayscale images have no chrominance channels, so they are returned
/// unchanged. Output dimensions and channel count always match the input.
///
/// # Errors
///
/// Returns `InvalidInput` for images that are neither 8-bit grayscale nor
/// 8-bit RGB.
pub fn correct_white_balance(image: &DynamicImage) -> PipelineResult<DynamicImage> {
    let rgb = match image {
        DynamicImage::ImageLuma8(_) => return Ok(image.clone()),
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => {
            return Err(PipelineError::invalid_input(format!(
                "unsupported channel layout {:?}: expected 1-channel gray or 3-channel RGB",
                other.color()
            )));
        }
    };

    let lab: Vec<[u8; 3]> = rgb.pixels().map(|p| rgb_to_lab(p.0)).collect();
    if lab.is_empty() {
        return Ok(image.clone());
    }

    let mut sum_a = 0u64;
    let mut sum_b = 0u64;
    for px in &lab {
        sum_a += u64::from(px[1]);
        sum_b += u64::from(px[2]);
    }
    let n = lab.len() as f32;
    let cast_a = sum_a as f32 / n - 128.0;
    let cast_b = sum_b as f32 / n - 128.0;

    let data: Vec<u8> = lab
        .iter()
        .flat_map(|&[l, a, b]| {
            let lightness = f32::from(l) / 255.0;
            let a = f32::from(a) - cast_a * lightness * CAST_GAIN;
            let b = f32::from(b) - cast_b * lightness * CAST_GAIN;
            lab_to_rgb([
                l,
                a.round().clamp(0.0, 255.0) as u8,
                b.round().clamp(0.0, 255.0) as u8,
            ])
        })
        .collect();

    let out = RgbImage::from_raw(rgb.width(), rgb.height(), data)
        .ok_or_else(|| PipelineError::invalid_input("rgb plane size mismatch"))?;
    Ok(DynamicImage::ImageRgb8(out))
}
