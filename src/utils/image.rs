//! Image loading utilities.
//!
//! This module enumerates image files in a directory, loads them, and applies
//! the batch downscale factor. File enumeration follows directory order,
//! which is implementation-defined and not guaranteed sorted; callers that
//! need a deterministic sequence must sort the returned paths themselves.

use crate::core::errors::{PipelineError, PipelineResult};
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions recognized when enumerating image files.
const ENUMERABLE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "gif"];

/// Extensions the batch loader will attempt to decode.
const LOADABLE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|known| *known == e)
        })
        .unwrap_or(false)
}

fn validate_scale(scale: f32) -> PipelineResult<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PipelineError::config_error_with_context(
            "scale_factor",
            &scale.to_string(),
            "must be a positive finite number",
        ));
    }
    Ok(())
}

/// Lists the image files directly inside a directory (non-recursive).
///
/// Extension matching is case-insensitive. The result follows directory
/// enumeration order.
///
/// # Errors
///
/// Returns an `Io` error if the directory cannot be read.
pub fn image_files(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, &ENUMERABLE_EXTENSIONS) {
            debug!(path = %path.display(), "identified image file");
            files.push(path);
        }
    }
    Ok(files)
}

/// Loads a single image and downscales it by `1 / scale` on both axes.
///
/// Target dimensions are rounded down, with a floor of one pixel. A scale of
/// 1.0 skips the resize entirely. Grayscale images stay single-channel; every
/// other decoded format is converted to 8-bit RGB.
///
/// # Arguments
///
/// * `path` - Path of the image file to load.
/// * `scale` - Downscale factor (2.0 halves both dimensions). Must be positive.
///
/// # Errors
///
/// Returns `ImageLoad` if the file cannot be decoded and a `ConfigError` for
/// a non-positive scale. Single-file loading is fail-fast: decode failures
/// are reported, never silently substituted.
pub fn load_image(path: &Path, scale: f32) -> PipelineResult<DynamicImage> {
    validate_scale(scale)?;

    let decoded = image::open(path).map_err(PipelineError::ImageLoad)?;
    let img = match decoded {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => decoded,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    if scale == 1.0 {
        return Ok(img);
    }

    let new_width = ((img.width() as f32 / scale) as u32).max(1);
    let new_height = ((img.height() as f32 / scale) as u32).max(1);
    Ok(img.resize_exact(new_width, new_height, FilterType::Triangle))
}

/// Loads every decodable image directly inside a directory.
///
/// Files that exist but fail to decode are skipped with a warning; the batch
/// proceeds with the remaining images. Results follow directory enumeration
/// order and pair each image with its source path.
///
/// # Arguments
///
/// * `dir` - Directory to load from (non-recursive).
/// * `scale` - Downscale factor applied to every image.
///
/// # Errors
///
/// Returns an `Io` error if the directory cannot be read and a `ConfigError`
/// for a non-positive scale. Per-file decode failures are not errors.
pub fn load_images(dir: &Path, scale: f32) -> PipelineResult<Vec<(PathBuf, DynamicImage)>> {
    validate_scale(scale)?;

    let mut images = Vec::new();
    for path in image_files(dir)? {
        if !has_extension(&path, &LOADABLE_EXTENSIONS) {
            continue;
        }
        match load_image(&path, scale) {
            Ok(img) => {
                debug!(path = %path.display(), width = img.width(), height = img.height(), "loaded image");
                images.push((path, img));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unable to load image, skipping");
            }
        }
    }
    Ok(images)
}
