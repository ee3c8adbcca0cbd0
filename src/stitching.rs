//! Panorama stitching collaborator seam.
//!
//! Stitching is delegated entirely to a third-party algorithm. The pipeline
//! only needs a narrow interface: an ordered sequence of images in, one
//! stitched image out, with failures reported verbatim rather than diagnosed.

use crate::core::errors::PipelineResult;
use image::RgbImage;

/// Panorama stitching collaborator.
///
/// Implementations own their algorithm state; the pipeline passes them by
/// reference and never caches results.
pub trait Stitcher {
    /// Stitches an ordered sequence of overlapping images into one image.
    ///
    /// # Errors
    ///
    /// Returns `Stitch` when the collaborator cannot compose the inputs
    /// (insufficient overlap, too few images). The message is surfaced to the
    /// caller unchanged.
    fn stitch(&self, images: &[RgbImage]) -> PipelineResult<RgbImage>;
}
