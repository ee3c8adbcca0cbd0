//! Contrast correction: global histogram equalization and CLAHE.
//!
//! Both corrections operate on a single 8-bit plane. For grayscale images the
//! plane is the image itself; for color images the plane is the luma channel
//! (YUV) for global equalization or the lightness channel (CIELAB) for CLAHE,
//! so chrominance is never remapped.
//!
//! Equalization is deliberately not idempotent: re-equalizing an already
//! equalized image redistributes rounding mass and generally produces a
//! different result. Callers should not rely on `eq(eq(x)) == eq(x)`.

use crate::core::errors::{PipelineError, PipelineResult};
use crate::processors::colorspace::{lab_to_rgb, rgb_to_lab, rgb_to_yuv, yuv_to_rgb};
use image::{DynamicImage, GrayImage, RgbImage};

/// Builds the CDF remap table for a 256-bin histogram.
///
/// Uses the standard `(cdf - cdf_min) / (n - cdf_min)` scaling so the lowest
/// occupied bin maps to 0 and the highest to 255. A constant plane
/// (`n == cdf_min`) yields the identity table instead of collapsing to a
/// single level.
fn equalization_lut(hist: &[u32; 256], total: u32) -> [u8; 256] {
    let mut lut = [0u8; 256];

    let cdf_min = hist.iter().copied().find(|&c| c > 0).unwrap_or(0);
    if total == 0 || total == cdf_min {
        for (v, out) in lut.iter_mut().enumerate() {
            *out = v as u8;
        }
        return lut;
    }

    let scale = 255.0 / (total - cdf_min) as f64;
    let mut cdf = 0u32;
    for (v, &count) in hist.iter().enumerate() {
        cdf += count;
        lut[v] = ((cdf.saturating_sub(cdf_min)) as f64 * scale).round() as u8;
    }
    lut
}

fn plane_histogram(plane: &[u8]) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &v in plane {
        hist[v as usize] += 1;
    }
    hist
}

/// Equalizes a single 8-bit plane in place.
fn equalize_plane(plane: &mut [u8]) {
    let hist = plane_histogram(plane);
    let lut = equalization_lut(&hist, plane.len() as u32);
    for v in plane.iter_mut() {
        *v = lut[*v as usize];
    }
}

/// Applies global histogram equalization to an image.
///
/// Grayscale images are equalized directly. Color images are converted to
/// YUV, the luma channel is equalized, and the result is converted back to
/// RGB. Output dimensions and channel count always match the input.
///
/// # Errors
///
/// Returns `InvalidInput` for images that are neither 8-bit grayscale nor
/// 8-bit RGB.
pub fn equalize_histogram(image: &DynamicImage) -> PipelineResult<DynamicImage> {
    match image {
        DynamicImage::ImageLuma8(gray) => {
            let mut plane: Vec<u8> = gray.as_raw().clone();
            equalize_plane(&mut plane);
            let out = GrayImage::from_raw(gray.width(), gray.height(), plane)
                .ok_or_else(|| PipelineError::invalid_input("gray plane size mismatch"))?;
            Ok(DynamicImage::ImageLuma8(out))
        }
        DynamicImage::ImageRgb8(rgb) => {
            let mut yuv: Vec<[u8; 3]> = rgb.pixels().map(|p| rgb_to_yuv(p.0)).collect();

            let mut luma: Vec<u8> = yuv.iter().map(|p| p[0]).collect();
            equalize_plane(&mut luma);
            for (px, &y) in yuv.iter_mut().zip(luma.iter()) {
                px[0] = y;
            }

            let data: Vec<u8> = yuv.iter().flat_map(|&px| yuv_to_rgb(px)).collect();
            let out = RgbImage::from_raw(rgb.width(), rgb.height(), data)
                .ok_or_else(|| PipelineError::invalid_input("rgb plane size mismatch"))?;
            Ok(DynamicImage::ImageRgb8(out))
        }
        other => Err(PipelineError::invalid_input(format!(
            "unsupported channel layout {:?}: expected 1-channel gray or 3-channel RGB",
            other.color()
        ))),
    }
}

/// Contrast-limited adaptive histogram equalization.
///
/// The plane is partitioned into a grid of tiles; each tile gets its own
/// clipped equalization table, and per-pixel output is bilinearly interpolated
/// between the four neighboring tile tables so tile seams do not show.
#[derive(Debug, Clone, Copy)]
pub struct Clahe {
    clip_limit: f32,
    grid: (u32, u32),
}

impl Clahe {
    /// Creates a CLAHE operator.
    ///
    /// # Arguments
    ///
    /// * `clip_limit` - Contrast amplification cap, as a multiple of the
    ///   uniform histogram level. Must be positive.
    /// * `grid` - Tile grid as (rows, cols). Both must be at least 1.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when either parameter is out of range.
    pub fn new(clip_limit: f32, grid: (u32, u32)) -> PipelineResult<Self> {
        if !clip_limit.is_finite() || clip_limit <= 0.0 {
            return Err(PipelineError::config_error_with_context(
                "clip_limit",
                &clip_limit.to_string(),
                "must be a positive finite number",
            ));
        }
        if grid.0 == 0 || grid.1 == 0 {
            return Err(PipelineError::config_error_with_context(
                "tile_grid",
                &format!("({}, {})", grid.0, grid.1),
                "both grid dimensions must be at least 1",
            ));
        }
        Ok(Self { clip_limit, grid })
    }

    /// Applies CLAHE to an image.
    ///
    /// Grayscale images are processed directly; color images are processed on
    /// the CIELAB lightness channel only. Output dimensions and channel count
    /// always match the input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for images that are neither 8-bit grayscale nor
    /// 8-bit RGB.
    pub fn apply(&self, image: &DynamicImage) -> PipelineResult<DynamicImage> {
        match image {
            DynamicImage::ImageLuma8(gray) => {
                let mut plane: Vec<u8> = gray.as_raw().clone();
                self.apply_plane(&mut plane, gray.width() as usize, gray.height() as usize);
                let out = GrayImage::from_raw(gray.width(), gray.height(), plane)
                    .ok_or_else(|| PipelineError::invalid_input("gray plane size mismatch"))?;
                Ok(DynamicImage::ImageLuma8(out))
            }
            DynamicImage::ImageRgb8(rgb) => {
                let mut lab: Vec<[u8; 3]> = rgb.pixels().map(|p| rgb_to_lab(p.0)).collect();

                let mut lightness: Vec<u8> = lab.iter().map(|p| p[0]).collect();
                self.apply_plane(&mut lightness, rgb.width() as usize, rgb.height() as usize);
                for (px, &l) in lab.iter_mut().zip(lightness.iter()) {
                    px[0] = l;
                }

                let data: Vec<u8> = lab.iter().flat_map(|&px| lab_to_rgb(px)).collect();
                let out = RgbImage::from_raw(rgb.width(), rgb.height(), data)
                    .ok_or_else(|| PipelineError::invalid_input("rgb plane size mismatch"))?;
                Ok(DynamicImage::ImageRgb8(out))
            }
            other => Err(PipelineError::invalid_input(format!(
                "unsupported channel layout {:?}: expected 1-channel gray or 3-channel RGB",
                other.color()
            ))),
        }
    }

    /// Runs the tiled equalization on one plane in place.
    fn apply_plane(&self, plane: &mut [u8], width: usize, height: usize) {
        if width == 0 || height == 0 {
            return;
        }

        // A grid finer than the plane degenerates to one pixel per tile.
        let grid_rows = (self.grid.0 as usize).min(height).max(1);
        let grid_cols = (self.grid.1 as usize).min(width).max(1);
        let tile_w = width.div_ceil(grid_cols);
        let tile_h = height.div_ceil(grid_rows);

        let mut luts: Vec<[u8; 256]> = Vec::with_capacity(grid_rows * grid_cols);
        for ty in 0..grid_rows {
            for tx in 0..grid_cols {
                let x0 = tx * tile_w;
                let y0 = ty * tile_h;
                let x1 = (x0 + tile_w).min(width);
                let y1 = (y0 + tile_h).min(height);

                let mut hist = [0u32; 256];
                for y in y0..y1 {
                    for &v in &plane[y * width + x0..y * width + x1] {
                        hist[v as usize] += 1;
                    }
                }
                let total = ((x1 - x0) * (y1 - y0)) as u32;
                clip_histogram(&mut hist, self.clip_limit, total);
                luts.push(equalization_lut(&hist, total));
            }
        }

        let src: Vec<u8> = plane.to_vec();
        for y in 0..height {
            // Interpolation coordinates are relative to tile centers. Both
            // neighbor indices clamp from the unclamped floor, so pixels
            // outside the first or last tile center collapse onto the nearest
            // tile instead of blending inward.
            let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
            let ty = fy.floor();
            let wy = fy - ty;
            let ty = ty as isize;
            let ty0 = ty.clamp(0, grid_rows as isize - 1) as usize;
            let ty1 = (ty + 1).clamp(0, grid_rows as isize - 1) as usize;

            for x in 0..width {
                let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
                let tx = fx.floor();
                let wx = fx - tx;
                let tx = tx as isize;
                let tx0 = tx.clamp(0, grid_cols as isize - 1) as usize;
                let tx1 = (tx + 1).clamp(0, grid_cols as isize - 1) as usize;

                let v = src[y * width + x] as usize;
                let top = f32::from(luts[ty0 * grid_cols + tx0][v]) * (1.0 - wx)
                    + f32::from(luts[ty0 * grid_cols + tx1][v]) * wx;
                let bottom = f32::from(luts[ty1 * grid_cols + tx0][v]) * (1.0 - wx)
                    + f32::from(luts[ty1 * grid_cols + tx1][v]) * wx;
                let blended = top * (1.0 - wy) + bottom * wy;
                plane[y * width + x] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Clips a tile histogram at `clip_limit` times the uniform level and
/// redistributes the clipped mass evenly across all bins.
///
/// Near-uniform tiles would otherwise get an extreme equalization slope and
/// amplify noise; capping the per-bin count bounds that slope.
fn clip_histogram(hist: &mut [u32; 256], clip_limit: f32, total: u32) {
    if total == 0 {
        return;
    }

    let limit = ((clip_limit * total as f32 / 256.0).round() as u32).max(1);

    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }

    if excess == 0 {
        return;
    }

    let per_bin = excess / 256;
    let mut remainder = (excess % 256) as usize;
    for count in hist.iter_mut() {
        *count += per_bin;
        if remainder > 0 {
            *count += 1;
            remainder -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_gray(width: u32, height: u32) -> DynamicImage {
        let img = GrayImage::from_fn(width, height, |x, _| {
            image::Luma([(96 + (x * 64 / width)) as u8])
        });
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_equalize_constant_plane_is_identity() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, image::Luma([77])));
        let out = equalize_histogram(&img).expect("equalize succeeds");
        assert_eq!(out.as_bytes(), img.as_bytes());
    }

    #[test]
    fn test_equalize_two_level_plane_stretches_to_full_range() {
        let img = GrayImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                image::Luma([100])
            } else {
                image::Luma([200])
            }
        });
        let out = equalize_histogram(&DynamicImage::ImageLuma8(img)).expect("equalize succeeds");
        let bytes = out.as_bytes();
        assert!(bytes.contains(&0));
        assert!(bytes.contains(&255));
    }

    #[test]
    fn test_equalize_preserves_dimensions_and_channels() {
        let img = gradient_gray(33, 17);
        let out = equalize_histogram(&img).expect("equalize succeeds");
        assert_eq!(out.width(), 33);
        assert_eq!(out.height(), 17);
        assert_eq!(out.color(), img.color());

        let rgb = DynamicImage::ImageRgb8(RgbImage::from_fn(21, 9, |x, y| {
            image::Rgb([(x * 12) as u8, (y * 25) as u8, 80])
        }));
        let out = equalize_histogram(&rgb).expect("equalize succeeds");
        assert_eq!(out.width(), 21);
        assert_eq!(out.height(), 9);
        assert_eq!(out.color(), rgb.color());
    }

    #[test]
    fn test_equalize_rejects_other_channel_layouts() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4));
        assert!(matches!(
            equalize_histogram(&rgba),
            Err(PipelineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_clahe_parameter_validation() {
        assert!(Clahe::new(3.0, (8, 8)).is_ok());
        assert!(Clahe::new(0.0, (8, 8)).is_err());
        assert!(Clahe::new(-1.0, (8, 8)).is_err());
        assert!(Clahe::new(2.0, (0, 8)).is_err());
        assert!(Clahe::new(2.0, (8, 0)).is_err());
    }

    #[test]
    fn test_clahe_constant_plane_is_identity() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, image::Luma([140])));
        let clahe = Clahe::new(2.0, (4, 4)).expect("valid params");
        let out = clahe.apply(&img).expect("clahe succeeds");
        assert_eq!(out.as_bytes(), img.as_bytes());
    }

    #[test]
    fn test_clahe_preserves_dimensions_and_channels() {
        let img = gradient_gray(50, 30);
        let clahe = Clahe::new(3.0, (8, 8)).expect("valid params");
        let out = clahe.apply(&img).expect("clahe succeeds");
        assert_eq!(out.width(), 50);
        assert_eq!(out.height(), 30);
        assert_eq!(out.color(), img.color());
    }

    #[test]
    fn test_clahe_border_pixels_use_nearest_tile_only() {
        // Two tiles stacked vertically with opposing mappings for value 50:
        // the top tile is dominated by zeros so its table sends 50 to 255,
        // the bottom tile is dominated by brighter values so its table sends
        // 50 to 0. Pixels above the first tile center (and below the last)
        // must collapse onto the nearest tile, not blend toward the other.
        let img = GrayImage::from_fn(8, 16, |x, y| {
            if y == 0 {
                image::Luma([50])
            } else if y < 8 {
                image::Luma([0])
            } else if x < 4 {
                image::Luma([50])
            } else {
                image::Luma([255])
            }
        });
        // Clip limit high enough that no bin is ever clipped.
        let clahe = Clahe::new(1000.0, (2, 1)).expect("valid params");
        let out = clahe
            .apply(&DynamicImage::ImageLuma8(img))
            .expect("clahe succeeds")
            .into_luma8();

        assert_eq!(out.get_pixel(0, 0).0[0], 255, "top border leaked into the lower tile");
        assert_eq!(out.get_pixel(0, 15).0[0], 0, "bottom border leaked into the upper tile");
    }

    #[test]
    fn test_clahe_grid_larger_than_image() {
        // A 64x64 grid over a 10x10 plane degenerates without panicking.
        let img = gradient_gray(10, 10);
        let clahe = Clahe::new(2.0, (64, 64)).expect("valid params");
        let out = clahe.apply(&img).expect("clahe succeeds");
        assert_eq!(out.width(), 10);
        assert_eq!(out.height(), 10);
    }

    #[test]
    fn test_clip_histogram_caps_and_conserves_mass() {
        let mut hist = [0u32; 256];
        hist[10] = 900;
        hist[200] = 124;
        let total = 1024;
        clip_histogram(&mut hist, 2.0, total);

        let limit = (2.0 * total as f32 / 256.0).round() as u32;
        // The spiked bin is capped near the limit (plus its redistribution share).
        assert!(hist[10] <= limit + hist[0] + 1);
        let sum: u32 = hist.iter().sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn test_equalization_lut_identity_for_empty() {
        let hist = [0u32; 256];
        let lut = equalization_lut(&hist, 0);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[128], 128);
        assert_eq!(lut[255], 255);
    }
}
