//! Batch workflows: directory enhancement, detection, and stitching.
//!
//! Each image in a batch is independent, so enhancement parallelizes across
//! images with rayon once the batch exceeds a threshold; below it the
//! sequential path avoids pool overhead. Output order follows input order in
//! both paths. Per-item failures are isolated (skipped with a warning) while
//! directory-level failures abort the batch.

use crate::core::config::EnhancementConfig;
use crate::core::errors::{PipelineError, PipelineResult};
use crate::detection::{ImageDetections, ObjectDetector};
use crate::processors::enhance;
use crate::sink;
use crate::stitching::Stitcher;
use crate::utils::image::load_images;
use image::DynamicImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Batch size above which enhancement runs in parallel.
const DEFAULT_PARALLEL_THRESHOLD: usize = 8;

/// Name of the detection results file written into the input directory.
pub const RESULTS_FILE_NAME: &str = "results.txt";

/// Directory enhancement workflow.
#[derive(Debug, Clone)]
pub struct EnhancementPipeline {
    config: EnhancementConfig,
    parallel_threshold: usize,
}

impl EnhancementPipeline {
    /// Creates a pipeline with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn new(config: EnhancementConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        })
    }

    /// Overrides the parallelism threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Enhances every decodable image in a directory and writes the results
    /// under `<dir>_processed`.
    ///
    /// Returns the written output paths in input order. Images that fail to
    /// load or enhance are skipped with a warning; the batch continues.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the directory cannot be read and the first
    /// write error encountered while saving.
    pub fn enhance_directory(&self, dir: &Path, scale: f32) -> PipelineResult<Vec<PathBuf>> {
        let images = load_images(dir, scale)?;
        info!(count = images.len(), dir = %dir.display(), "enhancing batch");

        let enhanced = self.enhance_batch(images);
        let written = sink::save_batch(dir, &enhanced)?;
        info!(count = written.len(), "batch enhancement finished");
        Ok(written)
    }

    /// Enhances a batch of loaded images, preserving input order.
    ///
    /// Per-image failures are isolated: the failing image is dropped from
    /// the output with a warning.
    pub fn enhance_batch(
        &self,
        images: Vec<(PathBuf, DynamicImage)>,
    ) -> Vec<(PathBuf, DynamicImage)> {
        let results: Vec<(PathBuf, PipelineResult<DynamicImage>)> =
            if images.len() > self.parallel_threshold {
                images
                    .into_par_iter()
                    .map(|(path, img)| {
                        let out = enhance(&img, &self.config);
                        (path, out)
                    })
                    .collect()
            } else {
                images
                    .into_iter()
                    .map(|(path, img)| {
                        let out = enhance(&img, &self.config);
                        (path, out)
                    })
                    .collect()
            };

        results
            .into_iter()
            .filter_map(|(path, result)| match result {
                Ok(img) => Some((path, img)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "enhancement failed, skipping image");
                    None
                }
            })
            .collect()
    }
}

/// Runs detection over every decodable image in a directory.
///
/// Per-image detector failures are isolated with a warning. When `save_txt`
/// is set, the collected records are written as `results.txt` inside the
/// input directory.
///
/// # Errors
///
/// Returns an `Io` error if the directory cannot be read or the results file
/// cannot be written.
pub fn detect_directory(
    dir: &Path,
    detector: &dyn ObjectDetector,
    save_txt: bool,
) -> PipelineResult<Vec<ImageDetections>> {
    let images = load_images(dir, 1.0)?;
    let mut results = Vec::with_capacity(images.len());

    for (path, image) in images {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match detector.detect(&image.to_rgb8()) {
            Ok(records) => results.push(ImageDetections { name, records }),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "detection failed, skipping image");
            }
        }
    }

    if save_txt {
        let target = dir.join(RESULTS_FILE_NAME);
        sink::write_results(&target, &results)?;
        info!(path = %target.display(), "saved detection results");
    }

    Ok(results)
}

/// Stitches every decodable image in a directory into one panorama.
///
/// Collaborator failures are surfaced verbatim, not diagnosed.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty directory and the stitcher's `Stitch`
/// error on composition failure.
pub fn stitch_directory(
    dir: &Path,
    scale: f32,
    stitcher: &dyn Stitcher,
) -> PipelineResult<image::RgbImage> {
    let images = load_images(dir, scale)?;
    if images.is_empty() {
        return Err(PipelineError::invalid_input(format!(
            "no decodable images in {}",
            dir.display()
        )));
    }
    let frames: Vec<image::RgbImage> = images.into_iter().map(|(_, img)| img.to_rgb8()).collect();
    stitcher.stitch(&frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ContrastMethod;
    use crate::detection::DetectionRecord;
    use image::RgbImage;

    fn write_png(dir: &Path, name: &str) {
        RgbImage::from_fn(16, 16, |x, y| image::Rgb([(x * 16) as u8, (y * 16) as u8, 128]))
            .save(dir.join(name))
            .expect("test image saved");
    }

    fn identity_pipeline() -> EnhancementPipeline {
        EnhancementPipeline::new(EnhancementConfig {
            contrast_method: ContrastMethod::None,
            white_balance: false,
            ..EnhancementConfig::default()
        })
        .expect("valid config")
    }

    #[test]
    fn test_enhance_directory_writes_processed_siblings() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("flight");
        std::fs::create_dir_all(&dir).expect("mkdir");
        write_png(&dir, "a.png");
        write_png(&dir, "b.png");

        let written = identity_pipeline()
            .enhance_directory(&dir, 1.0)
            .expect("enhancement succeeds");

        assert_eq!(written.len(), 2);
        for path in &written {
            assert!(path.is_file());
        }
        assert!(root.path().join("flight_processed").is_dir());
    }

    #[test]
    fn test_enhance_batch_preserves_order_in_parallel() {
        let pipeline = identity_pipeline().with_parallel_threshold(0);
        let batch: Vec<(PathBuf, DynamicImage)> = (0..12)
            .map(|i| {
                let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
                    4,
                    4,
                    image::Rgb([i as u8, 0, 0]),
                ));
                (PathBuf::from(format!("img_{:02}.png", i)), img)
            })
            .collect();

        let out = pipeline.enhance_batch(batch);
        let names: Vec<String> = out
            .iter()
            .map(|(p, _)| p.to_string_lossy().into_owned())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(out.len(), 12);
    }

    struct FixedDetector;
    impl ObjectDetector for FixedDetector {
        fn detect(&self, _image: &RgbImage) -> PipelineResult<Vec<DetectionRecord>> {
            Ok(vec![DetectionRecord::new(
                "marker",
                0.75,
                (1.0, 1.0, 8.0, 8.0),
            )?])
        }
    }

    #[test]
    fn test_detect_directory_writes_results_file() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("survey");
        std::fs::create_dir_all(&dir).expect("mkdir");
        write_png(&dir, "a.png");

        let results =
            detect_directory(&dir, &FixedDetector, true).expect("detection succeeds");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].records.len(), 1);
        assert!(dir.join(RESULTS_FILE_NAME).is_file());
    }

    struct FailingStitcher;
    impl Stitcher for FailingStitcher {
        fn stitch(&self, _images: &[RgbImage]) -> PipelineResult<RgbImage> {
            Err(PipelineError::Stitch {
                message: "not enough overlap".to_string(),
            })
        }
    }

    #[test]
    fn test_stitch_directory_surfaces_collaborator_failure() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("pano");
        std::fs::create_dir_all(&dir).expect("mkdir");
        write_png(&dir, "a.png");

        let result = stitch_directory(&dir, 1.0, &FailingStitcher);
        assert!(matches!(result, Err(PipelineError::Stitch { .. })));
    }

    #[test]
    fn test_stitch_directory_rejects_empty_dir() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("empty");
        std::fs::create_dir_all(&dir).expect("mkdir");

        let result = stitch_directory(&dir, 1.0, &FailingStitcher);
        assert!(matches!(result, Err(PipelineError::InvalidInput { .. })));
    }
}
