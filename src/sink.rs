//! Result sink: persisting enhanced images and detection results.
//!
//! Enhanced images are written as lossy JPEG into a sibling directory named
//! `<input_dir>_processed`, each file renamed `<stem>_processed.jpg`. Detection
//! results are serialized into a plain-text block format that round-trips
//! through [`parse_results`].

use crate::core::errors::{PipelineError, PipelineResult};
use crate::detection::{DetectionRecord, ImageDetections};
use image::DynamicImage;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Saves an image, creating any missing parent directories.
///
/// The output format is chosen by the path's extension; an existing file is
/// overwritten.
///
/// # Errors
///
/// Returns `Io` when directories cannot be created and `ImageLoad` wrapping
/// the encoder error when the image cannot be written.
pub fn save_image(path: &Path, image: &DynamicImage) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image.save(path).map_err(PipelineError::ImageLoad)?;
    info!(path = %path.display(), "saved image");
    Ok(())
}

/// Derives the output path for a processed image.
///
/// The output directory is a sibling of the input directory named
/// `<input_dir>_processed`; the file keeps its stem with a `_processed.jpg`
/// suffix.
pub fn processed_path(input_dir: &Path, input_file: &Path) -> PathBuf {
    let mut dir = input_dir.as_os_str().to_os_string();
    dir.push("_processed");

    let stem = input_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    PathBuf::from(dir).join(format!("{}_processed.jpg", stem))
}

/// Saves a batch of processed images under `<input_dir>_processed`.
///
/// # Errors
///
/// Fails on the first image that cannot be written; earlier files stay on
/// disk.
pub fn save_batch(
    input_dir: &Path,
    images: &[(PathBuf, DynamicImage)],
) -> PipelineResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(images.len());
    for (source, image) in images {
        let target = processed_path(input_dir, source);
        save_image(&target, image)?;
        written.push(target);
    }
    Ok(written)
}

/// Writes detection results in the block text format.
///
/// One block per image: an `Image:` header line, one indented `Object:` line
/// per record with the confidence rounded to two decimals, and a trailing
/// blank line.
///
/// # Errors
///
/// Returns `Io` on write failure.
pub fn write_results(path: &Path, results: &[ImageDetections]) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for image in results {
        writeln!(file, "Image: {}", image.name)?;
        for rec in &image.records {
            let (x1, y1, x2, y2) = rec.bbox;
            writeln!(
                file,
                "  Object: {}, Trust: {:.2}, Bounds: {}, {}, {}, {}",
                rec.label, rec.confidence, x1, y1, x2, y2
            )?;
        }
        writeln!(file)?;
    }
    file.flush()?;
    Ok(())
}

/// Parses a results file produced by [`write_results`].
///
/// Confidences come back rounded to two decimals; bounds are exact.
///
/// # Errors
///
/// Returns `InvalidInput` for lines that do not match the block format.
pub fn parse_results(reader: impl BufRead) -> PipelineResult<Vec<ImageDetections>> {
    let mut results: Vec<ImageDetections> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix("Image: ") {
            results.push(ImageDetections {
                name: name.to_string(),
                records: Vec::new(),
            });
            continue;
        }

        let detection = line.trim_start().strip_prefix("Object: ").ok_or_else(|| {
            PipelineError::invalid_input(format!("unexpected results line: {:?}", line))
        })?;
        let current = results.last_mut().ok_or_else(|| {
            PipelineError::invalid_input("detection line before any Image header")
        })?;

        let (label, rest) = detection.split_once(", Trust: ").ok_or_else(|| {
            PipelineError::invalid_input(format!("missing Trust field: {:?}", line))
        })?;
        let (confidence, bounds) = rest.split_once(", Bounds: ").ok_or_else(|| {
            PipelineError::invalid_input(format!("missing Bounds field: {:?}", line))
        })?;

        let confidence: f32 = confidence.parse().map_err(|_| {
            PipelineError::invalid_input(format!("bad confidence value: {:?}", confidence))
        })?;

        let corners: Vec<f32> = bounds
            .split(", ")
            .map(|v| {
                v.trim().parse::<f32>().map_err(|_| {
                    PipelineError::invalid_input(format!("bad bounds value: {:?}", v))
                })
            })
            .collect::<PipelineResult<_>>()?;
        if corners.len() != 4 {
            return Err(PipelineError::invalid_input(format!(
                "expected 4 bounds values, got {}",
                corners.len()
            )));
        }

        current.records.push(DetectionRecord {
            label: label.to_string(),
            confidence,
            bbox: (corners[0], corners[1], corners[2], corners[3]),
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::io::BufReader;

    fn sample_results() -> Vec<ImageDetections> {
        vec![
            ImageDetections {
                name: "field_01".to_string(),
                records: vec![
                    DetectionRecord::new("person", 0.87, (10.5, 20.0, 110.0, 220.25))
                        .expect("valid record"),
                    DetectionRecord::new("car", 0.42, (0.0, 5.0, 64.0, 48.0))
                        .expect("valid record"),
                ],
            },
            ImageDetections {
                name: "field_02".to_string(),
                records: vec![],
            },
        ]
    }

    #[test]
    fn test_results_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.txt");
        let original = sample_results();

        write_results(&path, &original).expect("write succeeds");
        let parsed = parse_results(BufReader::new(std::fs::File::open(&path).expect("open")))
            .expect("parse succeeds");

        assert_eq!(parsed.len(), original.len());
        for (orig, back) in original.iter().zip(&parsed) {
            assert_eq!(orig.name, back.name);
            assert_eq!(orig.records.len(), back.records.len());
            for (o, b) in orig.records.iter().zip(&back.records) {
                assert_eq!(o.label, b.label);
                // Confidence survives up to 2-decimal rounding.
                assert!((o.confidence - b.confidence).abs() < 0.005);
                assert_eq!(o.bbox, b.bbox);
            }
        }
    }

    #[test]
    fn test_results_text_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.txt");
        write_results(&path, &sample_results()[..1]).expect("write succeeds");

        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("Image: field_01\n"));
        assert!(text.contains("  Object: person, Trust: 0.87, Bounds: 10.5, 20, 110, 220.25\n"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let input = "Image: ok\n  Object: person Trust 0.9\n";
        assert!(parse_results(BufReader::new(input.as_bytes())).is_err());

        let headerless = "  Object: person, Trust: 0.9, Bounds: 0, 0, 1, 1\n";
        assert!(parse_results(BufReader::new(headerless.as_bytes())).is_err());
    }

    #[test]
    fn test_processed_path_layout() {
        let path = processed_path(Path::new("/data/flight7"), Path::new("/data/flight7/IMG_1.JPG"));
        assert_eq!(
            path,
            Path::new("/data/flight7_processed/IMG_1_processed.jpg")
        );
    }

    #[test]
    fn test_save_image_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/out/img.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3])));

        save_image(&path, &img).expect("first save succeeds");
        save_image(&path, &img).expect("overwrite succeeds");
        assert!(path.is_file());
    }

    #[test]
    fn test_save_batch_naming() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input_dir = dir.path().join("flight");
        std::fs::create_dir_all(&input_dir).expect("mkdir");

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([9, 9, 9])));
        let batch = vec![
            (input_dir.join("a.png"), img.clone()),
            (input_dir.join("b.tiff"), img),
        ];

        let written = save_batch(&input_dir, &batch).expect("batch save succeeds");
        assert_eq!(written.len(), 2);
        for path in &written {
            assert!(path.is_file());
            assert!(path
                .parent()
                .unwrap()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .ends_with("_processed"));
        }
    }
}
