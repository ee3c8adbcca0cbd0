//! The enhancement engine: contrast correction followed by white balance.
//!
//! `enhance` is a pure function of `(image, config)`: no shared state, same
//! output for the same input. It is *not* idempotent when a contrast method is
//! enabled; see [`crate::processors::contrast`].

use crate::core::config::{ContrastMethod, EnhancementConfig};
use crate::core::errors::PipelineResult;
use crate::processors::contrast::{equalize_histogram, Clahe};
use crate::processors::white_balance::correct_white_balance;
use image::DynamicImage;

/// Enhances a single image according to the configuration.
///
/// Stages run in fixed order: contrast correction (if any), then white
/// balance (if enabled). An identity configuration returns an unmodified
/// copy. Output dimensions and channel count always match the input.
///
/// # Arguments
///
/// * `image` - The input image (8-bit grayscale or 8-bit RGB).
/// * `config` - The enhancement configuration.
///
/// # Errors
///
/// Returns a `ConfigError` for invalid CLAHE parameters and `InvalidInput`
/// for unsupported channel layouts.
pub fn enhance(image: &DynamicImage, config: &EnhancementConfig) -> PipelineResult<DynamicImage> {
    config.validate()?;

    let contrasted = match config.contrast_method {
        ContrastMethod::None => image.clone(),
        ContrastMethod::HistEq => equalize_histogram(image)?,
        ContrastMethod::Clahe => {
            let clahe = Clahe::new(config.clip_limit, config.tile_grid)?;
            clahe.apply(image)?
        }
    };

    if config.white_balance {
        correct_white_balance(&contrasted)
    } else {
        Ok(contrasted)
    }
}
