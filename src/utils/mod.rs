//! Utility functions for the preprocessing pipeline.
//!
//! This module provides image loading utilities, optional visualization, and
//! logging setup.

pub mod image;
#[cfg(feature = "visualization")]
pub mod visualization;

pub use image::{image_files, load_image, load_images};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
