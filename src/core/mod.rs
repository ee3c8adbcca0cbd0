//! The core module of the preprocessing pipeline.
//!
//! This module contains the fundamental components shared by the rest of the
//! crate:
//! - Configuration value types and validation
//! - Error handling
//!
//! It also re-exports the commonly used types for convenience.

pub mod config;
pub mod errors;

pub use config::{ContrastMethod, EnhancementConfig, SubmitOptions};
pub use errors::{PipelineError, PipelineResult, ProcessingStage};
