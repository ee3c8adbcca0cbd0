//! Error types for the preprocessing and remote-job pipeline.
//!
//! This module defines the error taxonomy used across the crate: image loading
//! errors, in-memory processing errors, remote node errors, and configuration
//! errors. Helper constructors attach stage and context information so failure
//! messages stay actionable without ad-hoc string formatting at call sites.

use thiserror::Error;

/// Enum representing different stages of in-memory image processing.
///
/// This enum is used to identify which stage of the enhancement pipeline an
/// error occurred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStage {
    /// Error occurred during contrast correction.
    Contrast,
    /// Error occurred during white-balance correction.
    WhiteBalance,
    /// Error occurred during color-space conversion.
    ColorSpace,
    /// Error occurred during image resizing.
    Resize,
    /// Error occurred during batch processing.
    BatchProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Contrast => write!(f, "contrast correction"),
            ProcessingStage::WhiteBalance => write!(f, "white balance"),
            ProcessingStage::ColorSpace => write!(f, "color-space conversion"),
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::BatchProcessing => write!(f, "batch processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing the errors that can occur in the pipeline.
///
/// Connection failures and remote job failures are deliberately distinct
/// variants: the former means the node was never reached (check the address),
/// the latter means the node accepted the job and the job itself failed
/// (check the diagnostic output).
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error occurred while loading an image from disk.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred during in-memory processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// The remote processing node could not be reached at all.
    #[error("cannot connect to processing node: {message}")]
    Connection {
        /// Transport-level detail (address, underlying cause).
        message: String,
    },

    /// The node was reached but replied with an error.
    #[error("processing node error: {message}")]
    NodeResponse {
        /// Node-reported detail, surfaced verbatim.
        message: String,
    },

    /// The remote job reached the node and then failed there.
    #[error("remote job failed ({} diagnostic lines)", output.len())]
    JobFailed {
        /// Diagnostic output retrieved from the node, verbatim.
        output: Vec<String>,
    },

    /// Asset download failed after the remote job completed.
    #[error("asset download failed: {message}")]
    Download {
        /// A message describing the download failure.
        message: String,
    },

    /// The stitching collaborator reported a failure.
    #[error("stitching failed: {message}")]
    Stitch {
        /// Collaborator-reported detail, surfaced verbatim.
        message: String,
    },

    /// The detection collaborator reported a failure.
    #[error("detection failed: {message}")]
    Detection {
        /// Collaborator-reported detail, surfaced verbatim.
        message: String,
    },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Creates a PipelineError for a processing stage with context.
    ///
    /// # Arguments
    ///
    /// * `kind` - The stage of processing where the error occurred.
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a PipelineError for invalid input.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a PipelineError for configuration errors.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a PipelineError for configuration errors with field context.
    ///
    /// # Arguments
    ///
    /// * `field` - The field where the error occurred.
    /// * `value` - The value of the field.
    /// * `reason` - The reason for the error.
    pub fn config_error_with_context(field: &str, value: &str, reason: &str) -> Self {
        Self::ConfigError {
            message: format!(
                "Configuration error in field '{}' with value '{}': {}",
                field, value, reason
            ),
        }
    }

    /// Creates a PipelineError for a connection failure.
    ///
    /// # Arguments
    ///
    /// * `message` - Transport-level detail about the failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a PipelineError for a failed asset download.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the download failure.
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
        }
    }

    /// Returns a short remediation hint for user-facing reporting.
    ///
    /// Connection failures and remote job failures require different
    /// remediation, so the two are never collapsed into one message.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::Connection { .. } => Some(
                "check that the processing node address and port are correct and the node is running",
            ),
            Self::JobFailed { .. } => Some(
                "inspect the diagnostic output from the node; the input batch may be unsuitable",
            ),
            _ => None,
        }
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_stage_display() {
        assert_eq!(ProcessingStage::Contrast.to_string(), "contrast correction");
        assert_eq!(ProcessingStage::WhiteBalance.to_string(), "white balance");
        assert_eq!(ProcessingStage::Generic.to_string(), "processing");
    }

    #[test]
    fn test_connection_and_job_failure_are_distinguishable() {
        let conn = PipelineError::connection("localhost:3000 refused");
        let failed = PipelineError::JobFailed {
            output: vec!["stage odm_orthophoto crashed".to_string()],
        };

        assert!(conn.to_string().contains("cannot connect"));
        assert!(failed.to_string().contains("remote job failed"));
        assert_ne!(conn.remediation(), failed.remediation());
        assert!(conn.remediation().is_some());
        assert!(failed.remediation().is_some());
    }

    #[test]
    fn test_config_error_with_context_message() {
        let err = PipelineError::config_error_with_context("clip_limit", "-1", "must be positive");
        let msg = err.to_string();
        assert!(msg.contains("clip_limit"));
        assert!(msg.contains("-1"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_processing_error_carries_stage_and_context() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad plane");
        let err =
            PipelineError::processing_error(ProcessingStage::Contrast, "tile histogram", source);
        let msg = err.to_string();
        assert!(msg.contains("contrast correction"));
        assert!(msg.contains("tile histogram"));
    }
}
