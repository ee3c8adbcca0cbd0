//! # orthoprep
//!
//! Automation for a small aerial-imaging workflow: deterministic per-image
//! contrast and color correction ahead of stitching or detection, and
//! tracking of asynchronous orthophoto jobs on a remote processing node.
//!
//! ## Components
//!
//! - **Image loading**: enumerate, decode, and downscale a directory of images
//! - **Enhancement engine**: histogram equalization / CLAHE contrast
//!   correction plus white-balance correction, pure and deterministic
//! - **Remote job client**: submit an image batch to a processing node, poll
//!   status, download assets
//! - **Job orchestrator**: explicit state machine from submission to a
//!   terminal state, with progress reporting and cancellation
//! - **Result sink**: processed-image naming and the detection results file
//!
//! Stitching and object detection are external collaborators behind narrow
//! traits ([`stitching::Stitcher`], [`detection::ObjectDetector`]); this
//! crate orchestrates them but implements neither.
//!
//! ## Modules
//!
//! * [`core`] - Configuration types and error handling
//! * [`processors`] - The enhancement engine
//! * [`remote`] - Remote processing node client
//! * [`orchestrator`] - Remote job state machine
//! * [`pipeline`] - Directory-level batch workflows
//! * [`sink`] - Persisting images and detection results
//! * [`utils`] - Image loading, logging setup, optional visualization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orthoprep::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Enhance every image in a directory.
//! let pipeline = EnhancementPipeline::new(EnhancementConfig::default())?;
//! let written = pipeline.enhance_directory(Path::new("flight7"), 2.0)?;
//! println!("wrote {} images", written.len());
//!
//! // Submit the originals to a processing node and track the job.
//! let node = HttpNode::new("localhost", 3000)?;
//! let orchestrator = JobOrchestrator::new(&node);
//! let files = orthoprep::utils::image_files(Path::new("flight7"))?;
//! let outcome = orchestrator.run(
//!     &files,
//!     &SubmitOptions::default(),
//!     Path::new("odm_media/results"),
//!     &mut |status, progress| println!("{} {}%", status, progress),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod detection;
pub mod orchestrator;
pub mod pipeline;
pub mod processors;
pub mod remote;
pub mod sink;
pub mod stitching;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use orthoprep::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        ContrastMethod, EnhancementConfig, PipelineError, PipelineResult, SubmitOptions,
    };
    pub use crate::detection::{DetectionRecord, ImageDetections, ObjectDetector};
    pub use crate::orchestrator::{CancelToken, JobOrchestrator, JobOutcome, JobState};
    pub use crate::pipeline::EnhancementPipeline;
    pub use crate::processors::enhance;
    pub use crate::remote::http::HttpNode;
    pub use crate::remote::{ProcessingNode, TaskHandle, TaskInfo, TaskStatus};
    pub use crate::stitching::Stitcher;
    pub use crate::utils::{load_image, load_images};
}
