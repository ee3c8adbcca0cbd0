//! Remote processing node client interface.
//!
//! The pipeline submits a batch of images to a remote photogrammetry node,
//! polls it for status, and downloads the produced assets. The node is an
//! external collaborator behind the [`ProcessingNode`] trait so the job
//! orchestrator can be driven by a mock in tests (dependency-injected seam,
//! not a concrete network client). The HTTP implementation lives in
//! [`http`].

pub mod http;

use crate::core::config::SubmitOptions;
use crate::core::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Transport-level vs node-level failures of the remote client.
///
/// `Connection` means the node was never reached (check address/port);
/// `Response` means the node was reached and replied with an error.
#[derive(Error, Debug)]
pub enum NodeError {
    /// The node could not be reached at all.
    #[error("cannot connect to node: {0}")]
    Connection(String),

    /// The node replied with an error.
    #[error("node error: {0}")]
    Response(String),
}

impl From<NodeError> for PipelineError {
    fn from(error: NodeError) -> Self {
        match error {
            NodeError::Connection(message) => PipelineError::Connection { message },
            NodeError::Response(message) => PipelineError::NodeResponse { message },
        }
    }
}

/// Opaque handle to a job submitted to the node.
///
/// The identifier is assigned by the node and never interpreted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Node-assigned job identifier.
    pub uuid: String,
}

impl TaskHandle {
    /// Wraps a node-assigned identifier.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }
}

/// Remote-owned job status.
///
/// The status is polled, never mutated locally; `Completed` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Job accepted, waiting for a processing slot.
    Queued,
    /// Job is being processed.
    Running,
    /// Job finished successfully; assets are available for download.
    Completed,
    /// Job failed on the node; diagnostic output is available.
    Failed,
}

impl TaskStatus {
    /// Maps a node status code to a status.
    ///
    /// Codes follow the NodeODM convention: 10 queued, 20 running, 30 failed,
    /// 40 completed, 50 canceled (reported as failed since the job will never
    /// complete).
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            10 => Some(Self::Queued),
            20 => Some(Self::Running),
            30 | 50 => Some(Self::Failed),
            40 => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns true for statuses from which no further transition occurs.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "QUEUED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// One status poll result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskInfo {
    /// Current remote-owned status.
    pub status: TaskStatus,
    /// Advisory progress in `[0, 100]`. Remote-supplied, not validated for
    /// monotonicity, and never used for control flow.
    pub progress: u8,
}

/// Remote processing node collaborator.
///
/// One submitted batch maps to one task; the orchestrator drives the full
/// lifecycle through this interface.
pub trait ProcessingNode {
    /// Submits a batch of image files with the given options.
    fn create_task(
        &self,
        files: &[PathBuf],
        options: &SubmitOptions,
    ) -> Result<TaskHandle, NodeError>;

    /// Polls the current status and progress of a task.
    fn task_info(&self, handle: &TaskHandle) -> Result<TaskInfo, NodeError>;

    /// Downloads the produced assets into a destination directory and returns
    /// the written paths.
    fn download_assets(&self, handle: &TaskHandle, dest: &Path)
        -> Result<Vec<PathBuf>, NodeError>;

    /// Retrieves the diagnostic output lines of a task, verbatim.
    fn task_output(&self, handle: &TaskHandle) -> Result<Vec<String>, NodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(TaskStatus::from_code(10), Some(TaskStatus::Queued));
        assert_eq!(TaskStatus::from_code(20), Some(TaskStatus::Running));
        assert_eq!(TaskStatus::from_code(30), Some(TaskStatus::Failed));
        assert_eq!(TaskStatus::from_code(40), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::from_code(50), Some(TaskStatus::Failed));
        assert_eq!(TaskStatus::from_code(99), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn test_node_error_conversion() {
        let conn: PipelineError = NodeError::Connection("refused".to_string()).into();
        assert!(matches!(conn, PipelineError::Connection { .. }));

        let resp: PipelineError = NodeError::Response("bad options".to_string()).into();
        assert!(matches!(resp, PipelineError::NodeResponse { .. }));
    }
}
