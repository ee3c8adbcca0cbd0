//! Job orchestrator: drives one remote job from submission to a terminal
//! state.
//!
//! The lifecycle is a small explicit state machine rather than a polling loop
//! with embedded control flow: each poll result maps through the pure
//! [`next_state`] function, which keeps the orchestrator testable against a
//! mock [`ProcessingNode`]. Local terminal states are `Completed`, `Failed`,
//! and `ConnectionError` (the node was never reached — distinct from a job
//! that reached the node and then failed there).
//!
//! Polling is unbounded by design: there is no timeout in the base contract.
//! The poll interval is configurable (default 300 ms) and a [`CancelToken`]
//! checked once per iteration gives callers a cancellation mechanism; a
//! deadline, if wanted, belongs to the caller wrapping `run`.

use crate::core::config::SubmitOptions;
use crate::core::errors::{PipelineError, PipelineResult};
use crate::remote::{NodeError, ProcessingNode, TaskInfo, TaskStatus};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Orchestrator-side view of the job lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Job accepted by the node and not yet terminal.
    InProgress {
        /// Remote-owned status (`Queued` or `Running`).
        status: TaskStatus,
        /// Advisory progress, observational only.
        progress: u8,
    },
    /// Job finished successfully on the node.
    Completed,
    /// Job failed on the node.
    Failed,
    /// The node could not be reached; local-only terminal state.
    ConnectionError,
}

impl JobState {
    /// Returns true when no further transition occurs from this state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress { .. })
    }
}

/// Pure transition from one poll result to the next state.
///
/// Status is remote-owned; the orchestrator only observes, so the next state
/// depends on the poll alone.
pub fn next_state(poll: &TaskInfo) -> JobState {
    match poll.status {
        TaskStatus::Completed => JobState::Completed,
        TaskStatus::Failed => JobState::Failed,
        status => JobState::InProgress {
            status,
            progress: poll.progress,
        },
    }
}

/// Cooperative cancellation signal, checked once per poll iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Takes effect at the next poll iteration.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Terminal outcome of one orchestrated job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Job completed; assets were downloaded to the destination directory.
    Completed {
        /// Paths written by the asset download.
        assets: Vec<PathBuf>,
    },
    /// Job failed on the node; diagnostic output surfaced verbatim.
    Failed {
        /// Diagnostic lines retrieved from the node.
        output: Vec<String>,
    },
    /// The node was unreachable. A single connection attempt is the
    /// contract; retry policy is a caller concern.
    ConnectionError {
        /// Transport-level detail.
        message: String,
    },
    /// Cancellation was requested before the job reached a remote terminal
    /// state. The remote job keeps running; only local tracking stops.
    Cancelled,
}

/// Drives one submitted job to completion against an injected node client.
pub struct JobOrchestrator<'a> {
    node: &'a dyn ProcessingNode,
    poll_interval: Duration,
    cancel: Option<CancelToken>,
}

impl<'a> JobOrchestrator<'a> {
    /// Creates an orchestrator with the default 300 ms poll interval.
    pub fn new(node: &'a dyn ProcessingNode) -> Self {
        Self {
            node,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: None,
        }
    }

    /// Overrides the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Submits a batch and drives the job to a terminal outcome.
    ///
    /// The observer is invoked with `(status, progress)` after every poll;
    /// progress is advisory only and never affects control flow.
    ///
    /// # Arguments
    ///
    /// * `files` - Image files to submit.
    /// * `options` - Submission options forwarded to the node.
    /// * `dest` - Destination directory for downloaded assets.
    /// * `observer` - Progress callback, called once per poll.
    ///
    /// # Errors
    ///
    /// Node unreachability is an outcome (`ConnectionError`), not an error.
    /// Errors are reserved for invalid options, node-side reply errors, and
    /// asset download failures after completion.
    pub fn run(
        &self,
        files: &[PathBuf],
        options: &SubmitOptions,
        dest: &Path,
        observer: &mut dyn FnMut(TaskStatus, u8),
    ) -> PipelineResult<JobOutcome> {
        options.validate()?;

        // Single connection attempt; no retry.
        let handle = match self.node.create_task(files, options) {
            Ok(handle) => handle,
            Err(NodeError::Connection(message)) => {
                warn!(%message, "node unreachable at submission");
                return Ok(JobOutcome::ConnectionError { message });
            }
            Err(err @ NodeError::Response(_)) => return Err(err.into()),
        };

        loop {
            if self.cancelled() {
                info!(uuid = %handle.uuid, "job tracking cancelled");
                return Ok(JobOutcome::Cancelled);
            }

            let poll = match self.node.task_info(&handle) {
                Ok(poll) => poll,
                Err(NodeError::Connection(message)) => {
                    warn!(uuid = %handle.uuid, %message, "lost connection while polling");
                    return Ok(JobOutcome::ConnectionError { message });
                }
                Err(err @ NodeError::Response(_)) => return Err(err.into()),
            };

            observer(poll.status, poll.progress);

            match next_state(&poll) {
                JobState::Completed => {
                    info!(uuid = %handle.uuid, "job completed, downloading assets");
                    let assets = self
                        .node
                        .download_assets(&handle, dest)
                        .map_err(|e| PipelineError::download(e.to_string()))?;
                    return Ok(JobOutcome::Completed { assets });
                }
                JobState::Failed => {
                    warn!(uuid = %handle.uuid, "job failed on the node");
                    let output = self.node.task_output(&handle)?;
                    return Ok(JobOutcome::Failed { output });
                }
                // Queued or Running; connection faults never reach here, they
                // are handled at the transport call above.
                _ => std::thread::sleep(self.poll_interval),
            }
        }
    }
}
