//! HTTP implementation of the [`ProcessingNode`] trait.
//!
//! Talks to a NodeODM-style REST API with a blocking client (the pipeline
//! tracks exactly one job at a time, so a multiplexed event loop would buy
//! nothing):
//!
//! * `POST /task/new` — multipart upload of the image batch plus options
//! * `GET /task/{uuid}/info` — status code and progress
//! * `GET /task/{uuid}/download/all.zip` — produced assets as one archive
//! * `GET /task/{uuid}/output` — diagnostic output lines
//!
//! Errors from the transport itself map to [`NodeError::Connection`]; any
//! reply the node actually produced (HTTP error status, `error` field,
//! malformed body) maps to [`NodeError::Response`].

use crate::core::config::SubmitOptions;
use crate::remote::{NodeError, ProcessingNode, TaskHandle, TaskInfo, TaskStatus};
use reqwest::blocking::multipart::Form;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Blocking HTTP client for one remote processing node.
#[derive(Debug)]
pub struct HttpNode {
    base_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct CreateResponse {
    uuid: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusBody {
    code: u32,
}

#[derive(Deserialize)]
struct InfoResponse {
    status: Option<StatusBody>,
    #[serde(default)]
    progress: f64,
    error: Option<String>,
}

impl HttpNode {
    /// Creates a client for the node at `host:port`.
    ///
    /// # Errors
    ///
    /// Returns `Connection` if the underlying HTTP client cannot be built.
    pub fn new(host: &str, port: u16) -> Result<Self, NodeError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NodeError::Connection(e.to_string()))?;
        Ok(Self {
            base_url: format!("http://{}:{}", host, port),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Transport failures (refused, DNS, timeout) never carry a node reply, so
/// they classify as connection errors; everything after a reply is a
/// response error.
fn send_error(err: reqwest::Error) -> NodeError {
    NodeError::Connection(err.to_string())
}

impl ProcessingNode for HttpNode {
    fn create_task(
        &self,
        files: &[PathBuf],
        options: &SubmitOptions,
    ) -> Result<TaskHandle, NodeError> {
        let mut form = Form::new().text("options", options.to_wire().to_string());
        for file in files {
            form = form
                .file("images", file)
                .map_err(|e| NodeError::Response(format!("cannot read {}: {}", file.display(), e)))?;
        }

        info!(files = files.len(), node = %self.base_url, "submitting task");
        let response: CreateResponse = self
            .client
            .post(self.url("/task/new"))
            .multipart(form)
            .send()
            .map_err(send_error)?
            .json()
            .map_err(|e| NodeError::Response(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(NodeError::Response(error));
        }
        let uuid = response
            .uuid
            .ok_or_else(|| NodeError::Response("task creation reply had no uuid".to_string()))?;
        info!(uuid = %uuid, "task created");
        Ok(TaskHandle::new(uuid))
    }

    fn task_info(&self, handle: &TaskHandle) -> Result<TaskInfo, NodeError> {
        let response: InfoResponse = self
            .client
            .get(self.url(&format!("/task/{}/info", handle.uuid)))
            .send()
            .map_err(send_error)?
            .json()
            .map_err(|e| NodeError::Response(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(NodeError::Response(error));
        }
        let code = response
            .status
            .ok_or_else(|| NodeError::Response("info reply had no status".to_string()))?
            .code;
        let status = TaskStatus::from_code(code)
            .ok_or_else(|| NodeError::Response(format!("unknown status code {}", code)))?;

        let progress = response.progress.clamp(0.0, 100.0).round() as u8;
        debug!(uuid = %handle.uuid, %status, progress, "polled task");
        Ok(TaskInfo { status, progress })
    }

    fn download_assets(
        &self,
        handle: &TaskHandle,
        dest: &Path,
    ) -> Result<Vec<PathBuf>, NodeError> {
        std::fs::create_dir_all(dest)
            .map_err(|e| NodeError::Response(format!("cannot create {}: {}", dest.display(), e)))?;

        let mut response = self
            .client
            .get(self.url(&format!("/task/{}/download/all.zip", handle.uuid)))
            .send()
            .map_err(send_error)?
            .error_for_status()
            .map_err(|e| NodeError::Response(e.to_string()))?;

        let target = dest.join("all.zip");
        let mut file = std::fs::File::create(&target)
            .map_err(|e| NodeError::Response(format!("cannot write {}: {}", target.display(), e)))?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| NodeError::Response(e.to_string()))?;

        info!(uuid = %handle.uuid, path = %target.display(), bytes, "downloaded assets");
        Ok(vec![target])
    }

    fn task_output(&self, handle: &TaskHandle) -> Result<Vec<String>, NodeError> {
        self.client
            .get(self.url(&format!("/task/{}/output", handle.uuid)))
            .send()
            .map_err(send_error)?
            .json()
            .map_err(|e| NodeError::Response(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let node = HttpNode::new("localhost", 3000).expect("client builds");
        assert_eq!(node.url("/task/new"), "http://localhost:3000/task/new");
        assert_eq!(
            node.url("/task/abc/info"),
            "http://localhost:3000/task/abc/info"
        );
    }
}
