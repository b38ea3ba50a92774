//! Test doubles for the transport and download seams.
//!
//! Available to this crate's unit tests and, through the `testing` feature,
//! to downstream integration suites.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{ApiRequest, ApiResponse, ApiTransport, HttpMethod};
use crate::error::{LodestoneError, Result};
use crate::files::{BlobSink, DownloadedFile};

enum Scripted {
    Respond(ApiResponse, Option<Duration>),
    Fail(String),
}

/// Transport that replays queued responses per `(method, path)`.
///
/// Responses for the same route are consumed in FIFO order. A request with
/// nothing queued gets a 404 naming the route, which keeps unexpected calls
/// visible in assertions instead of hanging.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<(HttpMethod, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: HttpMethod, path: impl Into<String>, response: ApiResponse) {
        self.push(method, path.into(), Scripted::Respond(response, None));
    }

    /// Queues a response that is delivered only after `delay`.
    pub fn respond_after(
        &self,
        method: HttpMethod,
        path: impl Into<String>,
        response: ApiResponse,
        delay: Duration,
    ) {
        self.push(method, path.into(), Scripted::Respond(response, Some(delay)));
    }

    /// Queues a transport-level failure (no response at all).
    pub fn fail(&self, method: HttpMethod, path: impl Into<String>, reason: impl Into<String>) {
        self.push(method, path.into(), Scripted::Fail(reason.into()));
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Requests received for one route.
    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn push(&self, method: HttpMethod, path: String, entry: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.entry((method, path)).or_default().push_back(entry);
        }
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let key = (request.method, request.path.clone());
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.get_mut(&key).and_then(VecDeque::pop_front));

        match next {
            Some(Scripted::Respond(response, delay)) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(response)
            }
            Some(Scripted::Fail(reason)) => Err(LodestoneError::network(reason)),
            None => Ok(ApiResponse::new(
                404,
                format!("unscripted request: {} {}", key.0, key.1),
            )),
        }
    }
}

/// Blob sink that keeps saved files in memory.
#[derive(Default)]
pub struct MemoryBlobSink {
    saved: Mutex<Vec<DownloadedFile>>,
    fail_with: Option<String>,
}

impl MemoryBlobSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every save fails with an IO error.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail_with: Some(reason.into()),
        }
    }

    pub fn saved(&self) -> Vec<DownloadedFile> {
        self.saved.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BlobSink for MemoryBlobSink {
    async fn save(&self, file: &DownloadedFile) -> Result<()> {
        if let Some(reason) = &self.fail_with {
            return Err(LodestoneError::Io {
                message: reason.clone(),
            });
        }
        if let Ok(mut saved) = self.saved.lock() {
            saved.push(file.clone());
        }
        Ok(())
    }
}

/// Profile JSON as the service returns it.
pub fn user_json(id: i64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{}@example.com", username),
    })
}

/// File-listing entry as the service returns it.
pub fn file_json(id: i64, original_filename: &str, file_size: u64) -> Value {
    json!({
        "id": id,
        "original_filename": original_filename,
        "file_size": file_size,
        "upload_status": "completed",
    })
}
