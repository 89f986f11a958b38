//! Mock LogicMonitor API client for testing
//!
//! Serves scripted responses per resource path, in order, and records every
//! request so tests can assert on offsets and query parameters.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use super::LogicMonitorApi;
use crate::error::{ApiError, Result};

/// A request seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    pub resource_path: String,
    pub query: Vec<(String, String)>,
}

impl CapturedRequest {
    /// Value of a query parameter, if it was sent.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Mock API client for testing.
///
/// ```ignore
/// let mock = MockLogicMonitorClient::new()
///     .with_page("/setting/oids", vec![json!({"id": 1})], Some(1));
/// ```
#[derive(Default)]
pub struct MockLogicMonitorClient {
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<Value>>>>>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockLogicMonitorClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw payload for `resource_path`.
    pub fn with_payload(self, resource_path: &str, payload: Value) -> Self {
        self.push(resource_path, Ok(payload));
        self
    }

    /// Queue a standard `{data: {items, total}}` page for `resource_path`.
    pub fn with_page(self, resource_path: &str, items: Vec<Value>, total: Option<u64>) -> Self {
        let mut data = json!({ "items": items });
        if let Some(total) = total {
            data["total"] = json!(total);
        }
        self.with_payload(resource_path, json!({ "data": data }))
    }

    /// Queue an error for `resource_path`.
    pub fn with_error(self, resource_path: &str, error: ApiError) -> Self {
        self.push(resource_path, Err(error.into()));
        self
    }

    /// Queue honest pages for `total` items split into pages of `page_size`.
    pub fn with_dataset(mut self, resource_path: &str, total: usize, page_size: usize) -> Self {
        let items: Vec<Value> = (0..total)
            .map(|i| json!({ "id": i, "name": format!("item {}", i) }))
            .collect();
        for chunk in items.chunks(page_size) {
            self = self.with_page(resource_path, chunk.to_vec(), Some(total as u64));
        }
        if total == 0 {
            self = self.with_page(resource_path, Vec::new(), Some(0));
        }
        self
    }

    fn push(&self, resource_path: &str, response: Result<Value>) {
        // Builder methods run before any request, so the lock is never contended
        let mut responses = self
            .responses
            .try_lock()
            .expect("mock responses locked during setup");
        responses
            .entry(resource_path.to_string())
            .or_default()
            .push_back(response);
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().await.clone()
    }

    /// Requests received for one resource path.
    pub async fn requests_for(&self, resource_path: &str) -> Vec<CapturedRequest> {
        self.captured
            .lock()
            .await
            .iter()
            .filter(|r| r.resource_path == resource_path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LogicMonitorApi for MockLogicMonitorClient {
    async fn get_json(
        &self,
        resource_path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value> {
        self.captured.lock().await.push(CapturedRequest {
            resource_path: resource_path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });

        let mut responses = self.responses.lock().await;
        match responses.get_mut(resource_path).and_then(|q| q.pop_front()) {
            Some(response) => response,
            // Unscripted calls look like an exhausted listing
            None => Ok(json!({ "data": { "items": [] } })),
        }
    }
}
