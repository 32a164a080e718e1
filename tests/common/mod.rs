//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tempfile::TempDir;

use fritz_annotate::application::services::AnnotationService;
use fritz_annotate::infrastructure::traits::{ApiClient, ApiResponse, HttpMethod, RealFileSystem};

/// One call seen by [`MockApi`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

type Handler = dyn Fn(HttpMethod, &str, Option<&Value>) -> io::Result<ApiResponse> + Send + Sync;

/// Recording API client answering from a handler closure.
pub struct MockApi {
    calls: Mutex<Vec<RecordedCall>>,
    handler: Box<Handler>,
}

impl MockApi {
    pub fn new(
        handler: impl Fn(HttpMethod, &str, Option<&Value>) -> io::Result<ApiResponse>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        })
    }

    /// Answers GETs from `listings` (keyed by obj_id, empty listing
    /// otherwise) and every write with 200.
    pub fn with_listings(listings: HashMap<String, Value>) -> Arc<Self> {
        Self::new(move |method, path, _| {
            if method == HttpMethod::Get {
                let obj_id = obj_id_of(path);
                let data = listings.get(&obj_id).cloned().unwrap_or_else(|| json!([]));
                Ok(listing(data))
            } else {
                Ok(ok())
            }
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, method: HttpMethod) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }
}

impl ApiClient for MockApi {
    fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> io::Result<ApiResponse> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        (self.handler)(method, path, body)
    }
}

/// `/api/sources/{obj_id}/annotations[/{id}]` -> obj_id
pub fn obj_id_of(path: &str) -> String {
    path.trim_start_matches("/api/sources/")
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn ok() -> ApiResponse {
    ApiResponse::new(200, json!({ "status": "success", "data": {} }))
}

pub fn listing(data: Value) -> ApiResponse {
    ApiResponse::new(200, json!({ "status": "success", "data": data }))
}

pub fn annotation(id: i64, origin: &str, key: &str, value: Value) -> Value {
    json!({ "id": id, "origin": origin, "data": { key: value }, "author_id": 1 })
}

pub fn service(api: Arc<MockApi>) -> AnnotationService {
    AnnotationService::new(Arc::new(RealFileSystem), api)
}

/// Helper to create a temp input file for testing
pub fn create_input_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write input file");
    path
}
