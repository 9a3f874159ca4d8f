//! In-process stand-in for the Black Forest Labs API.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const JOB_ID: &str = "job-7f3a";
pub const SAMPLE_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0, 1];

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub segment: String,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Debug, Default)]
struct Log {
    submits: Vec<Recorded>,
    poll_ids: Vec<String>,
    poll_headers: Vec<HeaderMap>,
    download_headers: Vec<HeaderMap>,
}

struct MockState {
    sample_url: String,
    submit_status: StatusCode,
    submit_body: Value,
    replies: Mutex<VecDeque<(StatusCode, String)>>,
    statuses: Mutex<VecDeque<String>>,
    final_status: String,
    download_status: StatusCode,
    log: Mutex<Log>,
}

/// Configures a mock server before it starts.
pub struct MockBfl {
    submit_status: StatusCode,
    submit_body: Value,
    replies: Vec<(StatusCode, String)>,
    statuses: Vec<String>,
    final_status: String,
    download_status: StatusCode,
}

impl Default for MockBfl {
    fn default() -> Self {
        Self {
            submit_status: StatusCode::OK,
            submit_body: json!({"id": JOB_ID, "polling_url": "unused"}),
            replies: Vec::new(),
            statuses: Vec::new(),
            final_status: "Ready".into(),
            download_status: StatusCode::OK,
        }
    }
}

impl MockBfl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses returned by successive polls before `final_status`.
    pub fn statuses(mut self, statuses: &[&str]) -> Self {
        self.statuses = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Status returned once the scripted statuses run out.
    pub fn final_status(mut self, status: &str) -> Self {
        self.final_status = status.into();
        self
    }

    /// Raw poll reply served before any scripted status. Repeatable.
    pub fn poll_reply(mut self, status: StatusCode, body: &str) -> Self {
        self.replies.push((status, body.into()));
        self
    }

    /// Status of the sample download; non-OK replies carry no image.
    pub fn download_status(mut self, status: StatusCode) -> Self {
        self.download_status = status;
        self
    }

    pub fn submit_response(mut self, status: StatusCode, body: Value) -> Self {
        self.submit_status = status;
        self.submit_body = body;
        self
    }

    pub async fn start(self) -> MockServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(MockState {
            sample_url: format!("{base_url}/samples/result.jpg"),
            submit_status: self.submit_status,
            submit_body: self.submit_body,
            replies: Mutex::new(self.replies.into()),
            statuses: Mutex::new(self.statuses.into()),
            final_status: self.final_status,
            download_status: self.download_status,
            log: Mutex::new(Log::default()),
        });

        let app = Router::new()
            .route("/v1/:segment", get(poll).post(submit))
            .route("/samples/result.jpg", get(sample))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockServer { base_url, state }
    }
}

/// A running mock server.
pub struct MockServer {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockServer {
    pub fn submits(&self) -> Vec<Recorded> {
        self.state.log.lock().unwrap().submits.clone()
    }

    pub fn poll_ids(&self) -> Vec<String> {
        self.state.log.lock().unwrap().poll_ids.clone()
    }

    pub fn poll_headers(&self) -> Vec<HeaderMap> {
        self.state.log.lock().unwrap().poll_headers.clone()
    }

    pub fn download_headers(&self) -> Vec<HeaderMap> {
        self.state.log.lock().unwrap().download_headers.clone()
    }
}

async fn submit(
    State(state): State<Arc<MockState>>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.log.lock().unwrap().submits.push(Recorded {
        segment,
        headers,
        body,
    });
    (state.submit_status, Json(state.submit_body.clone()))
}

async fn poll(
    State(state): State<Arc<MockState>>,
    Path(segment): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if segment != "get_result" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"}))).into_response();
    }

    let id = query.get("id").cloned().unwrap_or_default();
    {
        let mut log = state.log.lock().unwrap();
        log.poll_ids.push(id.clone());
        log.poll_headers.push(headers);
    }

    if let Some((status, body)) = state.replies.lock().unwrap().pop_front() {
        return (status, [(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    let status = state
        .statuses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| state.final_status.clone());

    let body = if status == "Ready" {
        json!({
            "id": id,
            "status": status,
            "result": {"sample": state.sample_url, "prompt": "", "seed": 1234},
        })
    } else {
        json!({"id": id, "status": status, "result": null})
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn sample(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.log.lock().unwrap().download_headers.push(headers);
    if state.download_status != StatusCode::OK {
        return state.download_status.into_response();
    }
    ([(header::CONTENT_TYPE, "image/jpeg")], SAMPLE_BYTES).into_response()
}
