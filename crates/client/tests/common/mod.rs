//! Fake prediction service and sheet webhook for integration tests.
//!
//! [`spawn_backend`] serves an axum router on an ephemeral port. `/predict`
//! records the multipart parts it receives and answers with a canned
//! response; `/sheet` records posted rows.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// One multipart part seen by `/predict`.
#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ReceivedPart {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Canned answer for `/predict`.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl CannedResponse {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

#[derive(Default)]
struct Recorded {
    predict_calls: Vec<Vec<ReceivedPart>>,
    sheet_rows: Vec<Value>,
}

#[derive(Clone)]
struct FakeState {
    response: CannedResponse,
    recorded: Arc<Mutex<Recorded>>,
}

/// Handle to a running fake backend.
pub struct FakeBackend {
    pub addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeBackend {
    pub fn api_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn sheet_url(&self) -> String {
        format!("http://{}/sheet", self.addr)
    }

    /// Parts of every `/predict` call so far.
    pub fn predict_calls(&self) -> Vec<Vec<ReceivedPart>> {
        self.recorded.lock().unwrap().predict_calls.clone()
    }

    /// Rows posted to `/sheet` so far.
    pub fn sheet_rows(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().sheet_rows.clone()
    }

    /// Poll until `n` sheet rows have arrived or a second passes.
    pub async fn wait_for_sheet_rows(&self, n: usize) -> Vec<Value> {
        for _ in 0..100 {
            let rows = self.sheet_rows();
            if rows.len() >= n {
                return rows;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sheet_rows()
    }
}

async fn predict(
    State(state): State<FakeState>,
    mut multipart: Multipart,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    state.recorded.lock().unwrap().predict_calls.push(parts);

    let response = state.response;
    (
        response.status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Heart Disease Prediction API is running",
    }))
}

async fn sheet(State(state): State<FakeState>, Json(row): Json<Value>) -> StatusCode {
    state.recorded.lock().unwrap().sheet_rows.push(row);
    StatusCode::OK
}

/// Start a fake backend answering `/predict` with `response`.
pub async fn spawn_backend(response: CannedResponse) -> FakeBackend {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let state = FakeState {
        response,
        recorded: recorded.clone(),
    };

    let app = Router::new()
        .route("/", get(health))
        .route("/predict", post(predict))
        .route("/sheet", post(sheet))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeBackend { addr, recorded }
}

/// Successful flat-shape prediction.
pub fn malignant_response() -> CannedResponse {
    CannedResponse::json(
        StatusCode::OK,
        json!({
            "prediction": "Malignant",
            "confidence": 0.87,
            "probabilities": {"Normal": 0.03, "Benign": 0.10, "Malignant": 0.87},
        }),
    )
}

/// A URL nothing listens on.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/sheet";
