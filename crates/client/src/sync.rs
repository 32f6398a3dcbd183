//! Best-effort forwarding of submissions to a spreadsheet webhook.
//!
//! After a prediction is rendered, [`SheetSync::spawn`] posts one row
//! (clinical values, predicted label, optionally the image) to an external
//! webhook on a detached task. The response is not inspected, and a
//! failure is only reported through `tracing`; it never reaches the view
//! or the submission result.

use std::time::Duration;

use dxform_core::{ClinicalRecord, ClinicalSchema, Diagnosis, ImagePayload};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

/// HTTP request timeout for a single sync attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest base64 image included in a row. Spreadsheet cells hold at most
/// 50 000 characters.
pub const DEFAULT_IMAGE_MAX_CHARS: usize = 50_000;

/// Error type for sync failures. Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The background task panicked or was cancelled.
    #[error("sync task did not complete: {0}")]
    Aborted(String),
}

/// Build the JSON row for one submission.
///
/// Each schema field appears under its `sheet_key`; columns of a part that
/// was not submitted are blank. `image` is the base64 file when it fits in
/// `image_max_chars`, otherwise blank.
pub fn build_row(
    schema: &ClinicalSchema,
    clinical: Option<&ClinicalRecord>,
    diagnosis: &Diagnosis,
    image: Option<&ImagePayload>,
    image_max_chars: usize,
) -> Value {
    let mut row = Map::new();

    for field in schema.fields() {
        let value = clinical
            .and_then(|record| record.get(&field.name))
            .map(|v| serde_json::to_value(v).unwrap_or(Value::Null))
            .unwrap_or_else(|| Value::String(String::new()));
        row.insert(field.sheet_key.clone(), value);
    }

    row.insert(
        "prediction".to_string(),
        Value::String(diagnosis.label.clone()),
    );

    let image = match image {
        Some(img) if img.base64_len() <= image_max_chars => img.to_base64(),
        Some(img) => {
            tracing::debug!(
                file = img.file_name(),
                encoded_len = img.base64_len(),
                limit = image_max_chars,
                "Image too large for sheet cell, omitting",
            );
            String::new()
        }
        None => String::new(),
    };
    row.insert("image".to_string(), Value::String(image));

    Value::Object(row)
}

/// A sync task in flight.
///
/// Dropping the handle detaches the task; [`wait`](Self::wait) lets a
/// caller that is about to exit give it a chance to finish.
#[derive(Debug)]
pub struct SyncHandle {
    inner: JoinHandle<Result<(), SyncError>>,
}

impl SyncHandle {
    /// Wait for the task to settle and return its outcome.
    pub async fn wait(self) -> Result<(), SyncError> {
        match self.inner.await {
            Ok(outcome) => outcome,
            Err(e) => Err(SyncError::Aborted(e.to_string())),
        }
    }
}

/// Posts submission rows to a spreadsheet webhook.
#[derive(Debug, Clone)]
pub struct SheetSync {
    client: reqwest::Client,
    url: String,
    image_max_chars: usize,
}

impl SheetSync {
    /// Create a sync target with a pre-configured HTTP client.
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            image_max_chars: DEFAULT_IMAGE_MAX_CHARS,
        })
    }

    pub fn with_image_max_chars(mut self, limit: usize) -> Self {
        self.image_max_chars = limit;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn image_max_chars(&self) -> usize {
        self.image_max_chars
    }

    /// POST one row. Any HTTP status counts as delivered.
    pub async fn deliver(&self, row: &Value) -> Result<(), SyncError> {
        let response = self.client.post(&self.url).json(row).send().await?;
        tracing::debug!(status = response.status().as_u16(), "Sheet sync delivered");
        Ok(())
    }

    /// Deliver `row` on a detached task; failures are logged and kept in
    /// the returned handle's outcome.
    pub fn spawn(&self, row: Value) -> SyncHandle {
        let sync = self.clone();
        let inner = tokio::spawn(async move {
            let outcome = sync.deliver(&row).await;
            if let Err(e) = &outcome {
                tracing::warn!(url = %sync.url, error = %e, "Sheet sync failed");
            }
            outcome
        });
        SyncHandle { inner }
    }
}
