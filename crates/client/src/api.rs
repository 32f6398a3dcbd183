//! REST client for the prediction service.
//!
//! Wraps `POST /predict` (multipart upload of the image and clinical data)
//! and the `GET /` health endpoint using [`reqwest`].

use std::time::Duration;

use dxform_core::diagnosis::{error_message, parse_prediction};
use dxform_core::payload::{CLINICAL_PART, IMAGE_PART};
use dxform_core::{Diagnosis, DiagnosisError, PredictPayload, ValidationError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// HTTP client for one prediction service instance.
#[derive(Debug, Clone)]
pub struct PredictionApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response of the service's `GET /` health endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Everything that can end a submission without a diagnosis.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The form failed a local precondition; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Prediction API error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// A 2xx response whose body is not a usable prediction.
    #[error("Malformed prediction response: {0}")]
    MalformedResponse(#[from] DiagnosisError),
}

impl SubmitError {
    /// Text shown to the user in place of a result.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(e) => e.to_string(),
            SubmitError::Server { message, .. } => message.clone(),
            SubmitError::Request(e) => format!("Could not reach the prediction service: {e}"),
            SubmitError::MalformedResponse(e) => e.to_string(),
        }
    }

    /// HTTP status of a server-side rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            SubmitError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl PredictionApi {
    /// Create a client for a prediction service.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://127.0.0.1:8000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// Create a client whose requests give up after `timeout`.
    ///
    /// `None` leaves requests unbounded, so a hung service keeps the
    /// submission in flight until the connection settles.
    pub fn with_timeout(
        api_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, api_url))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Submit a payload for prediction.
    ///
    /// Sends `POST /predict` with an `image` file part and/or a
    /// `clinical_data` JSON part, then normalizes the answer.
    pub async fn predict(&self, payload: &PredictPayload) -> Result<Diagnosis, SubmitError> {
        let form = multipart_form(payload)?;

        tracing::debug!(
            mode = %payload.mode,
            image = payload.has_image(),
            clinical = payload.has_clinical(),
            "Sending prediction request",
        );

        let response = self
            .client
            .post(format!("{}/predict", self.api_url))
            .multipart(form)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(parse_prediction(&body)?)
    }

    /// Query the service health endpoint.
    pub async fn health(&self) -> Result<HealthResponse, SubmitError> {
        let response = self
            .client
            .get(format!("{}/", self.api_url))
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.json::<HealthResponse>().await?)
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or a
    /// [`SubmitError::Server`] carrying the status and extracted message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SubmitError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            tracing::warn!(status = status.as_u16(), %message, "Prediction API rejected request");
            return Err(SubmitError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

/// Encode a payload as the multipart form the service expects.
pub fn multipart_form(payload: &PredictPayload) -> Result<Form, reqwest::Error> {
    let mut form = Form::new();

    if let Some(image) = &payload.image {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())?;
        form = form.part(IMAGE_PART, part);
    }

    if let Some(record) = &payload.clinical {
        form = form.text(CLINICAL_PART, record.to_json());
    }

    Ok(form)
}
