//! Prediction service client for the diagnostic form.
//!
//! - [`PredictionApi`]: `POST /predict` multipart client and health check.
//! - [`SheetSync`]: fire-and-forget forwarding of results to a
//!   spreadsheet webhook.
//! - [`FormController`]: the per-submission state machine tying the
//!   form, the service and the view together.
//! - [`ClientConfig`]: environment-driven configuration.

pub mod api;
pub mod config;
pub mod controller;
pub mod sync;

pub use api::{HealthResponse, PredictionApi, SubmitError};
pub use config::{ClientConfig, ConfigError};
pub use controller::{FormController, Submission, SubmissionState};
pub use sync::{SheetSync, SyncError, SyncHandle};
