//! The diagnostic form controller.
//!
//! [`FormController`] owns the form state (active mode, field values,
//! selected image) and runs one submission at a time through
//!
//! ```text
//! Idle -> Validating -> Submitting -> Success -> Logging -> Idle
//!                    \            \
//!                     +------------+-> Failed -> Idle
//! ```
//!
//! Every path ends with the view's submit control re-enabled.

use std::fmt;

use dxform_core::{
    build_payload, render, ClinicalSchema, Diagnosis, FormFields, FormMode, FormView,
    ImagePayload, ModeSelector, PredictPayload,
};

use crate::api::{PredictionApi, SubmitError};
use crate::sync::{build_row, SheetSync, SyncHandle};

/// Where a submission currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Submitting,
    Success,
    Logging,
    Failed,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Validating => "validating",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Success => "success",
            SubmissionState::Logging => "logging",
            SubmissionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one [`FormController::submit`] call.
#[derive(Debug)]
pub struct Submission {
    /// The diagnosis, or the error that was shown instead.
    pub result: Result<Diagnosis, SubmitError>,
    /// The sheet sync task started after a success, if sync is configured.
    pub sync: Option<SyncHandle>,
}

/// Form state plus the collaborators needed to submit it.
pub struct FormController {
    api: PredictionApi,
    sync: Option<SheetSync>,
    schema: ClinicalSchema,
    selector: ModeSelector,
    fields: FormFields,
    image: Option<ImagePayload>,
    state: SubmissionState,
    /// States visited by the most recent submission, starting at `Validating`.
    trail: Vec<SubmissionState>,
}

impl FormController {
    pub fn new(api: PredictionApi, schema: ClinicalSchema) -> Self {
        Self {
            api,
            sync: None,
            schema,
            selector: ModeSelector::default(),
            fields: FormFields::new(),
            image: None,
            state: SubmissionState::Idle,
            trail: Vec::new(),
        }
    }

    /// Forward successful submissions to a spreadsheet webhook.
    pub fn with_sync(mut self, sync: SheetSync) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn mode(&self) -> FormMode {
        self.selector.current()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// States visited by the most recent submission.
    pub fn last_trail(&self) -> &[SubmissionState] {
        &self.trail
    }

    pub fn schema(&self) -> &ClinicalSchema {
        &self.schema
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    /// Switch the active input mode, updating the view.
    pub fn select_mode<V: FormView + ?Sized>(&mut self, mode: FormMode, view: &mut V) {
        self.selector.select(mode, view);
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.set(name, value);
    }

    /// Replace the selected image; `None` clears the selection.
    pub fn select_image(&mut self, image: Option<ImagePayload>) {
        if let Some(img) = &image {
            tracing::debug!(image = %img.summary(), "Image selected");
        }
        self.image = image;
    }

    /// Run one submission and render its outcome on `view`.
    ///
    /// Errors are shown on the view and returned in
    /// [`Submission::result`]; sync failures never are.
    pub async fn submit<V: FormView + ?Sized>(&mut self, view: &mut V) -> Submission {
        self.trail.clear();
        view.set_submit_enabled(false);
        view.clear_result();

        let submission = match self.predict().await {
            Ok((payload, diagnosis)) => {
                self.enter(SubmissionState::Success);
                view.show_result(&render(&diagnosis));
                tracing::info!(
                    label = %diagnosis.label,
                    confidence = diagnosis.confidence,
                    "Prediction received",
                );

                let sync = self.start_sync(&payload, &diagnosis);
                Submission {
                    result: Ok(diagnosis),
                    sync,
                }
            }
            Err(e) => {
                self.enter(SubmissionState::Failed);
                tracing::warn!(error = %e, "Submission failed");
                view.show_error(&e.user_message());
                Submission {
                    result: Err(e),
                    sync: None,
                }
            }
        };

        self.enter(SubmissionState::Idle);
        view.set_submit_enabled(true);
        submission
    }

    /// Validate, then call the prediction service.
    async fn predict(&mut self) -> Result<(PredictPayload, Diagnosis), SubmitError> {
        self.enter(SubmissionState::Validating);
        let payload = build_payload(
            self.selector.current(),
            &self.schema,
            &self.fields,
            self.image.as_ref(),
        )?;

        self.enter(SubmissionState::Submitting);
        let diagnosis = self.api.predict(&payload).await?;
        Ok((payload, diagnosis))
    }

    fn start_sync(&mut self, payload: &PredictPayload, diagnosis: &Diagnosis) -> Option<SyncHandle> {
        let sync = self.sync.as_ref()?;
        let row = build_row(
            &self.schema,
            payload.clinical.as_ref(),
            diagnosis,
            payload.image.as_ref(),
            sync.image_max_chars(),
        );
        let handle = sync.spawn(row);
        self.enter(SubmissionState::Logging);
        Some(handle)
    }

    fn enter(&mut self, next: SubmissionState) {
        tracing::debug!(from = %self.state, to = %next, "Submission state");
        self.state = next;
        self.trail.push(next);
    }
}
