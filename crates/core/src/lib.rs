//! Domain model of the diagnostic form.
//!
//! Everything here is free of network I/O: input mode selection, the
//! clinical field schema, payload assembly, response normalization and
//! result rendering. The `dxform-client` crate drives these against the
//! prediction service.

pub mod diagnosis;
pub mod error;
pub mod image_payload;
pub mod mode;
pub mod payload;
pub mod record;
pub mod render;
pub mod schema;
pub mod view;

pub use diagnosis::{parse_prediction, Diagnosis, DiagnosisError, PredictionResponse};
pub use error::ValidationError;
pub use image_payload::ImagePayload;
pub use mode::{FormMode, ModeSelector};
pub use payload::{build_payload, PredictPayload};
pub use record::{ClinicalRecord, FormFields};
pub use render::{render, RenderedResult};
pub use schema::{ClinicalField, ClinicalSchema, FieldKind, FieldValue};
pub use view::{FormView, HeadlessView};
