//! Mode-dependent payload assembly.
//!
//! [`build_payload`] decides which parts a submission carries. It performs
//! no I/O; transport encoding lives in the client crate.

use crate::error::ValidationError;
use crate::image_payload::ImagePayload;
use crate::mode::FormMode;
use crate::record::{ClinicalRecord, FormFields};
use crate::schema::ClinicalSchema;

/// Multipart field name of the image part.
pub const IMAGE_PART: &str = "image";

/// Multipart field name of the JSON clinical part.
pub const CLINICAL_PART: &str = "clinical_data";

/// The parts of one prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictPayload {
    pub mode: FormMode,
    pub image: Option<ImagePayload>,
    pub clinical: Option<ClinicalRecord>,
}

impl PredictPayload {
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn has_clinical(&self) -> bool {
        self.clinical.is_some()
    }
}

/// Assemble the payload for `mode` from the current form state.
///
/// * Outside clinical mode the image is attached when present; image mode
///   without an image fails with [`ValidationError::NoImageSelected`].
/// * Outside image mode a full clinical record is attached, defaults
///   filling blanks; clinical mode where no schema field holds a usable
///   value fails with [`ValidationError::NoClinicalData`].
pub fn build_payload(
    mode: FormMode,
    schema: &ClinicalSchema,
    fields: &FormFields,
    image: Option<&ImagePayload>,
) -> Result<PredictPayload, ValidationError> {
    let image = if mode.shows_image() {
        match image {
            Some(img) => Some(img.clone()),
            None if mode == FormMode::Image => return Err(ValidationError::NoImageSelected),
            None => None,
        }
    } else {
        None
    };

    let clinical = if mode.shows_clinical() {
        let any_present = schema
            .fields()
            .iter()
            .any(|f| f.value_of(fields.get(&f.name)).is_some());
        if mode == FormMode::Clinical && !any_present {
            return Err(ValidationError::NoClinicalData);
        }
        Some(ClinicalRecord::from_fields(schema, fields))
    } else {
        None
    };

    Ok(PredictPayload {
        mode,
        image,
        clinical,
    })
}
