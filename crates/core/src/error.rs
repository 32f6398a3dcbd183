//! Local precondition failures raised before any network call.

/// Errors detected while assembling a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Image mode was selected but no image is attached.
    #[error("no image selected")]
    NoImageSelected,

    /// Clinical mode was selected but none of the schema fields has a value.
    #[error("no clinical data entered")]
    NoClinicalData,

    /// The selected file could not be read or is not a supported image.
    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    /// A clinical schema definition is empty or inconsistent.
    #[error("invalid clinical schema: {0}")]
    InvalidSchema(String),
}
