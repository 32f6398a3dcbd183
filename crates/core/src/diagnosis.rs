//! Prediction response parsing.
//!
//! Backends have answered in two shapes over time: the prediction fields at
//! the top level, or wrapped in a `final_diagnosis` object. Both are
//! deserialized into [`PredictionResponse`] and normalized into a single
//! [`Diagnosis`] at this boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fallback text when an error response carries no usable message.
pub const GENERIC_SERVER_ERROR: &str = "Server error";

/// Prediction fields shared by both response shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisBody {
    pub prediction: String,
    pub confidence: f64,
    #[serde(default)]
    pub probabilities: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// The two known success shapes of `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    /// `{"final_diagnosis": {...}, ...}`. Sibling `probabilities` and
    /// `mode` fill in when the nested object omits them.
    Nested {
        final_diagnosis: DiagnosisBody,
        #[serde(default)]
        probabilities: Option<BTreeMap<String, f64>>,
        #[serde(default)]
        mode: Option<String>,
    },
    /// `{"prediction": ..., "confidence": ..., ...}`.
    Flat(DiagnosisBody),
}

/// Normalized prediction result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub label: String,
    /// Probability of `label`, in `[0, 1]`.
    pub confidence: f64,
    pub probabilities: Option<BTreeMap<String, f64>>,
    pub mode: Option<String>,
}

impl Diagnosis {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
            probabilities: None,
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_probabilities(mut self, probabilities: BTreeMap<String, f64>) -> Self {
        self.probabilities = Some(probabilities);
        self
    }
}

/// A success response that cannot be turned into a [`Diagnosis`].
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error("unrecognized prediction response: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("prediction label is empty")]
    EmptyLabel,

    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

impl PredictionResponse {
    /// Collapse either shape into a [`Diagnosis`], checking its invariants.
    pub fn normalize(self) -> Result<Diagnosis, DiagnosisError> {
        let (body, outer_probabilities, outer_mode) = match self {
            PredictionResponse::Nested {
                final_diagnosis,
                probabilities,
                mode,
            } => (final_diagnosis, probabilities, mode),
            PredictionResponse::Flat(body) => (body, None, None),
        };

        let label = body.prediction.trim().to_string();
        if label.is_empty() {
            return Err(DiagnosisError::EmptyLabel);
        }
        if !(0.0..=1.0).contains(&body.confidence) {
            return Err(DiagnosisError::ConfidenceOutOfRange(body.confidence));
        }

        Ok(Diagnosis {
            label,
            confidence: body.confidence,
            probabilities: body.probabilities.or(outer_probabilities),
            mode: body.mode.or(outer_mode),
        })
    }
}

/// Parse and normalize a success body.
pub fn parse_prediction(body: &str) -> Result<Diagnosis, DiagnosisError> {
    serde_json::from_str::<PredictionResponse>(body)?.normalize()
}

/// Extract the user-facing message from an error response body.
///
/// Prefers a JSON `detail` (a string, or a list of `{msg}` validation
/// entries), then `error` or `message`, then the raw text. Blank bodies
/// yield [`GENERIC_SERVER_ERROR`].
pub fn error_message(body: &str) -> String {
    let trimmed = body.trim();

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let message = ["detail", "error", "message"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(message_from_value);
        return message.unwrap_or_else(|| GENERIC_SERVER_ERROR.to_string());
    }

    if trimmed.is_empty() {
        GENERIC_SERVER_ERROR.to_string()
    } else {
        trimmed.to_string()
    }
}

fn message_from_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Object(obj) => {
                        obj.get("msg").and_then(|m| m.as_str()).map(str::to_string)
                    }
                    _ => None,
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn flat_shape_normalizes() {
        let d = parse_prediction(r#"{"prediction":"Malignant","confidence":0.87}"#).unwrap();
        assert_eq!(d, Diagnosis::new("Malignant", 0.87));
    }

    #[test]
    fn nested_shape_normalizes() {
        let d = parse_prediction(
            r#"{"final_diagnosis":{"prediction":"Benign","confidence":0.62,"mode":"combined"}}"#,
        )
        .unwrap();
        assert_eq!(d, Diagnosis::new("Benign", 0.62).with_mode("combined"));
    }

    #[test]
    fn flat_shape_keeps_probabilities() {
        let d = parse_prediction(
            r#"{"prediction":"Normal","confidence":0.7,
                "probabilities":{"Normal":0.7,"Benign":0.2,"Malignant":0.1}}"#,
        )
        .unwrap();
        let probs = d.probabilities.unwrap();
        assert_eq!(probs.len(), 3);
        assert_eq!(probs["Benign"], 0.2);
    }

    #[test]
    fn nested_shape_falls_back_to_outer_fields() {
        let d = parse_prediction(
            r#"{"final_diagnosis":{"prediction":"Benign","confidence":0.5},
                "mode":"image","probabilities":{"Benign":0.5,"Normal":0.5},
                "image_result":{"prediction":"Benign"}}"#,
        )
        .unwrap();
        assert_eq!(d.mode.as_deref(), Some("image"));
        assert!(d.probabilities.is_some());
    }

    #[test]
    fn rejects_unknown_shape() {
        assert_matches!(
            parse_prediction(r#"{"result":"Benign"}"#),
            Err(DiagnosisError::Shape(_))
        );
        assert_matches!(parse_prediction("<html>"), Err(DiagnosisError::Shape(_)));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        assert_matches!(
            parse_prediction(r#"{"prediction":"Benign","confidence":87}"#),
            Err(DiagnosisError::ConfidenceOutOfRange(c)) if c == 87.0
        );
    }

    #[test]
    fn rejects_blank_label() {
        assert_matches!(
            parse_prediction(r#"{"prediction":"  ","confidence":0.3}"#),
            Err(DiagnosisError::EmptyLabel)
        );
    }

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(error_message(r#"{"detail":"bad image"}"#), "bad image");
        assert_eq!(
            error_message(r#"{"detail":"Model service not ready","error":"x"}"#),
            "Model service not ready"
        );
    }

    #[test]
    fn error_message_joins_validation_entries() {
        let body = r#"{"detail":[
            {"loc":["body","image"],"msg":"field required","type":"value_error.missing"},
            {"loc":["body","clinical_data"],"msg":"field required","type":"value_error.missing"}
        ]}"#;
        assert_eq!(error_message(body), "field required; field required");
    }

    #[test]
    fn error_message_falls_back() {
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(""), GENERIC_SERVER_ERROR);
        assert_eq!(error_message(r#"{"detail":null}"#), GENERIC_SERVER_ERROR);
        assert_eq!(error_message(r#"{"error":"quota exceeded"}"#), "quota exceeded");
    }
}
