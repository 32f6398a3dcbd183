//! Clinical field schema.
//!
//! The set of clinical fields the prediction backend expects has changed
//! between backend versions, so it is treated as data rather than code.
//! A [`ClinicalSchema`] lists the fields in the order the backend expects
//! them, how each is parsed, what default fills a missing value, and which
//! column it maps to in the sheet sync body.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;

/// Name of the preset used when nothing else is configured.
pub const DEFAULT_PRESET: &str = "ultrasound";

/// How a raw form value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    Text,
}

/// Largest integer a JSON consumer can hold exactly in a double.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A single clinical value, serialized as a bare JSON number or string.
///
/// Whole numbers serialize without a fraction (`45`, not `45.0`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Text(t) => serializer.serialize_str(t),
        }
    }
}

impl FieldValue {
    fn zero_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Number => FieldValue::Number(0.0),
            FieldKind::Text => FieldValue::Text(String::new()),
        }
    }

    fn matches(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (FieldValue::Number(_), FieldKind::Number) | (FieldValue::Text(_), FieldKind::Text)
        )
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// One clinical input field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicalField {
    /// Form key and key in the `clinical_data` JSON sent to the backend.
    pub name: String,
    /// Column name in the sheet sync body.
    pub sheet_key: String,
    pub kind: FieldKind,
    /// Value used when the form leaves the field blank or unparseable.
    pub default: FieldValue,
}

impl ClinicalField {
    pub fn number(name: &str, sheet_key: &str) -> Self {
        Self {
            name: name.to_string(),
            sheet_key: sheet_key.to_string(),
            kind: FieldKind::Number,
            default: FieldValue::Number(0.0),
        }
    }

    pub fn text(name: &str, sheet_key: &str) -> Self {
        Self {
            name: name.to_string(),
            sheet_key: sheet_key.to_string(),
            kind: FieldKind::Text,
            default: FieldValue::Text(String::new()),
        }
    }

    /// The value `raw` actually supplies for this field, if any.
    ///
    /// Text is trimmed and must be non-blank. Numbers are read from the
    /// longest numeric prefix, so `"52 years"` gives 52; input with no
    /// leading number, or one that overflows to infinity, supplies nothing.
    pub fn value_of(&self, raw: Option<&str>) -> Option<FieldValue> {
        let raw = raw.map(str::trim).filter(|v| !v.is_empty())?;
        match self.kind {
            FieldKind::Number => leading_number(raw).map(FieldValue::Number),
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
        }
    }

    /// Interpret a raw form value, falling back to the default.
    pub fn parse(&self, raw: Option<&str>) -> FieldValue {
        self.value_of(raw).unwrap_or_else(|| self.default.clone())
    }
}

/// Parse the longest prefix of `s` of the form
/// `[+-]digits[.digits][(e|E)[+-]digits]`, with at least one mantissa digit.
fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            mantissa_digits += frac_end - end - 1;
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// On-disk shape of a field; `sheet_key` and `default` are optional.
#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(default)]
    sheet_key: Option<String>,
    kind: FieldKind,
    #[serde(default)]
    default: Option<FieldValue>,
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    fields: Vec<RawField>,
}

/// Ordered list of clinical fields understood by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicalSchema {
    fields: Vec<ClinicalField>,
}

impl ClinicalSchema {
    /// Build a schema, rejecting empty lists, duplicate names and
    /// defaults whose type does not match the field kind.
    pub fn new(fields: Vec<ClinicalField>) -> Result<Self, ValidationError> {
        if fields.is_empty() {
            return Err(ValidationError::InvalidSchema(
                "schema has no fields".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(ValidationError::InvalidSchema(
                    "field name must not be blank".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ValidationError::InvalidSchema(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }
            if !field.default.matches(field.kind) {
                return Err(ValidationError::InvalidSchema(format!(
                    "default for '{}' does not match its kind",
                    field.name
                )));
            }
        }

        Ok(Self { fields })
    }

    /// Look up a built-in schema by name.
    ///
    /// * `ultrasound` - `Age`, `Shape`, `Margin`, `Tissue`, `Halo`.
    /// * `tabular`    - `age`, `tumor_size`.
    /// * `case`       - `CaseID`, `Pixel_size`.
    pub fn preset(name: &str) -> Option<Self> {
        let fields = match name.trim().to_ascii_lowercase().as_str() {
            "ultrasound" => ultrasound_fields(),
            "tabular" => vec![
                ClinicalField::number("age", "age"),
                ClinicalField::number("tumor_size", "tumor_size"),
            ],
            "case" => vec![
                ClinicalField::text("CaseID", "case_id"),
                ClinicalField::number("Pixel_size", "pixel_size"),
            ],
            _ => return None,
        };
        Some(Self { fields })
    }

    /// Parse a schema from its JSON definition.
    ///
    /// ```json
    /// {"fields": [{"name": "Age", "kind": "number", "sheet_key": "age", "default": 0}]}
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let raw: RawSchema = serde_json::from_str(json)
            .map_err(|e| ValidationError::InvalidSchema(e.to_string()))?;

        let fields = raw
            .fields
            .into_iter()
            .map(|f| ClinicalField {
                sheet_key: f.sheet_key.unwrap_or_else(|| f.name.to_lowercase()),
                default: f.default.unwrap_or_else(|| FieldValue::zero_for(f.kind)),
                name: f.name,
                kind: f.kind,
            })
            .collect();

        Self::new(fields)
    }

    /// Resolve a preset name, or failing that, a path to a JSON schema file.
    pub fn resolve(source: &str) -> Result<Self, ValidationError> {
        if let Some(schema) = Self::preset(source) {
            return Ok(schema);
        }

        let path = Path::new(source);
        let json = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::InvalidSchema(format!(
                "'{source}' is neither a preset nor a readable file: {e}"
            ))
        })?;
        Self::from_json(&json)
    }

    pub fn fields(&self) -> &[ClinicalField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ClinicalField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn ultrasound_fields() -> Vec<ClinicalField> {
    vec![
        ClinicalField::number("Age", "age"),
        ClinicalField::text("Shape", "shape"),
        ClinicalField::text("Margin", "margin"),
        ClinicalField::text("Tissue", "tissue"),
        ClinicalField::text("Halo", "halo"),
    ]
}

impl Default for ClinicalSchema {
    fn default() -> Self {
        Self {
            fields: ultrasound_fields(),
        }
    }
}
