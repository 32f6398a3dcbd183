//! Raw form input and the clinical record built from it.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::schema::{ClinicalSchema, FieldValue};

/// Raw string values keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parse a `NAME=VALUE` pair, as given on a command line.
    pub fn parse_assignment(pair: &str) -> Option<(String, String)> {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name.to_string(), value.to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Clinical values in schema order, ready to be sent to the backend.
///
/// Serializes as a JSON object whose keys keep the schema order, since the
/// backend feeds the values to its scaler positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalRecord {
    entries: Vec<(String, FieldValue)>,
}

impl ClinicalRecord {
    /// Build a record for every schema field from the current form values.
    pub fn from_fields(schema: &ClinicalSchema, fields: &FormFields) -> Self {
        let entries = schema
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.parse(fields.get(&f.name))))
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON text sent as the `clinical_data` multipart part.
    pub fn to_json(&self) -> String {
        // A map of strings and finite numbers cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for ClinicalRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_defaults_for_missing_values() {
        let schema = ClinicalSchema::default();
        let fields = FormFields::new().with("Age", "52").with("Shape", "oval");

        let record = ClinicalRecord::from_fields(&schema, &fields);

        assert_eq!(record.len(), 5);
        assert_eq!(record.get("Age"), Some(&FieldValue::Number(52.0)));
        assert_eq!(record.get("Shape"), Some(&FieldValue::Text("oval".into())));
        assert_eq!(record.get("Halo"), Some(&FieldValue::Text(String::new())));
    }

    #[test]
    fn unknown_form_keys_are_ignored() {
        let schema = ClinicalSchema::preset("tabular").unwrap();
        let fields = FormFields::new().with("colour", "blue");

        let record = ClinicalRecord::from_fields(&schema, &fields);

        assert!(record.get("colour").is_none());
        assert_eq!(record.get("age"), Some(&FieldValue::Number(0.0)));
    }

    #[test]
    fn json_keeps_schema_order() {
        let schema = ClinicalSchema::preset("tabular").unwrap();
        let fields = FormFields::new().with("tumor_size", "2.5").with("age", "45");

        let json = ClinicalRecord::from_fields(&schema, &fields).to_json();

        assert_eq!(json, r#"{"age":45,"tumor_size":2.5}"#);
    }

    #[test]
    fn numbers_with_units_keep_their_leading_value() {
        let schema = ClinicalSchema::preset("tabular").unwrap();
        let fields = FormFields::new()
            .with("age", "52 years")
            .with("tumor_size", "2.5cm");

        let json = ClinicalRecord::from_fields(&schema, &fields).to_json();

        assert_eq!(json, r#"{"age":52,"tumor_size":2.5}"#);
    }

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        assert_eq!(
            FormFields::parse_assignment("Margin=a=b"),
            Some(("Margin".to_string(), "a=b".to_string()))
        );
        assert_eq!(FormFields::parse_assignment("=5"), None);
        assert_eq!(FormFields::parse_assignment("Age"), None);
    }
}
