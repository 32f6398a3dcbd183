use std::time::Duration;

use dxform_core::schema::DEFAULT_PRESET;

use crate::sync::DEFAULT_IMAGE_MAX_CHARS;

/// Default prediction service for local development.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// An environment variable holds a value that cannot be used.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Prediction service base URL, without trailing slash.
    pub api_url: String,
    /// Spreadsheet webhook; sync is disabled when unset.
    pub sheet_webhook_url: Option<String>,
    /// Clinical schema preset name or path to a JSON schema file.
    pub clinical_schema: String,
    /// Largest base64 image forwarded to the sheet.
    pub sheet_image_max_chars: usize,
    /// Prediction request timeout; unbounded when unset.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            sheet_webhook_url: None,
            clinical_schema: DEFAULT_PRESET.to_string(),
            sheet_image_max_chars: DEFAULT_IMAGE_MAX_CHARS,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `API_URL`               | `http://127.0.0.1:8000` |
    /// | `SHEET_WEBHOOK_URL`     | unset (sync disabled)   |
    /// | `CLINICAL_SCHEMA`       | `ultrasound`            |
    /// | `SHEET_IMAGE_MAX_CHARS` | `50000`                 |
    /// | `REQUEST_TIMEOUT_SECS`  | unset (no timeout)      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let api_url = get("API_URL")
            .unwrap_or(defaults.api_url)
            .trim_end_matches('/')
            .to_string();

        let sheet_webhook_url = get("SHEET_WEBHOOK_URL");

        let clinical_schema = get("CLINICAL_SCHEMA").unwrap_or(defaults.clinical_schema);

        let sheet_image_max_chars = match get("SHEET_IMAGE_MAX_CHARS") {
            Some(v) => v.parse().map_err(|_| ConfigError {
                var: "SHEET_IMAGE_MAX_CHARS",
                expected: "a non-negative integer",
                value: v,
            })?,
            None => defaults.sheet_image_max_chars,
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError {
                        var: "REQUEST_TIMEOUT_SECS",
                        expected: "a positive integer",
                        value: v,
                    })
                }
            },
            None => None,
        };

        Ok(Self {
            api_url,
            sheet_webhook_url,
            clinical_schema,
            sheet_image_max_chars,
            request_timeout,
        })
    }
}
