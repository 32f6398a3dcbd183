//! Command-line interface for the diagnostic form.
//!
//! # Usage
//!
//! ```bash
//! # Combined image + clinical submission
//! dxform --image scan.png --field Age=52 --field Shape=oval
//!
//! # Clinical fields only, against a specific service
//! dxform --mode clinical --api-url https://dx.example.com --field Age=52
//!
//! # Check that the service is up
//! dxform --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use dxform_client::ClientConfig;
use dxform_core::{FormFields, FormMode};

/// Submit an ultrasound image and/or clinical fields for a diagnosis.
///
/// Settings not given on the command line come from the environment
/// (`API_URL`, `SHEET_WEBHOOK_URL`, `CLINICAL_SCHEMA`, ...), optionally
/// loaded from a `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(name = "dxform")]
#[command(version)]
#[command(about = "Diagnostic form client for the prediction service", long_about = None)]
pub struct Args {
    /// Which inputs to submit: combined, clinical or image
    #[arg(short, long, default_value = "combined", value_parser = parse_mode)]
    pub mode: FormMode,

    /// Image file to attach (PNG, JPEG or WebP)
    #[arg(short, long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Clinical field value, repeatable
    #[arg(short, long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Prediction service base URL (overrides API_URL)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Clinical schema preset or JSON file (overrides CLINICAL_SCHEMA)
    #[arg(long, value_name = "PRESET|FILE")]
    pub schema: Option<String>,

    /// Spreadsheet webhook URL (overrides SHEET_WEBHOOK_URL)
    #[arg(long, value_name = "URL")]
    pub sheet_url: Option<String>,

    /// Do not forward the result to the spreadsheet webhook
    #[arg(long)]
    pub no_sync: bool,

    /// Only query the service health endpoint
    #[arg(long)]
    pub check: bool,
}

fn parse_mode(s: &str) -> Result<FormMode, String> {
    s.parse().map_err(|e: dxform_core::mode::ParseModeError| e.to_string())
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    FormFields::parse_assignment(s).ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))
}

impl Args {
    /// Apply command-line overrides on top of environment configuration.
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.api_url {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(schema) = &self.schema {
            config.clinical_schema = schema.clone();
        }
        if let Some(url) = &self.sheet_url {
            config.sheet_webhook_url = Some(url.clone());
        }
        if self.no_sync {
            config.sheet_webhook_url = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["dxform"]).unwrap();
        assert_eq!(args.mode, FormMode::Combined);
        assert!(args.image.is_none());
        assert!(args.fields.is_empty());
        assert!(!args.check);
    }

    #[test]
    fn repeated_fields_are_collected() {
        let args = Args::try_parse_from([
            "dxform", "--mode", "clinical", "-f", "Age=52", "--field", "Shape=oval",
        ])
        .unwrap();
        assert_eq!(args.mode, FormMode::Clinical);
        assert_eq!(
            args.fields,
            vec![
                ("Age".to_string(), "52".to_string()),
                ("Shape".to_string(), "oval".to_string())
            ]
        );
    }

    #[test]
    fn malformed_field_is_rejected() {
        assert!(Args::try_parse_from(["dxform", "--field", "Age"]).is_err());
        assert!(Args::try_parse_from(["dxform", "--mode", "tabular"]).is_err());
    }

    #[test]
    fn overrides_apply_to_config() {
        let args = Args::try_parse_from([
            "dxform",
            "--api-url",
            "http://dx.local:9000/",
            "--schema",
            "case",
            "--sheet-url",
            "http://sheet.local/exec",
        ])
        .unwrap();
        let mut config = ClientConfig::default();
        args.apply(&mut config);

        assert_eq!(config.api_url, "http://dx.local:9000");
        assert_eq!(config.clinical_schema, "case");
        assert_eq!(config.sheet_webhook_url.as_deref(), Some("http://sheet.local/exec"));
    }

    #[test]
    fn no_sync_wins() {
        let args =
            Args::try_parse_from(["dxform", "--sheet-url", "http://sheet.local", "--no-sync"])
                .unwrap();
        let mut config = ClientConfig::default();
        args.apply(&mut config);
        assert!(config.sheet_webhook_url.is_none());
    }
}
