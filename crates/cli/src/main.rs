//! `dxform` -- terminal front end for the diagnostic prediction service.
//!
//! Fills the form from command-line arguments, submits it once, prints
//! the diagnosis and waits for the spreadsheet sync (if configured) to
//! settle before exiting.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default                 | Description                          |
//! |-------------------------|----------|-------------------------|--------------------------------------|
//! | `API_URL`               | no       | `http://127.0.0.1:8000` | Prediction service base URL          |
//! | `SHEET_WEBHOOK_URL`     | no       | --                      | Spreadsheet webhook; sync off if unset |
//! | `CLINICAL_SCHEMA`       | no       | `ultrasound`            | Schema preset or JSON file           |
//! | `SHEET_IMAGE_MAX_CHARS` | no       | `50000`                 | Largest base64 image sent to the sheet |
//! | `REQUEST_TIMEOUT_SECS`  | no       | --                      | Prediction request timeout           |
//! | `RUST_LOG`              | no       | `dxform=info`           | Log filter                           |

mod cli;
mod terminal;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dxform_client::{ClientConfig, FormController, PredictionApi, SheetSync};
use dxform_core::{ClinicalSchema, FormView, ImagePayload};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;
use crate::terminal::TerminalView;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dxform=info,dxform_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Args::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "dxform failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut config = ClientConfig::from_env()?;
    args.apply(&mut config);

    let api = PredictionApi::with_timeout(config.api_url.clone(), config.request_timeout)
        .context("Failed to build HTTP client")?;

    if args.check {
        let health = api
            .health()
            .await
            .with_context(|| format!("Health check against {} failed", api.api_url()))?;
        println!(
            "{}: {}",
            health.status,
            health.message.as_deref().unwrap_or("(no message)")
        );
        return Ok(ExitCode::SUCCESS);
    }

    let schema = ClinicalSchema::resolve(&config.clinical_schema)?;

    tracing::info!(
        api_url = %config.api_url,
        mode = %args.mode,
        schema = %config.clinical_schema,
        sync = config.sheet_webhook_url.is_some(),
        "Starting dxform",
    );

    let mut controller = FormController::new(api, schema);
    if let Some(url) = &config.sheet_webhook_url {
        let sync = SheetSync::new(url.clone())
            .context("Failed to build sheet sync client")?
            .with_image_max_chars(config.sheet_image_max_chars);
        controller = controller.with_sync(sync);
    }

    let mut view = TerminalView::stdio();
    controller.select_mode(args.mode, &mut view);

    for (name, value) in &args.fields {
        if controller.schema().field(name).is_none() {
            tracing::warn!(field = %name, "Field is not part of the clinical schema, ignoring");
        }
        controller.set_field(name.clone(), value.clone());
    }

    if let Some(path) = &args.image {
        match ImagePayload::from_path(path) {
            Ok(image) => {
                eprintln!("Image: {}", image.summary());
                controller.select_image(Some(image));
            }
            Err(e) => {
                view.show_error(&e.to_string());
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    let submission = controller.submit(&mut view).await;

    if let Some(sync) = submission.sync {
        // Outcome is already logged by the task itself.
        let _ = sync.wait().await;
    }

    Ok(if submission.result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
