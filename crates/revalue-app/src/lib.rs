#![warn(missing_docs)]
//! # revalue-app
//!
//! ## Purpose
//! Orchestrates selection, upload, contract parsing, and view projection for
//! `revalue`.
//!
//! ## Responsibilities
//! - Resolve the predict endpoint from configuration.
//! - Build validated predict clients over injected transports.
//! - Drive the upload controller through full predict flows.
//! - Project controller state into the renderable [`UploadView`].
//!
//! ## Data flow
//! File pick -> [`UploadController`] selection -> predict via
//! [`PredictClient`] -> result/history state -> [`project_upload_view`] ->
//! rendering shell.
//!
//! ## Ownership and lifetimes
//! This crate passes owned snapshots between subsystems to avoid hidden
//! aliasing between the controller and the rendering layer.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`] and categorized for runtime
//! observability.
//!
//! ## Security and privacy notes
//! - Non-HTTPS endpoints are allowed (local development default) but logged.
//! - No image bytes or response bodies appear in trace events.

use revalue_contract::PredictionResult;
use revalue_controller::{ControllerError, ControllerState, UploadController};
use revalue_ui::{UploadView, history_caption, result_lines, submit_label};
use revalue_upload::{AuxiliaryFields, PredictClient, PredictTransport, RequestError};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("REVALUE_VERSION");

/// Default predict endpoint used when no override is configured.
pub const DEFAULT_PREDICT_ENDPOINT: &str = "http://127.0.0.1:8000/predict/";

/// Environment variable overriding the predict endpoint.
pub const PREDICT_ENDPOINT_ENV: &str = "REVALUE_PREDICT_ENDPOINT";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Resolves the predict endpoint from the environment.
///
/// Semantics:
/// - Unset or blank => [`DEFAULT_PREDICT_ENDPOINT`].
/// - Any other value => used as-is (validated when the client is built).
pub fn predict_endpoint_from_env() -> String {
    match std::env::var(PREDICT_ENDPOINT_ENV) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => DEFAULT_PREDICT_ENDPOINT.to_string(),
    }
}

/// Returns `true` when endpoint URL is HTTPS.
pub fn is_https_endpoint(endpoint: &str) -> bool {
    Url::parse(endpoint)
        .map(|url| url.scheme() == "https")
        .unwrap_or(false)
}

/// Builds a validated predict client over the given transport.
///
/// # Errors
/// Returns [`AppError::Client`] when the endpoint violates wire contract
/// policy.
pub fn build_predict_client(
    endpoint: impl Into<String>,
    transport: Arc<dyn PredictTransport>,
) -> Result<PredictClient, AppError> {
    let endpoint = endpoint.into();
    if !is_https_endpoint(&endpoint) {
        tracing::warn!(%endpoint, "predict endpoint is not https");
    }

    PredictClient::new(endpoint, transport).map_err(AppError::Client)
}

/// Runs one full predict flow for the controller's current selection.
///
/// # Errors
/// Returns [`AppError::Controller`] for validation/guard failures and for
/// classified request failures; the controller always ends in a stable state.
pub fn run_predict(
    controller: &mut UploadController,
    client: &PredictClient,
    fields: &AuxiliaryFields,
) -> Result<PredictionResult, AppError> {
    controller.predict(client, fields).map_err(AppError::Controller)
}

/// Projects controller state into one renderable view snapshot.
pub fn project_upload_view(controller: &UploadController) -> UploadView {
    let state = controller.state();
    let busy = state == ControllerState::Predicting;

    let status_line = match state {
        ControllerState::Idle => "Upload an electronic waste image to begin".to_string(),
        ControllerState::FileSelected => match controller.selection() {
            Some(selection) => format!("Ready to predict {}", selection.file_name),
            None => "Ready to predict".to_string(),
        },
        ControllerState::Predicting => "Predicting...".to_string(),
        ControllerState::Succeeded => "Prediction complete".to_string(),
        ControllerState::Failed => "Prediction failed".to_string(),
    };

    let result_block = controller
        .result()
        .map(result_lines)
        .unwrap_or_default();

    let history_captions = controller
        .history()
        .iter()
        .map(|entry| history_caption(&entry.item_type, entry.estimated_price))
        .collect();

    UploadView {
        status_line,
        busy,
        can_submit: controller.selection().is_some() && !busy,
        submit_label: submit_label(busy),
        result_lines: result_block,
        history_captions,
        error_banner: controller.last_failure().map(failure_banner),
    }
}

/// Builds the blocking notification text for one request failure.
pub fn failure_banner(failure: &RequestError) -> String {
    match failure {
        RequestError::Backend {
            detail: Some(detail),
            ..
        } => format!("Prediction failed: {detail}"),
        other => format!("Prediction failed: {}", other.reason()),
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Controller lifecycle error.
    #[error("controller error: {0}")]
    Controller(ControllerError),
    /// Predict client construction or request error.
    #[error("client error: {0}")]
    Client(RequestError),
}
