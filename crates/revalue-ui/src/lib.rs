#![warn(missing_docs)]
//! # revalue-ui
//!
//! ## Purpose
//! Defines the rendering-facing presentation model for `revalue`.
//!
//! ## Responsibilities
//! - Format prediction values for display (two-decimal confidence
//!   percentages, rupee price strings).
//! - Build the result and history text lines view shells render.
//! - Represent one renderable snapshot of the upload flow as [`UploadView`].
//!
//! ## Data flow
//! The app facade projects controller state into [`UploadView`]; rendering
//! shells consume the view without reaching into controller internals.
//!
//! ## Ownership and lifetimes
//! Views own all their strings so renderers never borrow controller state.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors; formatting is
//! total.
//!
//! ## Security and privacy notes
//! Views carry display text and preview handle ids only, never image bytes.

use revalue_contract::PredictionResult;

/// Submit button label while a request is running.
pub const SUBMIT_LABEL_BUSY: &str = "Predicting...";

/// Submit button label when idle.
pub const SUBMIT_LABEL_READY: &str = "Predict";

/// One renderable snapshot of the upload flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadView {
    /// Single-line status summary.
    pub status_line: String,
    /// Whether a request is currently running.
    pub busy: bool,
    /// Whether the submit control should be enabled.
    pub can_submit: bool,
    /// Submit button label.
    pub submit_label: String,
    /// Rendered result lines; empty until a prediction succeeds.
    pub result_lines: Vec<String>,
    /// One caption per history entry, most recent first.
    pub history_captions: Vec<String>,
    /// Blocking error notification, when the last predict failed.
    pub error_banner: Option<String>,
}

/// Formats a `[0, 1]` confidence as a percentage with two decimal places.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

/// Formats an estimated price as a rupee display string.
pub fn format_price(price: f64) -> String {
    format!("\u{20B9}{price}")
}

/// Returns the submit button label for the busy flag.
pub fn submit_label(busy: bool) -> String {
    if busy {
        SUBMIT_LABEL_BUSY.to_string()
    } else {
        SUBMIT_LABEL_READY.to_string()
    }
}

/// Builds the rendered result block for one prediction.
pub fn result_lines(result: &PredictionResult) -> Vec<String> {
    let mut lines = vec![
        format!("Device: {}", result.item_type),
        format!("Confidence: {}", format_confidence(result.confidence)),
        format!("Estimated Price: {}", format_price(result.estimated_price)),
    ];

    if result.recyclers.is_empty() {
        lines.push("Recyclers: none matched".to_string());
    } else {
        lines.push(format!("Recyclers: {}", result.recyclers.join(", ")));
    }

    lines
}

/// Builds one history carousel caption.
pub fn history_caption(item_type: &str, estimated_price: f64) -> String {
    format!("{item_type} \u{B7} {}", format_price(estimated_price))
}
