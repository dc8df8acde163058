#![warn(missing_docs)]
//! # revalue-contract
//!
//! ## Purpose
//! Defines the predict endpoint response schema and client-side parsing.
//!
//! ## Responsibilities
//! - Decode prediction response payloads into validated results.
//! - Reject contract violations (blank labels, out-of-range confidence).
//! - Extract the backend's `{"error": ...}` detail from failure bodies.
//!
//! ## Data flow
//! Raw JSON response body -> [`parse_prediction_response`] ->
//! [`PredictionResult`] consumed by controller state and history.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient network
//! buffers.
//!
//! ## Error model
//! Invalid JSON or missing mandatory fields return [`ContractError`].
//!
//! ## Security and privacy notes
//! This crate processes only model outputs and price metadata; it never sees
//! image bytes or raw form data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decoded classification and valuation result for one uploaded image.
///
/// Immutable once created; only a successful 2xx response produces one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted device label, for example `Laptop`.
    pub item_type: String,
    /// Model confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Estimated resale price in rupees.
    pub estimated_price: f64,
    /// Names of recyclers accepting this device category.
    pub recyclers: Vec<String>,
    /// Confidence attached to the price estimate, when the backend sends one.
    #[serde(default)]
    pub price_confidence: Option<f64>,
    /// Full per-class probability map, when the backend sends one.
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,
}

/// Failure body shape emitted by the backend on 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct BackendErrorBody {
    error: String,
}

/// Parses a raw JSON success body into a validated prediction result.
///
/// Unknown response fields are ignored so newer backend revisions do not
/// break older clients.
///
/// # Errors
/// Returns [`ContractError::Decode`] for invalid JSON or missing mandatory
/// fields, and [`ContractError::InvalidContract`] when decoded values violate
/// contract ranges.
pub fn parse_prediction_response(raw: &str) -> Result<PredictionResult, ContractError> {
    let parsed: PredictionResult = serde_json::from_str(raw).map_err(ContractError::Decode)?;

    if parsed.item_type.trim().is_empty() {
        return Err(ContractError::InvalidContract(
            "item_type is blank".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&parsed.confidence) {
        return Err(ContractError::InvalidContract(format!(
            "confidence {} is outside [0, 1]",
            parsed.confidence
        )));
    }

    if !parsed.estimated_price.is_finite() || parsed.estimated_price < 0.0 {
        return Err(ContractError::InvalidContract(format!(
            "estimated_price {} is not a valid price",
            parsed.estimated_price
        )));
    }

    Ok(parsed)
}

/// Extracts the backend error detail from a failure body, when present.
///
/// Bodies that are not JSON or not shaped `{"error": ...}` yield `None`; the
/// caller falls back to the bare HTTP status.
pub fn parse_backend_error(raw: &str) -> Option<String> {
    serde_json::from_str::<BackendErrorBody>(raw)
        .ok()
        .map(|body| body.error)
}

/// Prediction contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure, including missing mandatory fields.
    #[error("prediction decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("prediction contract violation: {0}")]
    InvalidContract(String),
}
