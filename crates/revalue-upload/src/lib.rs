#![warn(missing_docs)]
//! # revalue-upload
//!
//! ## Purpose
//! Implements the predict endpoint wire codec and the upload client.
//!
//! ## Responsibilities
//! - Encode one selection plus auxiliary fields as multipart/form-data.
//! - Validate predict endpoint policy (`/predict/` path, parseable URL).
//! - Execute predict requests through an injectable transport abstraction.
//! - Classify failures as network, backend, or malformed-response errors.
//!
//! ## Data flow
//! [`revalue_core::UploadSelection`] + [`AuxiliaryFields`] ->
//! [`encode_multipart`] -> [`PredictClient::predict`] sends through
//! [`PredictTransport`] -> response body parsed by `revalue-contract`.
//!
//! ## Ownership and lifetimes
//! Encoded bodies are owned buffers so transports can send without borrowing
//! controller state across the request.
//!
//! ## Error model
//! Endpoint policy violations and request failures are surfaced as
//! [`RequestError`], with stable reason strings the UI can display directly.
//!
//! ## Security and privacy notes
//! Trace events record byte counts and statuses, never image bytes or whole
//! response bodies.

use std::sync::Arc;

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use revalue_contract::{PredictionResult, parse_backend_error, parse_prediction_response};
use revalue_core::UploadSelection;
use thiserror::Error;
use url::Url;

/// Required predict path suffix for v1.
pub const REQUIRED_PREDICT_PATH: &str = "/predict/";

/// Multipart field name carrying the image bytes.
pub const IMAGE_FIELD_NAME: &str = "image";

/// Default device condition sent when the user supplies none.
pub const DEFAULT_CONDITION: &str = "good";

/// Random length of generated multipart boundaries.
const BOUNDARY_RANDOM_LEN: usize = 24;

/// Auxiliary metadata form fields sent alongside the image.
///
/// Always encoded on the wire, empty or not; the plain upload variant sends
/// the defaults below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryFields {
    /// Device brand; empty when unknown.
    pub brand: String,
    /// Device age in months.
    pub age_months: u32,
    /// Device condition label.
    pub condition: String,
}

impl Default for AuxiliaryFields {
    fn default() -> Self {
        Self {
            brand: String::new(),
            age_months: 0,
            condition: DEFAULT_CONDITION.to_string(),
        }
    }
}

/// One encoded multipart/form-data request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    /// Boundary delimiter used between parts.
    pub boundary: String,
    /// Full encoded body bytes.
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    /// Returns the `Content-Type` header value for this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// One outgoing predict request handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictRequest {
    /// Fully validated endpoint URL.
    pub endpoint: String,
    /// `Content-Type` header value.
    pub content_type: String,
    /// Encoded multipart body bytes.
    pub body: Vec<u8>,
}

/// Raw HTTP response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl WireResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract transport used by the predict client.
///
/// Concrete implementations perform the actual HTTP exchange; tests inject
/// deterministic fakes. A transport must issue at most one request per call
/// and report connection-level failures as [`RequestError::Network`].
pub trait PredictTransport: Send + Sync {
    /// Sends one predict request and returns the raw response.
    fn send(&self, request: &PredictRequest) -> Result<WireResponse, RequestError>;
}

/// Predict client that validates endpoint policy and classifies failures.
#[derive(Clone)]
pub struct PredictClient {
    endpoint: String,
    transport: Arc<dyn PredictTransport>,
}

impl PredictClient {
    /// Creates a validated predict client.
    ///
    /// # Errors
    /// Returns [`RequestError::InvalidEndpoint`] when the URL does not parse,
    /// is not http(s), or lacks the required `/predict/` path suffix.
    pub fn new(
        endpoint: impl Into<String>,
        transport: Arc<dyn PredictTransport>,
    ) -> Result<Self, RequestError> {
        let endpoint = endpoint.into();
        validate_predict_endpoint(&endpoint)?;
        Ok(Self {
            endpoint,
            transport,
        })
    }

    /// Returns the configured predict endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issues exactly one predict POST and decodes the response.
    ///
    /// No retry and no client-side deadline; failure classification follows
    /// the wire contract: non-2xx -> backend error, transport failure ->
    /// network failure, undecodable success body -> malformed response.
    ///
    /// # Errors
    /// Returns the classified [`RequestError`]; the caller decides how the
    /// failure surfaces.
    pub fn predict(
        &self,
        selection: &UploadSelection,
        fields: &AuxiliaryFields,
    ) -> Result<PredictionResult, RequestError> {
        let body = encode_multipart(selection, fields);
        let request = PredictRequest {
            endpoint: self.endpoint.clone(),
            content_type: body.content_type(),
            body: body.bytes,
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            body_len = request.body.len(),
            "sending predict request"
        );

        let response = self.transport.send(&request).inspect_err(|error| {
            tracing::warn!(endpoint = %self.endpoint, %error, "predict transport failed");
        })?;

        if !response.is_success() {
            let detail = parse_backend_error(&response.body);
            tracing::warn!(status = response.status, "predict request rejected by backend");
            return Err(RequestError::Backend {
                status: response.status,
                detail,
            });
        }

        parse_prediction_response(&response.body).map_err(|error| {
            tracing::warn!(%error, "predict response failed contract checks");
            RequestError::Malformed(error.to_string())
        })
    }
}

/// Encodes one selection plus auxiliary fields as multipart/form-data.
///
/// Field layout matches the predict endpoint contract: `image` (binary part
/// with filename and content type), then `brand`, `age_months`, and
/// `condition` as text parts. The boundary is regenerated if the encoded
/// content happens to contain it.
pub fn encode_multipart(selection: &UploadSelection, fields: &AuxiliaryFields) -> MultipartBody {
    let boundary = loop {
        let candidate = generate_boundary();
        let delimiter = format!("--{candidate}");
        if !contains_sequence(&selection.bytes, delimiter.as_bytes()) {
            break candidate;
        }
    };

    let mut bytes = Vec::with_capacity(selection.bytes.len() + 512);

    append_part_header(&mut bytes, &boundary, IMAGE_FIELD_NAME, Some(selection));
    bytes.extend_from_slice(&selection.bytes);
    bytes.extend_from_slice(b"\r\n");

    append_text_part(&mut bytes, &boundary, "brand", &fields.brand);
    append_text_part(&mut bytes, &boundary, "age_months", &fields.age_months.to_string());
    append_text_part(&mut bytes, &boundary, "condition", &fields.condition);

    bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    MultipartBody { boundary, bytes }
}

/// Validates v1 predict endpoint constraints.
///
/// # Errors
/// Returns [`RequestError::InvalidEndpoint`] for unparseable URLs, non-http
/// schemes, or a path not ending in `/predict/`.
pub fn validate_predict_endpoint(endpoint: &str) -> Result<(), RequestError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| RequestError::InvalidEndpoint(format!("invalid predict url: {error}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(RequestError::InvalidEndpoint(
            "predict endpoint must use http or https".to_string(),
        ));
    }

    if !parsed.path().ends_with(REQUIRED_PREDICT_PATH) {
        return Err(RequestError::InvalidEndpoint(format!(
            "predict endpoint path must end with {REQUIRED_PREDICT_PATH}"
        )));
    }

    Ok(())
}

/// Errors produced by the predict client and its transports.
///
/// Cloneable so the controller can both record a failure and surface it to
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Endpoint violates wire contract requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Transport-level failure (connection refused, DNS failure, abort).
    #[error("network failure: {0}")]
    Network(String),
    /// Backend rejected the request with a non-2xx status.
    #[error("backend error: status {status}")]
    Backend {
        /// HTTP status the backend returned.
        status: u16,
        /// Optional `{"error": ...}` detail from the failure body.
        detail: Option<String>,
    },
    /// Success status with an undecodable or contract-violating body.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RequestError {
    /// Returns the stable display reason for this failure.
    pub fn reason(&self) -> &'static str {
        match self {
            RequestError::InvalidEndpoint(_) => "invalid endpoint",
            RequestError::Network(_) => "network failure",
            RequestError::Backend { .. } => "backend error",
            RequestError::Malformed(_) => "malformed response",
        }
    }
}

fn generate_boundary() -> String {
    let random: String = StdRng::from_os_rng()
        .sample_iter(Alphanumeric)
        .take(BOUNDARY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("revalue-{random}")
}

fn contains_sequence(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

fn append_part_header(
    bytes: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    file_part: Option<&UploadSelection>,
) {
    bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    match file_part {
        Some(selection) => {
            bytes.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n",
                    selection.file_name
                )
                .as_bytes(),
            );
            bytes.extend_from_slice(
                format!("Content-Type: {}\r\n\r\n", selection.content_type).as_bytes(),
            );
        }
        None => {
            bytes.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
        }
    }
}

fn append_text_part(bytes: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    append_part_header(bytes, boundary, name, None);
    bytes.extend_from_slice(value.as_bytes());
    bytes.extend_from_slice(b"\r\n");
}
