//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use revalue_contract::PredictionResult;
use revalue_upload::{PredictClient, PredictRequest, PredictTransport, RequestError, WireResponse};

/// Endpoint used by integration test clients.
#[allow(dead_code)]
pub const TEST_ENDPOINT: &str = "http://127.0.0.1:8000/predict/";

/// Deterministic JPEG-ish fixture bytes.
#[allow(dead_code)]
pub fn fixture_image_bytes(seed: u8) -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, seed, seed.wrapping_add(1)]
}

/// Success body matching the predict wire contract.
#[allow(dead_code)]
pub fn success_body(item_type: &str) -> String {
    serde_json::json!({
        "item_type": item_type,
        "confidence": 0.92,
        "estimated_price": 1500,
        "recyclers": ["GreenRecycle"]
    })
    .to_string()
}

/// Decoded counterpart of [`success_body`].
#[allow(dead_code)]
pub fn fixture_result(item_type: &str) -> PredictionResult {
    PredictionResult {
        item_type: item_type.to_string(),
        confidence: 0.92,
        estimated_price: 1500.0,
        recyclers: vec!["GreenRecycle".to_string()],
        price_confidence: None,
        probabilities: Default::default(),
    }
}

/// Scripted transport that replays queued outcomes and records requests.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<Vec<Result<WireResponse, RequestError>>>,
    requests: Mutex<Vec<PredictRequest>>,
}

impl ScriptedTransport {
    /// Creates a transport that replays `outcomes` in order.
    #[allow(dead_code)]
    pub fn new(outcomes: Vec<Result<WireResponse, RequestError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Creates a transport that always answers 200 with `body`.
    #[allow(dead_code)]
    pub fn always_ok(body: &str) -> Arc<Self> {
        Self::new(vec![Ok(WireResponse {
            status: 200,
            body: body.to_string(),
        })])
    }

    /// Returns recorded requests in send order.
    #[allow(dead_code)]
    pub fn recorded_requests(&self) -> Vec<PredictRequest> {
        self.requests.lock().expect("request lock should work").clone()
    }
}

impl PredictTransport for ScriptedTransport {
    fn send(&self, request: &PredictRequest) -> Result<WireResponse, RequestError> {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request.clone());

        let mut outcomes = self.outcomes.lock().expect("outcome lock should work");
        if outcomes.is_empty() {
            return Err(RequestError::Network(
                "scripted transport exhausted".to_string(),
            ));
        }

        let outcome = outcomes.remove(0);
        // The last scripted outcome replays forever.
        if outcomes.is_empty() {
            outcomes.push(clone_outcome(&outcome));
        }
        outcome
    }
}

fn clone_outcome(
    outcome: &Result<WireResponse, RequestError>,
) -> Result<WireResponse, RequestError> {
    match outcome {
        Ok(response) => Ok(response.clone()),
        Err(error) => Err(error.clone()),
    }
}

/// Builds a validated client over the given scripted transport.
#[allow(dead_code)]
pub fn make_client(transport: Arc<ScriptedTransport>) -> PredictClient {
    PredictClient::new(TEST_ENDPOINT, transport).expect("test client should build")
}
