#![warn(missing_docs)]
//! # revalue-controller
//!
//! ## Purpose
//! Implements the upload-and-predict interaction lifecycle for `revalue`.
//!
//! ## Responsibilities
//! - Model the `Idle -> FileSelected -> Predicting -> Succeeded/Failed`
//!   state machine with explicit legal transitions.
//! - Guard against concurrent in-flight predictions and stale completions.
//! - Maintain the bounded most-recent-first history of past predictions.
//! - Enforce preview handle release on supersede, eviction, and teardown.
//!
//! ## Data flow
//! UI events call [`UploadController::select_file`] and
//! [`UploadController::predict`]; the controller drives the upload client and
//! records outcomes. Split callers use [`UploadController::begin_predict`] /
//! [`UploadController::complete_predict`] with a [`RequestToken`].
//!
//! ## Ownership and lifetimes
//! The controller owns its selection, result, history, and preview registry.
//! There is exactly one mutable controller per session; no cross-thread
//! sharing is required, so no locking exists here.
//!
//! ## Error model
//! Validation failures and request failures surface as [`ControllerError`].
//! A failed predict leaves the controller in a stable `Failed` state from
//! which a new selection is the only recovery path.
//!
//! ## Security and privacy notes
//! Trace events record states, tokens, and failure reasons; never image
//! bytes.
//!
//! ## Example
//! ```rust
//! use revalue_controller::{ControllerState, UploadController};
//!
//! let mut controller = UploadController::new();
//! assert_eq!(controller.state(), ControllerState::Idle);
//! controller
//!     .select_file("phone.jpg", "image/jpeg", vec![1, 2, 3])
//!     .unwrap();
//! assert_eq!(controller.state(), ControllerState::FileSelected);
//! ```

use revalue_contract::PredictionResult;
use revalue_core::{CoreError, PreviewHandle, PreviewRegistry, UploadSelection};
use revalue_upload::{AuxiliaryFields, PredictClient, RequestError};
use thiserror::Error;

/// Maximum number of retained history entries.
pub const HISTORY_CAPACITY: usize = 5;

/// Lifecycle state of the upload controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// No file has been selected yet.
    #[default]
    Idle,
    /// A file is selected and ready to submit.
    FileSelected,
    /// A predict request is in flight.
    Predicting,
    /// The last predict completed successfully.
    Succeeded,
    /// The last predict failed; a new selection is the recovery path.
    Failed,
}

/// Opaque token identifying one in-flight predict request.
///
/// A completion carrying a token that is no longer current is dropped, which
/// is how superseded requests are cancelled without transport-level abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Returns the raw token value.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Snapshot pairing a preview handle with a successful prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Dedicated preview handle owned by this entry.
    pub preview: PreviewHandle,
    /// Predicted device label.
    pub item_type: String,
    /// Model confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Estimated resale price in rupees.
    pub estimated_price: f64,
    /// Matched recycler names.
    pub recyclers: Vec<String>,
}

/// Outcome of applying one predict completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The completion was current and recorded a success.
    Succeeded,
    /// The completion was current and recorded a failure.
    Failed,
    /// The token was superseded; nothing was mutated.
    StaleDropped,
}

/// Owns the interaction lifecycle for one upload session.
#[derive(Debug, Default)]
pub struct UploadController {
    state: ControllerState,
    selection: Option<UploadSelection>,
    result: Option<PredictionResult>,
    last_failure: Option<RequestError>,
    history: Vec<HistoryEntry>,
    previews: PreviewRegistry,
    in_flight: Option<RequestToken>,
    next_token: u64,
}

impl UploadController {
    /// Creates a controller in the `Idle` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Returns the current selection, if any.
    pub fn selection(&self) -> Option<&UploadSelection> {
        self.selection.as_ref()
    }

    /// Returns the latest successful prediction, if any.
    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    /// Returns the recorded failure for the `Failed` state, if any.
    pub fn last_failure(&self) -> Option<&RequestError> {
        self.last_failure.as_ref()
    }

    /// Returns history entries, most recent first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Returns the in-flight request token, if a predict is running.
    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }

    /// Returns the number of currently live preview handles.
    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    /// Returns the number of preview handles released so far.
    pub fn released_previews(&self) -> usize {
        self.previews.released_count()
    }

    /// Replaces the current selection.
    ///
    /// Allowed from every state. Releases the superseded selection's preview
    /// exactly once, discards any prior result and failure, and invalidates
    /// any in-flight request token so its late completion is dropped.
    ///
    /// # Errors
    /// Returns [`ControllerError::Selection`] when the file fails validation;
    /// state is left untouched in that case.
    pub fn select_file(
        &mut self,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<(), ControllerError> {
        let selection = UploadSelection::new(file_name, content_type, bytes, &mut self.previews)?;

        if let Some(previous) = self.selection.take() {
            self.previews.release(&previous.preview)?;
        }

        if let Some(token) = self.in_flight.take() {
            tracing::debug!(
                token = token.value(),
                "new selection supersedes in-flight predict"
            );
        }

        tracing::debug!(file_name = %selection.file_name, "selection replaced");
        self.selection = Some(selection);
        self.result = None;
        self.last_failure = None;
        self.state = ControllerState::FileSelected;
        Ok(())
    }

    /// Starts one predict request and returns its token.
    ///
    /// # Errors
    /// Returns [`ControllerError::NoSelection`] when no file is selected and
    /// [`ControllerError::PredictionInFlight`] while a request is running.
    /// Neither error changes state.
    pub fn begin_predict(&mut self) -> Result<RequestToken, ControllerError> {
        if self.in_flight.is_some() {
            return Err(ControllerError::PredictionInFlight);
        }

        if self.selection.is_none() {
            return Err(ControllerError::NoSelection);
        }

        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.in_flight = Some(token);
        self.state = ControllerState::Predicting;
        tracing::debug!(token = token.value(), "predict started");
        Ok(token)
    }

    /// Applies the outcome of one predict request.
    ///
    /// A stale token (superseded by a newer selection or teardown) is dropped
    /// without touching state or history. A success prepends a history entry
    /// with its own preview handle and truncates history to
    /// [`HISTORY_CAPACITY`], releasing evicted previews. A failure records
    /// the error and leaves history untouched.
    pub fn complete_predict(
        &mut self,
        token: RequestToken,
        outcome: Result<PredictionResult, RequestError>,
    ) -> Completion {
        if self.in_flight != Some(token) {
            tracing::debug!(token = token.value(), "dropping stale predict completion");
            return Completion::StaleDropped;
        }

        self.in_flight = None;

        match outcome {
            Ok(result) => {
                let Some(selection) = self.selection.as_ref() else {
                    // A current token implies a live selection; treat the
                    // inconsistency as a stale response.
                    tracing::warn!(token = token.value(), "completion without selection dropped");
                    return Completion::StaleDropped;
                };

                let preview = self.previews.acquire(&selection.bytes);
                self.history.insert(
                    0,
                    HistoryEntry {
                        preview,
                        item_type: result.item_type.clone(),
                        confidence: result.confidence,
                        estimated_price: result.estimated_price,
                        recyclers: result.recyclers.clone(),
                    },
                );

                while self.history.len() > HISTORY_CAPACITY {
                    if let Some(evicted) = self.history.pop()
                        && let Err(error) = self.previews.release(&evicted.preview)
                    {
                        tracing::warn!(%error, "evicted history preview release failed");
                    }
                }

                tracing::debug!(item_type = %result.item_type, "predict succeeded");
                self.result = Some(result);
                self.last_failure = None;
                self.state = ControllerState::Succeeded;
                Completion::Succeeded
            }
            Err(error) => {
                tracing::warn!(reason = error.reason(), "predict failed");
                self.last_failure = Some(error);
                self.state = ControllerState::Failed;
                Completion::Failed
            }
        }
    }

    /// Runs the full predict flow against a client, blocking until complete.
    ///
    /// # Errors
    /// Returns guard errors from [`UploadController::begin_predict`] or the
    /// classified [`ControllerError::Request`] failure; either way the
    /// controller ends in a stable state.
    pub fn predict(
        &mut self,
        client: &PredictClient,
        fields: &AuxiliaryFields,
    ) -> Result<PredictionResult, ControllerError> {
        let token = self.begin_predict()?;

        let outcome = match self.selection.as_ref() {
            Some(selection) => client.predict(selection, fields),
            None => Err(RequestError::Network(
                "selection was cleared mid-predict".to_string(),
            )),
        };

        let returned = match &outcome {
            Ok(result) => Ok(result.clone()),
            Err(error) => Err(ControllerError::Request(error.clone())),
        };

        self.complete_predict(token, outcome);
        returned
    }

    /// Releases every live preview handle and resets to `Idle`.
    pub fn teardown(&mut self) {
        if let Some(selection) = self.selection.take()
            && let Err(error) = self.previews.release(&selection.preview)
        {
            tracing::warn!(%error, "selection preview release failed during teardown");
        }

        for entry in self.history.drain(..) {
            if let Err(error) = self.previews.release(&entry.preview) {
                tracing::warn!(%error, "history preview release failed during teardown");
            }
        }

        self.in_flight = None;
        self.result = None;
        self.last_failure = None;
        self.state = ControllerState::Idle;
        tracing::debug!("controller torn down");
    }
}

/// Errors produced by controller transitions.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Predict was requested with no file selected.
    #[error("no file selected")]
    NoSelection,
    /// Predict was requested while another request is in flight.
    #[error("a prediction is already in flight")]
    PredictionInFlight,
    /// Selection validation or preview handle failure.
    #[error("selection error: {0}")]
    Selection(#[from] CoreError),
    /// Classified request failure.
    #[error("request error: {0}")]
    Request(#[from] RequestError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for lifecycle transitions and guards.

    use super::*;

    fn fixture_result(item_type: &str) -> PredictionResult {
        PredictionResult {
            item_type: item_type.to_string(),
            confidence: 0.92,
            estimated_price: 1500.0,
            recyclers: vec!["GreenRecycle".to_string()],
            price_confidence: None,
            probabilities: Default::default(),
        }
    }

    #[test]
    fn predict_without_selection_is_a_validation_error() {
        let mut controller = UploadController::new();
        assert!(matches!(
            controller.begin_predict(),
            Err(ControllerError::NoSelection)
        ));
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn reselect_releases_previous_preview_exactly_once() {
        let mut controller = UploadController::new();
        controller
            .select_file("a.jpg", "image/jpeg", vec![1])
            .expect("first selection should work");
        controller
            .select_file("b.jpg", "image/jpeg", vec![2])
            .expect("second selection should work");

        assert_eq!(controller.live_previews(), 1);
        assert_eq!(controller.released_previews(), 1);
        assert_eq!(
            controller.selection().map(|s| s.file_name.as_str()),
            Some("b.jpg")
        );
    }

    #[test]
    fn invalid_selection_leaves_state_untouched() {
        let mut controller = UploadController::new();
        controller
            .select_file("a.jpg", "image/jpeg", vec![1])
            .expect("selection should work");
        let result = controller.select_file("b.txt", "text/plain", vec![2]);

        assert!(result.is_err());
        assert_eq!(controller.state(), ControllerState::FileSelected);
        assert_eq!(
            controller.selection().map(|s| s.file_name.as_str()),
            Some("a.jpg")
        );
    }

    #[test]
    fn second_begin_predict_is_rejected_while_in_flight() {
        let mut controller = UploadController::new();
        controller
            .select_file("a.jpg", "image/jpeg", vec![1])
            .expect("selection should work");
        let _token = controller.begin_predict().expect("first predict starts");

        assert!(matches!(
            controller.begin_predict(),
            Err(ControllerError::PredictionInFlight)
        ));
        assert_eq!(controller.state(), ControllerState::Predicting);
    }

    #[test]
    fn successful_completion_records_result_and_history() {
        let mut controller = UploadController::new();
        controller
            .select_file("a.jpg", "image/jpeg", vec![1])
            .expect("selection should work");
        let token = controller.begin_predict().expect("predict starts");

        let completion = controller.complete_predict(token, Ok(fixture_result("Smartphone")));

        assert_eq!(completion, Completion::Succeeded);
        assert_eq!(controller.state(), ControllerState::Succeeded);
        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.history()[0].item_type, "Smartphone");
        assert_eq!(
            controller.result().map(|r| r.item_type.as_str()),
            Some("Smartphone")
        );
    }

    #[test]
    fn failed_completion_preserves_history() {
        let mut controller = UploadController::new();
        controller
            .select_file("a.jpg", "image/jpeg", vec![1])
            .expect("selection should work");
        let token = controller.begin_predict().expect("predict starts");
        controller.complete_predict(token, Ok(fixture_result("Smartphone")));

        let token = controller.begin_predict().expect("second predict starts");
        let completion = controller.complete_predict(
            token,
            Err(RequestError::Backend {
                status: 500,
                detail: None,
            }),
        );

        assert_eq!(completion, Completion::Failed);
        assert_eq!(controller.state(), ControllerState::Failed);
        assert_eq!(controller.history().len(), 1);
        assert_eq!(
            controller.last_failure().map(RequestError::reason),
            Some("backend error")
        );
    }

    #[test]
    fn stale_completion_after_reselect_is_dropped() {
        let mut controller = UploadController::new();
        controller
            .select_file("a.jpg", "image/jpeg", vec![1])
            .expect("selection should work");
        let token = controller.begin_predict().expect("predict starts");

        controller
            .select_file("b.jpg", "image/jpeg", vec![2])
            .expect("superseding selection should work");

        let completion = controller.complete_predict(token, Ok(fixture_result("Smartphone")));

        assert_eq!(completion, Completion::StaleDropped);
        assert_eq!(controller.state(), ControllerState::FileSelected);
        assert!(controller.history().is_empty());
        assert!(controller.result().is_none());
    }

    #[test]
    fn history_is_capped_and_evicts_oldest() {
        let mut controller = UploadController::new();

        for index in 0..7_u8 {
            controller
                .select_file(format!("{index}.jpg"), "image/jpeg", vec![index + 1])
                .expect("selection should work");
            let token = controller.begin_predict().expect("predict starts");
            controller.complete_predict(token, Ok(fixture_result(&format!("Device{index}"))));
        }

        assert_eq!(controller.history().len(), HISTORY_CAPACITY);
        assert_eq!(controller.history()[0].item_type, "Device6");
        assert_eq!(controller.history()[4].item_type, "Device2");
        // Live handles: current selection + capped history entries.
        assert_eq!(controller.live_previews(), HISTORY_CAPACITY + 1);
    }

    #[test]
    fn teardown_releases_every_live_preview() {
        let mut controller = UploadController::new();
        controller
            .select_file("a.jpg", "image/jpeg", vec![1])
            .expect("selection should work");
        let token = controller.begin_predict().expect("predict starts");
        controller.complete_predict(token, Ok(fixture_result("Smartphone")));

        controller.teardown();

        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(controller.live_previews(), 0);
        assert!(controller.history().is_empty());
    }
}
