//! Integration tests for controller-to-view projection.

mod common;

use revalue_app::{project_upload_view, run_predict};
use revalue_controller::UploadController;
use revalue_upload::{AuxiliaryFields, RequestError, WireResponse};

#[test]
fn upload_view_projection_tests_idle_view_blocks_submission() {
    let controller = UploadController::new();
    let view = project_upload_view(&controller);

    assert!(!view.busy);
    assert!(!view.can_submit);
    assert_eq!(view.submit_label, "Predict");
    assert!(view.result_lines.is_empty());
    assert!(view.error_banner.is_none());
}

#[test]
fn upload_view_projection_tests_busy_view_disables_resubmission() {
    let mut controller = UploadController::new();
    controller
        .select_file("phone.jpg", "image/jpeg", common::fixture_image_bytes(1))
        .expect("selection should work");
    let _token = controller.begin_predict().expect("predict starts");

    let view = project_upload_view(&controller);
    assert!(view.busy);
    assert!(!view.can_submit);
    assert_eq!(view.submit_label, "Predicting...");
    assert_eq!(view.status_line, "Predicting...");
}

#[test]
fn upload_view_projection_tests_success_view_renders_result_and_history() {
    let transport = common::ScriptedTransport::always_ok(&common::success_body("Smartphone"));
    let client = common::make_client(transport);
    let mut controller = UploadController::new();

    controller
        .select_file("phone.jpg", "image/jpeg", common::fixture_image_bytes(1))
        .expect("selection should work");
    run_predict(&mut controller, &client, &AuxiliaryFields::default())
        .expect("predict should succeed");

    let view = project_upload_view(&controller);
    assert_eq!(view.status_line, "Prediction complete");
    assert_eq!(view.result_lines[0], "Device: Smartphone");
    assert_eq!(view.result_lines[1], "Confidence: 92.00%");
    assert_eq!(view.result_lines[2], "Estimated Price: \u{20B9}1500");
    assert_eq!(view.history_captions.len(), 1);
    assert!(view.history_captions[0].starts_with("Smartphone"));
    assert!(view.can_submit);
}

#[test]
fn upload_view_projection_tests_failure_view_carries_backend_detail() {
    let transport = common::ScriptedTransport::new(vec![Ok(WireResponse {
        status: 400,
        body: r#"{"error": "Invalid image file."}"#.to_string(),
    })]);
    let client = common::make_client(transport);
    let mut controller = UploadController::new();

    controller
        .select_file("phone.jpg", "image/jpeg", common::fixture_image_bytes(1))
        .expect("selection should work");
    let _ = run_predict(&mut controller, &client, &AuxiliaryFields::default());

    let view = project_upload_view(&controller);
    assert_eq!(view.status_line, "Prediction failed");
    assert_eq!(
        view.error_banner.as_deref(),
        Some("Prediction failed: Invalid image file.")
    );
    assert!(view.can_submit);
}

#[test]
fn upload_view_projection_tests_network_failure_uses_reason_text() {
    let transport = common::ScriptedTransport::new(vec![Err(RequestError::Network(
        "dns lookup failed".to_string(),
    ))]);
    let client = common::make_client(transport);
    let mut controller = UploadController::new();

    controller
        .select_file("phone.jpg", "image/jpeg", common::fixture_image_bytes(1))
        .expect("selection should work");
    let _ = run_predict(&mut controller, &client, &AuxiliaryFields::default());

    let view = project_upload_view(&controller);
    assert_eq!(
        view.error_banner.as_deref(),
        Some("Prediction failed: network failure")
    );
}
