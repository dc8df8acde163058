#![warn(missing_docs)]
//! # revalue-app binary
//!
//! Minimal status entry point; rendering shells link against the library.

/// CLI entry point.
fn main() {
    let endpoint = revalue_app::predict_endpoint_from_env();
    println!("revalue-app {}", revalue_app::app_version());
    println!(
        "predict_endpoint={endpoint} https={} ({})",
        revalue_app::is_https_endpoint(&endpoint),
        revalue_app::PREDICT_ENDPOINT_ENV
    );
}
