//! Integration tests for endpoint scheme checks.

use revalue_app::is_https_endpoint;

#[test]
fn transport_security_tests_distinguishes_https_endpoints() {
    assert!(is_https_endpoint("https://api.example.test/predict/"));
    assert!(!is_https_endpoint("http://127.0.0.1:8000/predict/"));
    assert!(!is_https_endpoint("not a url"));
}
