//! Verify classification and mapping against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector file describes inputs and expected results. Comparing parsed
//! JSON (not raw strings) avoids false negatives from field ordering.

use roadtrack_core::mapping::map_order_dto;
use roadtrack_core::{classify, ApiError, HttpResponse, OrderDto, Outcome};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn classify_test_vectors() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            status_text: sim["status_text"].as_str().unwrap().to_string(),
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let expected = &case["expected"];

        match (expected["kind"].as_str().unwrap(), classify(response)) {
            ("success", Outcome::Success { payload, .. }) => {
                assert_eq!(payload.unwrap_or(Value::Null), expected["payload"], "{name}: payload");
            }
            ("http", Outcome::Failure(ApiError::Http(failure))) => {
                assert_eq!(
                    u64::from(failure.status),
                    expected["status"].as_u64().unwrap(),
                    "{name}: status"
                );
                assert_eq!(failure.body, expected["body"], "{name}: body");
                assert_eq!(
                    failure.message(),
                    expected["message"].as_str().unwrap(),
                    "{name}: message"
                );
            }
            ("deserialization", Outcome::Failure(ApiError::DeserializationError(_))) => {}
            (kind, outcome) => panic!("{name}: expected {kind}, got {outcome:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Order mapping
// ---------------------------------------------------------------------------

#[test]
fn order_mapping_test_vectors() {
    let raw = include_str!("../../test-vectors/orders.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let dto: OrderDto = serde_json::from_value(case["dto"].clone()).unwrap();

        let order = map_order_dto(&dto);
        assert_eq!(serde_json::to_value(&order).unwrap(), case["expected"], "{name}: mapped order");
        assert_eq!(order, map_order_dto(&dto), "{name}: mapping is pure");
    }
}
