//! Integration tests for the telemetry surface that hold without a
//! database: rejection ordering (validation before any side effect or
//! lookup), error codes, and the ambient middleware stack.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{body_json, create_offline_app, get_request, json_request};
use serde_json::json;
use tower::ServiceExt;

const DEVICE: &str = "550e8400-e29b-41d4-a716-446655440000";

#[tokio::test]
async fn test_liveness_probe() {
    let app = create_offline_app();
    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = create_offline_app();
    let response = app.oneshot(get_request("/api/v1/unknown")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_latitude_rejected_before_any_lookup() {
    // The pool never connects, so a 400 here proves the fix was rejected
    // before the device lookup or any store write.
    let app = create_offline_app();
    let request = json_request(
        Method::POST,
        "/api/v1/telemetry/location",
        json!({
            "device_id": DEVICE,
            "latitude": 120.0,
            "longitude": 9.19,
            "accuracy": 5.0,
            "timestamp": Utc::now().timestamp_millis()
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_fix");
    assert!(body["message"].as_str().unwrap().contains("latitude"));
}

#[tokio::test]
async fn test_stale_timestamp_rejected() {
    let app = create_offline_app();
    let request = json_request(
        Method::POST,
        "/api/v1/telemetry/location",
        json!({
            "device_id": DEVICE,
            "latitude": 45.46,
            "longitude": 9.19,
            "accuracy": 5.0,
            "timestamp": (Utc::now() - chrono::Duration::days(10)).timestamp_millis()
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_fix");
}

#[tokio::test]
async fn test_empty_nonce_rejected() {
    let app = create_offline_app();
    let request = json_request(
        Method::POST,
        "/api/v1/telemetry/location",
        json!({
            "device_id": DEVICE,
            "latitude": 45.46,
            "longitude": 9.19,
            "accuracy": 5.0,
            "timestamp": Utc::now().timestamp_millis(),
            "nonce": ""
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let app = create_offline_app();
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/telemetry/location")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_empty_batch_rejected_before_any_lookup() {
    let app = create_offline_app();
    let request = json_request(
        Method::POST,
        "/api/v1/telemetry/location/batch",
        json!({
            "device_id": DEVICE,
            "fixes": []
        }),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_history_requires_bus_id() {
    let app = create_offline_app();
    let response = app
        .oneshot(get_request("/api/v1/telemetry/history"))
        .await
        .unwrap();
    // Missing required query parameter never reaches a handler.
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = create_offline_app();
    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_request_id_echoed_on_response() {
    let app = create_offline_app();
    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
