//! HTTP adapter tests: routing, JSON shapes and status codes.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use dispatch_core::domains::incidents::DEFAULT_CONVERSATION_IDLE;
use dispatch_core::kernel::{MockMailer, TestDependencies};
use dispatch_core::server::build_app;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app_with(test_deps: TestDependencies) -> Router {
    let deps = test_deps.into_server_deps().await.unwrap();
    let (app, _worker) = build_app(deps, knowledge::DEFAULT_TOP_K, DEFAULT_CONVERSATION_IDLE);
    app
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn ping_and_health() {
    let app = app_with(TestDependencies::new()).await;

    let (status, body) = call(&app, "GET", "/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Works!");

    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"]["status"], "ok");
    assert_eq!(body["knowledge"]["status"], "unavailable");
}

#[tokio::test]
async fn lists_tool_definitions() {
    let app = app_with(TestDependencies::new()).await;

    let (status, body) = call(&app, "GET", "/tools", None).await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["function"]["name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"send_incident_note".to_string()));
    assert!(names.contains(&"consult_guidelines".to_string()));
}

#[tokio::test]
async fn photo_then_incident_over_http() {
    let mailer = MockMailer::new();
    let test_deps = TestDependencies::new().with_mailer(mailer);
    let sent = test_deps.mailer.clone();
    let app = app_with(test_deps).await;

    let (status, _) = call(
        &app,
        "POST",
        "/conversations/abc/photo",
        Some(json!({"url": "https://img.example/9.jpg", "analysis": "car on its roof"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Arguments as the JSON-encoded string the model emits.
    let arguments = json!({
        "incident_type": "car crash",
        "city": "Katowice",
        "location": "A4 exit 12",
        "casualties": 1,
        "details": "driver trapped",
        "recommended_service": "ambulance",
        "photo_summary": "minor scratch"
    })
    .to_string();

    let (status, body) = call(
        &app,
        "POST",
        "/conversations/abc/tools",
        Some(json!({"name": "send_incident_note", "arguments": arguments})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tool"], "send_incident_note");
    assert_eq!(body["output"], "Report sent to hospital@katowice.gov.pl.");

    let message = &sent.sent()[0];
    let incident: Value = serde_json::from_str(&message.body).unwrap();
    assert_eq!(incident["photo_analysis"], "car on its roof");
    assert_eq!(incident["casualties"], "1");
}

#[tokio::test]
async fn location_validation_and_conversation_end() {
    let app = app_with(TestDependencies::new()).await;

    let (status, _) = call(
        &app,
        "POST",
        "/conversations/xyz/location",
        Some(json!({"lat": 123.0, "lng": 19.0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = call(
        &app,
        "POST",
        "/conversations/xyz/location",
        Some(json!({"lat": 50.26, "lng": 19.02})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Location updated.");

    let (status, _) = call(&app, "DELETE", "/conversations/xyz", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "DELETE", "/conversations/xyz", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
