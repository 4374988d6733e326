use super::support::{TestApp, response_json};
use axum::http::StatusCode;

#[tokio::test]
async fn exposes_configured_map_key() {
    let app = TestApp::with_config(|config| {
        config.map.api_key = Some("pk.test-key".into());
    });
    let response = app.get("/api/client-config").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["mapApiKey"], "pk.test-key");
}

#[tokio::test]
async fn missing_map_key_is_null() {
    let app = TestApp::new();
    let json = response_json(app.get("/api/client-config").await).await;
    assert!(json["mapApiKey"].is_null());
}

#[tokio::test]
async fn unknown_api_route_uses_error_envelope() {
    let app = TestApp::new();
    let response = app.get("/api/albums").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response_json(response).await["error"]["code"],
        "RESOURCE_NOT_FOUND"
    );
}
