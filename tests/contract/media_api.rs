use super::support::{TestApp, ids, response_json};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn without_query_lists_newest_first() {
    let app = TestApp::new();
    let response = app.get("/api/media").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(ids(&json), vec![13, 12, 11, 10]);
    assert_eq!(json[0]["thumbnailPath"], "thumbnails/13.jpg");
    assert_eq!(json[0]["mediaType"], "image");
    assert!(json[0].get("tags").is_none(), "summaries omit tags");
}

#[tokio::test]
async fn parent_tag_matches_descendants_ordered_by_capture_time() {
    let app = TestApp::new();
    let json = response_json(app.get("/api/media?q=animals").await).await;
    assert_eq!(ids(&json), vec![11, 10]);

    let json = response_json(app.get("/api/media?q=places").await).await;
    assert_eq!(ids(&json), vec![10, 12], "unknown capture time sorts last");
}

#[tokio::test]
async fn every_token_must_match() {
    let app = TestApp::new();
    let json = response_json(app.get("/api/media?q=animals+sweden").await).await;
    assert_eq!(ids(&json), vec![10]);

    let json = response_json(app.get("/api/media?q=birds+sweden").await).await;
    assert!(ids(&json).is_empty());

    let json = response_json(app.get("/api/media?q=cats+unicorns").await).await;
    assert!(ids(&json).is_empty());
}

#[tokio::test]
async fn get_returns_full_record() {
    let app = TestApp::new();
    let response = app.get("/api/media/10").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["previewPath"], "previews/10.jpg");
    assert_eq!(json["tags"].as_array().expect("tags").len(), 2);

    let response = app.get("/api/media/404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/media/not-a-number").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await["error"]["code"],
        "VALIDATION_FAILED"
    );
}

#[tokio::test]
async fn put_replaces_tag_set_and_persists() {
    let app = TestApp::new();
    let mut entity = response_json(app.get("/api/media/13").await).await;
    entity["tags"] = json!([
        { "id": 3, "name": "birds", "canonicalName": "birds", "parentId": 1 },
        { "id": 6, "name": "Åre", "canonicalName": "are", "parentId": 5 },
    ]);

    let response = app.send_json(Method::PUT, "/api/media/13", &entity).await;
    assert_eq!(response.status(), StatusCode::OK);
    let saved = response_json(response).await;
    assert_eq!(saved["tags"].as_array().expect("tags").len(), 2);

    let json = response_json(app.get("/api/media?q=animals+places").await).await;
    assert_eq!(ids(&json), vec![10, 13]);

    let persisted = app.store.load().expect("readable").expect("present");
    let stored = persisted.entity(13).expect("entity stored");
    assert!(stored.has_tag("are"));
}

#[tokio::test]
async fn put_rejects_unknown_tags_and_mismatched_ids() {
    let app = TestApp::new();
    let mut entity = response_json(app.get("/api/media/13").await).await;
    entity["tags"] = json!([
        { "id": 42, "name": "ghost", "canonicalName": "ghost", "parentId": 0 },
    ]);
    let response = app.send_json(Method::PUT, "/api/media/13", &entity).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send_json(Method::PUT, "/api/media/12", &entity).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send_json(Method::PUT, "/api/media/13", &json!({ "id": 13 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await["error"]["code"],
        "VALIDATION_FAILED"
    );
}

#[tokio::test]
async fn delete_removes_entity_and_persists() {
    let app = TestApp::new();
    let response = app.send_json(Method::DELETE, "/api/media/11", &json!({})).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(app.get("/api/media/11").await.status(), StatusCode::NOT_FOUND);
    let json = response_json(app.get("/api/media").await).await;
    assert_eq!(ids(&json), vec![13, 12, 10]);

    let persisted = app.store.load().expect("readable").expect("present");
    assert!(persisted.entity(11).is_none());

    let response = app.send_json(Method::DELETE, "/api/media/11", &json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send_json(Method::DELETE, "/api/media/eleven", &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
