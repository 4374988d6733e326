use super::support::{TestApp, ids, response_json};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::json;

async fn post(app: &TestApp, uri: &str) -> axum::response::Response {
    app.request(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    )
    .await
}

#[tokio::test]
async fn list_returns_flat_catalog() {
    let app = TestApp::new();
    let response = app.get("/api/tags").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    let tags = json.as_array().expect("tags array");
    assert_eq!(tags.len(), 6);
    assert_eq!(tags[1]["canonicalName"], "cats");
    assert_eq!(tags[1]["parentId"], 1);
}

#[tokio::test]
async fn autocomplete_lists_paths_depth_first() {
    let app = TestApp::new();
    let response = app.get("/api/tags/autocomplete").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    let labels: Vec<String> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| {
            entry["path"]
                .as_array()
                .expect("path")
                .iter()
                .map(|part| part.as_str().expect("segment"))
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    assert_eq!(
        labels,
        vec![
            "Animals",
            "Animals/birds",
            "Animals/Cats",
            "Places",
            "Places/Sweden",
            "Places/Sweden/Åre",
        ]
    );
}

#[tokio::test]
async fn lookup_canonicalizes_name() {
    let app = TestApp::new();
    let response = app.get("/api/tags/%C3%85re").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["id"], 6);

    let response = app.get("/api/tags/unicorns").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response_json(response).await["error"]["code"],
        "RESOURCE_NOT_FOUND"
    );
}

#[tokio::test]
async fn create_under_parent_persists() {
    let app = TestApp::new();
    let response = post(&app, "/api/tags/5/Stockholm%20City").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = response_json(response).await;
    assert_eq!(json["id"], 7);
    assert_eq!(json["name"], "Stockholm City");
    assert_eq!(json["canonicalName"], "stockholm-city");
    assert_eq!(json["parentId"], 5);

    let persisted = app.store.load().expect("readable").expect("present");
    assert!(persisted.tag_by_canonical_name("stockholm-city").is_some());
}

#[tokio::test]
async fn create_rejects_duplicates_and_bad_parents() {
    let app = TestApp::new();

    let response = post(&app, "/api/tags/0/CATS").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(response).await["error"]["code"], "CONFLICT");

    let response = post(&app, "/api/tags/99/Dogs").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await["error"]["code"],
        "VALIDATION_FAILED"
    );

    let response = post(&app, "/api/tags/animals/Dogs").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post(&app, "/api/tags/0/%20%20").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reparenting_moves_subtree_and_persists() {
    let app = TestApp::new();
    let response = app
        .send_json(Method::PUT, "/api/tags/birds", &json!({ "parentId": 4 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["parentId"], 4);

    // birds now sits below places, so its entity shows up there
    let json = response_json(app.get("/api/media?q=places").await).await;
    assert_eq!(ids(&json), vec![11, 10, 12]);
    let json = response_json(app.get("/api/media?q=animals").await).await;
    assert_eq!(ids(&json), vec![10]);

    let persisted = app.store.load().expect("readable").expect("present");
    assert_eq!(persisted.tag(3).expect("birds").parent_id, 4);

    let response = app
        .send_json(Method::PUT, "/api/tags/Sweden", &json!({ "parentId": null }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["parentId"], 0);
}

#[tokio::test]
async fn reparenting_rejects_cycles_and_unknown_tags() {
    let app = TestApp::new();

    let response = app
        .send_json(Method::PUT, "/api/tags/places", &json!({ "parentId": 6 }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(response).await["error"]["code"], "CONFLICT");

    let response = app
        .send_json(Method::PUT, "/api/tags/cats", &json!({ "parentId": 99 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send_json(Method::PUT, "/api/tags/unicorns", &json!({ "parentId": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send_json(Method::PUT, "/api/tags/cats", &json!({ "parentId": "animals" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let tags = response_json(app.get("/api/tags").await).await;
    assert_eq!(tags[3]["parentId"], 0, "places stays at the top level");
}
