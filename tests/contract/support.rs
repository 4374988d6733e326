use std::{fs, sync::Arc};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, header::CONTENT_TYPE},
    response::Response,
};
use http_body_util::BodyExt;
use imagedb::{
    catalog::{CatalogStore, LocalCatalog, read_seed},
    config::AppConfig,
    routes::{self, AppState},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;

/// Router over a seeded catalog persisted in a temporary data dir.
pub struct TestApp {
    router: Router,
    pub catalog: LocalCatalog,
    pub store: Arc<CatalogStore>,
    _data_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let data_dir = TempDir::new().expect("temp data dir");
        let seed_path = data_dir.path().join("seed.json");
        fs::write(&seed_path, seed().to_string()).expect("write seed");

        let store = Arc::new(CatalogStore::new(data_dir.path()));
        let snapshot = store
            .load_or_rebuild(|| read_seed(&seed_path))
            .expect("seed catalog");
        let catalog = LocalCatalog::new(Arc::new(RwLock::new(snapshot)), Some(store.clone()));

        let mut config = AppConfig::for_data_dir(data_dir.path());
        adjust(&mut config);
        let router = routes::router(AppState::new(Arc::new(config), catalog.clone()));

        Self {
            router,
            catalog,
            store,
            _data_dir: data_dir,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router to respond")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    pub async fn send_json(&self, method: Method, uri: &str, body: &Value) -> Response {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body bytes")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("valid json payload")
}

pub fn ids(json: &Value) -> Vec<u64> {
    json.as_array()
        .expect("array payload")
        .iter()
        .map(|item| item["id"].as_u64().expect("numeric id"))
        .collect()
}

fn tag(id: u32, parent_id: u32, name: &str, canonical_name: &str) -> Value {
    json!({ "id": id, "name": name, "canonicalName": canonical_name, "parentId": parent_id })
}

fn entity(id: u32, created: Option<&str>, tags: Vec<Value>) -> Value {
    json!({
        "id": id,
        "mediaType": "image",
        "path": format!("media/{id}.jpg"),
        "thumbnailPath": format!("thumbnails/{id}.jpg"),
        "previewPath": format!("previews/{id}.jpg"),
        "uploaded": "2023-03-01T10:00:00Z",
        "created": created,
        "location": null,
        "tags": tags,
    })
}

/// Animals/{Cats, birds} and Places/Sweden/Åre, four entities.
fn seed() -> Value {
    let animals = tag(1, 0, "Animals", "animals");
    let cats = tag(2, 1, "Cats", "cats");
    let birds = tag(3, 1, "birds", "birds");
    let places = tag(4, 0, "Places", "places");
    let sweden = tag(5, 4, "Sweden", "sweden");
    let are = tag(6, 5, "Åre", "are");

    json!({
        "tags": [animals, cats.clone(), birds.clone(), places, sweden.clone(), are.clone()],
        "entities": [
            entity(10, Some("2021-06-01T12:00:00Z"), vec![cats, sweden]),
            entity(11, Some("2020-01-01T12:00:00Z"), vec![birds]),
            entity(12, None, vec![are]),
            entity(13, Some("2022-01-01T12:00:00Z"), vec![]),
        ],
    })
}
