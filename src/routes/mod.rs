use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    Json, Router,
    extract::{MatchedPath, State},
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{MakeSpan, OnRequest, OnResponse, TraceLayer},
};
use tracing::{Span, field, instrument};

use crate::{
    api::{self, ApiResult, client_config::client_config, media, tags},
    catalog::LocalCatalog,
    config::AppConfig,
};

/// Shared application state cloned into each request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: LocalCatalog,
    pub boot_instant: Instant,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, catalog: LocalCatalog) -> Self {
        Self {
            config,
            catalog,
            boot_instant: Instant::now(),
        }
    }
}

/// Build the Axum router with shared layers and routes.
pub fn router(state: AppState) -> Router {
    let frontend_dist_dir = state.config.frontend_dist_dir.clone();
    let cors = build_cors_layer(&state.config.cors_allowed_origins);

    let api_routes = Router::new()
        .route("/client-config", get(client_config))
        .route("/tags", get(tags::list_tags))
        .route("/tags/autocomplete", get(tags::autocomplete_tags))
        .route("/tags/{name}", get(tags::get_tag).put(tags::update_tag))
        .route("/tags/{parent}/{name}", post(tags::create_tag))
        .route("/media", get(media::search_media))
        .route(
            "/media/{id}",
            get(media::get_media)
                .put(media::update_media)
                .delete(media::delete_media),
        )
        .fallback(api::fallback_handler);

    let routes = Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .with_state(state);

    // Client-side routes (/tags, /media/12, ...) all resolve to index.html.
    let routes = match frontend_dist_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            routes.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => routes.fallback(api::fallback_handler),
    };

    routes
        .layer(middleware::from_fn(api::ensure_error_envelope))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(HttpMakeSpan)
                .on_request(LogOnRequest)
                .on_response(LogOnResponse),
        )
}

fn build_cors_layer(cors_allowed_origins: &[String]) -> CorsLayer {
    let mut parsed = Vec::new();
    for origin in cors_allowed_origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => parsed.push(value),
            Err(err) => tracing::warn!("ignoring invalid CORS origin '{origin}': {err}"),
        }
    }

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(parsed)
}

/// JSON payload returned by `/healthz`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    data_dir: String,
    uptime_seconds: f64,
    tags: usize,
    entities: usize,
    catalog_generated_at: String,
}

#[instrument(skip(state))]
async fn healthz(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    let snapshot = state.catalog.snapshot();
    let snapshot = snapshot.read().await;
    Ok(Json(HealthResponse {
        status: "ok",
        data_dir: state.config.data_dir.display().to_string(),
        uptime_seconds: state.boot_instant.elapsed().as_secs_f64(),
        tags: snapshot.tags.len(),
        entities: snapshot.entities.len(),
        catalog_generated_at: snapshot.generated_at.to_rfc3339(),
    }))
}

#[derive(Clone)]
struct HttpMakeSpan;

impl<B> MakeSpan<B> for HttpMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let method = request.method().clone();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(|path| path.as_str())
            .unwrap_or_else(|| request.uri().path());

        let span = tracing::info_span!(
            "http_request",
            http.request.method = %method,
            http.route = %matched_path,
            url.path = request.uri().path(),
            url.query = field::Empty,
            http.response.status_code = field::Empty,
            http.latency_ms = field::Empty
        );

        if let Some(query) = request.uri().query() {
            span.record("url.query", field::display(query));
        }

        span
    }
}

#[derive(Clone)]
struct LogOnRequest;

impl<B> OnRequest<B> for LogOnRequest {
    fn on_request(&mut self, request: &axum::http::Request<B>, span: &Span) {
        tracing::info!(
            parent: span,
            "HTTP request received: {} {}",
            request.method(),
            request.uri().path()
        );
    }
}

#[derive(Clone)]
struct LogOnResponse;

impl<B> OnResponse<B> for LogOnResponse {
    fn on_response(self, response: &axum::http::Response<B>, latency: Duration, span: &Span) {
        let status_code = response.status().as_u16();

        span.record("http.response.status_code", field::display(status_code));
        span.record("http.latency_ms", field::display(latency.as_millis()));

        tracing::info!(
            parent: span,
            "HTTP request completed with status {} in {} ms",
            status_code,
            latency.as_millis()
        );
    }
}
