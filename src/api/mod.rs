//! Error layer of the catalog API. Every failure, including axum's own 404 and
//! 405 responses, leaves the service as `{"error": {"code", "message"}}`.

use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;

pub mod client_config;
pub mod media;
pub mod tags;

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Like [`ApiResult`] but with an explicit success status, e.g. `201 Created`.
pub type ApiResponse<T> = Result<(StatusCode, Json<T>), ApiError>;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    ResourceNotFound,
    MethodNotAllowed,
    Conflict,
    CatalogWriteFailed,
    CatalogUnavailable,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed path segment, query or body.
    #[error("{0}")]
    BadRequest(String),
    #[error("route not found")]
    RouteNotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn classify(&self) -> (StatusCode, ErrorCode) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed),
            Self::RouteNotFound => (StatusCode::NOT_FOUND, ErrorCode::ResourceNotFound),
            Self::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, ErrorCode::MethodNotAllowed),
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::ResourceNotFound),
                CatalogError::Conflict(_) | CatalogError::CyclicParent { .. } => {
                    (StatusCode::CONFLICT, ErrorCode::Conflict)
                }
                CatalogError::InvalidParent(_)
                | CatalogError::UnknownTag(_)
                | CatalogError::InvalidName(_) => {
                    (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed)
                }
                CatalogError::Unavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::CatalogUnavailable,
                ),
                CatalogError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::CatalogWriteFailed,
                ),
            },
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    error: EnvelopeBody<'a>,
}

#[derive(Serialize)]
struct EnvelopeBody<'a> {
    code: ErrorCode,
    message: &'a str,
}

/// Marks responses that already carry the envelope.
#[derive(Clone, Copy, Debug)]
struct Enveloped;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let message = self.to_string();

        if status.is_server_error() {
            // Debug output keeps the io/serde cause behind a storage failure.
            tracing::error!(?code, %status, error = ?self, "catalog request failed");
        } else {
            tracing::warn!(?code, %status, message = message.as_str(), "request rejected");
        }

        let envelope = Envelope {
            error: EnvelopeBody {
                code,
                message: &message,
            },
        };
        let mut response = (status, Json(envelope)).into_response();
        response.extensions_mut().insert(Enveloped);
        response
    }
}

/// Rewrites axum's bare 404/405 responses into the envelope.
pub async fn ensure_error_envelope(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    if response.extensions().get::<Enveloped>().is_some() {
        return response;
    }
    match response.status() {
        StatusCode::NOT_FOUND => ApiError::RouteNotFound.into_response(),
        StatusCode::METHOD_NOT_ALLOWED => ApiError::MethodNotAllowed.into_response(),
        _ => response,
    }
}

pub async fn fallback_handler() -> ApiError {
    ApiError::RouteNotFound
}
