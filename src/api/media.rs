use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    api::{ApiError, ApiResult},
    catalog::{CatalogApi, Entity, EntityId, EntitySummary},
    routes::AppState,
};

#[derive(Debug, Deserialize, Default)]
pub struct MediaSearchParams {
    /// Space separated canonical tag names.
    pub q: Option<String>,
}

/// Entity summaries. Without `q` every entity is listed, newest first.
#[instrument(skip(state))]
pub async fn search_media(
    State(state): State<AppState>,
    Query(params): Query<MediaSearchParams>,
) -> ApiResult<Vec<EntitySummary>> {
    let tokens: Option<Vec<String>> = params.q.as_deref().map(|q| {
        q.split_whitespace()
            .map(str::to_owned)
            .collect()
    });
    let items = state.catalog.fetch_entities(tokens.as_deref()).await?;
    tracing::debug!(count = items.len(), "media search completed");
    Ok(Json(items))
}

#[instrument(skip(state, id))]
pub async fn get_media(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> ApiResult<Entity> {
    let Path(id) = id.map_err(|_| ApiError::bad_request("invalid media identifier"))?;
    Ok(Json(state.catalog.fetch_entity(id).await?))
}

/// Replace the entity's tag set; other fields of the body are ignored.
#[instrument(skip(state, id, payload))]
pub async fn update_media(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
    payload: Result<Json<Entity>, JsonRejection>,
) -> ApiResult<Entity> {
    let Path(id) = id.map_err(|_| ApiError::bad_request("invalid media identifier"))?;
    let Json(entity) = payload.map_err(|err| ApiError::bad_request(err.body_text()))?;
    if entity.id != id {
        return Err(ApiError::bad_request(format!(
            "body id {} does not match path id {id}",
            entity.id
        )));
    }
    Ok(Json(state.catalog.save_entity(&entity).await?))
}

#[instrument(skip(state, id))]
pub async fn delete_media(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::bad_request("invalid media identifier"))?;
    state.catalog.delete_entity(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
