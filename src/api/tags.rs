use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    api::{ApiError, ApiResponse, ApiResult},
    catalog::{AutocompleteTag, CatalogApi, Tag, TagId},
    routes::AppState,
};

#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Vec<Tag>> {
    Ok(Json(state.catalog.fetch_tags().await?))
}

#[instrument(skip(state))]
pub async fn autocomplete_tags(State(state): State<AppState>) -> ApiResult<Vec<AutocompleteTag>> {
    Ok(Json(state.catalog.fetch_autocomplete_tags().await?))
}

/// Look a tag up by name; the name is canonicalized first.
#[instrument(skip(state))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Tag> {
    Ok(Json(state.catalog.tag_by_canonical_name(&name).await?))
}

#[instrument(skip(state, path))]
pub async fn create_tag(
    State(state): State<AppState>,
    path: Result<Path<(TagId, String)>, PathRejection>,
) -> ApiResponse<Tag> {
    let Path((parent_id, name)) =
        path.map_err(|_| ApiError::bad_request("parent must be a numeric tag id"))?;
    let tag = state.catalog.add_tag(parent_id, &name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// Body of `PUT /api/tags/{name}`. A missing or null parent moves the tag to the top level.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUpdate {
    #[serde(default)]
    pub parent_id: Option<TagId>,
}

#[instrument(skip(state, payload))]
pub async fn update_tag(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<TagUpdate>, JsonRejection>,
) -> ApiResult<Tag> {
    let Json(update) = payload.map_err(|err| ApiError::bad_request(err.body_text()))?;
    let tag = state.catalog.tag_by_canonical_name(&name).await?;
    Ok(Json(state.catalog.set_parent(tag.id, update.parent_id).await?))
}
