use axum::{Json, extract::State};
use serde::Serialize;

use crate::{api::ApiResult, routes::AppState};

/// Runtime settings the single-page client needs before rendering.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub map_api_key: Option<String>,
}

pub async fn client_config(State(state): State<AppState>) -> ApiResult<ClientConfig> {
    Ok(Json(ClientConfig {
        map_api_key: state.config.map.api_key.clone(),
    }))
}
