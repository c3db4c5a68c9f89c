use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::modules::sky::model::{MoonDetails, SkyQuery, SkySummary};
use crate::state::AppState;
use crate::utils::errors::AppError;

#[instrument(skip(state))]
pub async fn get_moon_details(
    State(state): State<AppState>,
    Query(query): Query<SkyQuery>,
) -> Result<Json<MoonDetails>, AppError> {
    let moon = state
        .sky
        .moon_details(query)
        .await
        .map_err(AppError::bad_request)?;

    Ok(Json(moon))
}

#[instrument(skip(state))]
pub async fn get_sky_summary(
    State(state): State<AppState>,
    Query(query): Query<SkyQuery>,
) -> Result<Json<SkySummary>, AppError> {
    let summary = state
        .sky
        .sky_summary(query)
        .await
        .map_err(AppError::bad_request)?;

    Ok(Json(summary))
}

/// Reports whether the cache store answers. The service is up either way.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let cache = match state.store.ping().await {
        Ok(()) => "connected",
        Err(_) => "unavailable",
    };

    Json(json!({ "status": "ok", "cache": cache }))
}
