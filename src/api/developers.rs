use super::{error::AppError, with_store, ApiResponse, AppState};
use crate::db::models::{DeveloperDetail, DeveloperSummary};
use axum::extract::{Path, State};
use axum::Json;

const FEATURED_DEVELOPERS: i64 = 6;

/// GET /api/developers
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<DeveloperSummary>>>, AppError> {
    let developers = with_store(&state, |store| store.list_developers()).await?;
    Ok(ApiResponse::ok(developers))
}

/// GET /api/developers/featured: busiest developers by project count.
pub async fn featured(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<DeveloperSummary>>>, AppError> {
    let developers = with_store(&state, |store| store.featured_developers(FEATURED_DEVELOPERS)).await?;
    Ok(ApiResponse::ok(developers))
}

/// GET /api/developers/:slug
pub async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<DeveloperDetail>>, AppError> {
    let lookup = slug.clone();
    with_store(&state, move |store| store.developer_by_slug(&lookup))
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::NotFound(format!("Developer '{}' not found", slug)))
}
