use super::{error::AppError, with_store, ApiResponse, AppState};
use crate::db::models::{AreaStat, ProjectListing};
use crate::store::ProjectFilter;
use crate::utils::{clamp_or, non_blank};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ProjectParams {
    pub area: Option<String>,
    pub developer: Option<String>,
    pub limit: Option<String>,
}

impl ProjectParams {
    fn into_filter(self) -> ProjectFilter {
        ProjectFilter {
            area: non_blank(self.area),
            developer: non_blank(self.developer),
            limit: clamp_or(self.limit.and_then(|l| l.trim().parse().ok()), 50, 1, 200),
        }
    }
}

/// GET /api/areas: areas with live project counts and parsed minimum prices.
pub async fn areas(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<AreaStat>>>, AppError> {
    let areas = with_store(&state, |store| store.list_area_stats()).await?;
    Ok(ApiResponse::ok(areas))
}

/// GET /api/projects?area=&developer=&limit=
pub async fn projects(
    State(state): State<AppState>,
    Query(params): Query<ProjectParams>,
) -> Result<Json<ApiResponse<Vec<ProjectListing>>>, AppError> {
    let filter = params.into_filter();
    let projects = with_store(&state, move |store| store.list_projects(&filter)).await?;
    Ok(ApiResponse::ok(projects))
}
