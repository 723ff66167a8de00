//! Read-only market reporting endpoints over `area_market_stats`,
//! `market_trends` and `area_monthly_stats`.

use super::{error::AppError, with_store, ApiResponse, AppState};
use crate::db::models::{AreaMarketStats, AreaMonthlyStat, MarketOverview, MarketTrend};
use crate::store::{AreaMarketQuery, AreaSort, SortOrder};
use crate::utils::clamp_or;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

const DEFAULT_AREA_LIMIT: i64 = 20;
const MAX_AREA_LIMIT: i64 = 100;
const DEFAULT_MONTHS: i64 = 12;
const MAX_MONTHS: i64 = 120;

// Raw strings so a bad value falls back to its default instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct AreasParams {
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl AreasParams {
    pub fn into_query(self) -> AreaMarketQuery {
        AreaMarketQuery {
            limit: clamp_or(parse_int(self.limit), DEFAULT_AREA_LIMIT, 1, MAX_AREA_LIMIT),
            sort: AreaSort::parse_or_default(self.sort.as_deref()),
            order: SortOrder::parse_or_default(self.order.as_deref()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthsParams {
    pub months: Option<String>,
}

impl MonthsParams {
    fn months(&self) -> i64 {
        clamp_or(parse_int(self.months.clone()), DEFAULT_MONTHS, 1, MAX_MONTHS)
    }
}

fn parse_int(raw: Option<String>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

/// GET /api/market/area/:areaName
pub async fn area(
    State(state): State<AppState>,
    Path(area_name): Path<String>,
) -> Result<Json<ApiResponse<AreaMarketStats>>, AppError> {
    let lookup = area_name.clone();
    with_store(&state, move |store| store.area_market(&lookup))
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::NotFound(format!("No market data for area '{}'", area_name)))
}

/// GET /api/market/areas?limit=&sort=&order=
pub async fn areas(
    State(state): State<AppState>,
    Query(params): Query<AreasParams>,
) -> Result<Json<ApiResponse<Vec<AreaMarketStats>>>, AppError> {
    let query = params.into_query();
    let rows = with_store(&state, move |store| store.list_area_market(&query)).await?;
    Ok(ApiResponse::ok(rows))
}

/// GET /api/market/trends?months=
pub async fn trends(
    State(state): State<AppState>,
    Query(params): Query<MonthsParams>,
) -> Result<Json<ApiResponse<Vec<MarketTrend>>>, AppError> {
    let months = params.months();
    let rows = with_store(&state, move |store| store.market_trends(months)).await?;
    Ok(ApiResponse::ok(rows))
}

/// GET /api/market/area/:areaName/history?months=
pub async fn area_history(
    State(state): State<AppState>,
    Path(area_name): Path<String>,
    Query(params): Query<MonthsParams>,
) -> Result<Json<ApiResponse<Vec<AreaMonthlyStat>>>, AppError> {
    let months = params.months();
    let rows = with_store(&state, move |store| store.area_history(&area_name, months)).await?;
    Ok(ApiResponse::ok(rows))
}

/// GET /api/market/overview
pub async fn overview(State(state): State<AppState>) -> Result<Json<ApiResponse<MarketOverview>>, AppError> {
    let overview = with_store(&state, |store| store.market_overview()).await?;
    Ok(ApiResponse::ok(overview))
}
