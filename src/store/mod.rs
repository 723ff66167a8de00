//! Query layer between the HTTP handlers and Postgres.
//!
//! Handlers only see the [`Store`] trait. [`postgres::PgStore`] is the real
//! implementation; every call checks a connection out of the shared pool, runs
//! its queries in sequence and hands the connection back when it drops. There
//! are no explicit transactions on this path.

use crate::db::models::{
    AreaMarketStats, AreaMonthlyStat, AreaStat, DeveloperDetail, DeveloperSummary, Lead, MarketOverview, MarketTrend,
    NewLead, ProjectListing,
};
use diesel::r2d2::PoolError;
use thiserror::Error;

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),
}

pub trait Store: Send + Sync + 'static {
    /// All developers with project count and average project match score,
    /// busiest first.
    fn list_developers(&self) -> Result<Vec<DeveloperSummary>, StoreError>;

    fn featured_developers(&self, limit: i64) -> Result<Vec<DeveloperSummary>, StoreError>;

    /// Developer plus its projects, newest first. `None` for an unknown slug.
    fn developer_by_slug(&self, slug: &str) -> Result<Option<DeveloperDetail>, StoreError>;

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<ProjectListing>, StoreError>;

    fn list_area_stats(&self) -> Result<Vec<AreaStat>, StoreError>;

    fn insert_lead(&self, lead: &NewLead) -> Result<Lead, StoreError>;

    fn recent_leads(&self, limit: i64) -> Result<Vec<Lead>, StoreError>;

    /// Market figures for one area, matched by name (any case, hyphens or
    /// spaces) or by slug.
    fn area_market(&self, area: &str) -> Result<Option<AreaMarketStats>, StoreError>;

    fn list_area_market(&self, query: &AreaMarketQuery) -> Result<Vec<AreaMarketStats>, StoreError>;

    /// Latest `months` rows, oldest first.
    fn market_trends(&self, months: i64) -> Result<Vec<MarketTrend>, StoreError>;

    /// Latest `months` rows for one area, oldest first.
    fn area_history(&self, area: &str, months: i64) -> Result<Vec<AreaMonthlyStat>, StoreError>;

    fn market_overview(&self) -> Result<MarketOverview, StoreError>;
}

/// ORDER BY column for `/api/market/areas`. Only these columns can be sorted on;
/// anything else falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaSort {
    #[default]
    TransactionCount,
    AvgPricePerSqft,
    MedianPrice,
    TotalVolume,
    PriceChangeYoy,
    RentalYield,
    AreaName,
}

impl AreaSort {
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("transaction_count") => AreaSort::TransactionCount,
            Some("avg_price_per_sqft") => AreaSort::AvgPricePerSqft,
            Some("median_price") => AreaSort::MedianPrice,
            Some("total_volume") => AreaSort::TotalVolume,
            Some("price_change_yoy") => AreaSort::PriceChangeYoy,
            Some("rental_yield") => AreaSort::RentalYield,
            Some("area_name") => AreaSort::AreaName,
            _ => AreaSort::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaMarketQuery {
    pub limit: i64,
    pub sort: AreaSort,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Area slug.
    pub area: Option<String>,
    /// Developer slug.
    pub developer: Option<String>,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sort_falls_back_to_default() {
        assert_eq!(AreaSort::parse_or_default(None), AreaSort::TransactionCount);
        assert_eq!(AreaSort::parse_or_default(Some("id; DROP TABLE leads")), AreaSort::TransactionCount);
        assert_eq!(AreaSort::parse_or_default(Some("rental_yield")), AreaSort::RentalYield);
        assert_eq!(AreaSort::parse_or_default(Some(" area_name ")), AreaSort::AreaName);
    }

    #[test]
    fn order_defaults_to_desc() {
        assert_eq!(SortOrder::parse_or_default(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_or_default(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_or_default(None), SortOrder::Desc);
    }
}
