//! Diesel model structs for the catalogue, leads and market reporting tables.
//!
//! Prices on `areas` and `projects` are display strings ("AED 1.2M"); see
//! `crate::price` for how they are read back as numbers.

use crate::schema;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Integer, Nullable, Text};
use serde::{Deserialize, Serialize};

pub mod lead_source {
    pub const WEBSITE_CONTACT_FORM: &str = "website_contact_form";
}

pub mod lead_status {
    pub const NEW: &str = "new";
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::areas)]
pub struct Area {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub image: Option<String>,
    pub starting_price: Option<String>,
    pub project_count: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::areas)]
pub struct NewArea {
    pub slug: String,
    pub name: String,
    pub image: Option<String>,
    pub starting_price: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::developers)]
pub struct Developer {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub founded_year: Option<i32>,
    pub headquarters: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::developers)]
pub struct NewDeveloper {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub founded_year: Option<i32>,
    pub headquarters: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::projects)]
#[diesel(belongs_to(Developer))]
#[diesel(belongs_to(Area))]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub location: Option<String>,
    pub price_from: Option<String>,
    pub developer_id: Option<i32>,
    pub area_id: Option<i32>,
    pub unit_types: Option<serde_json::Value>,
    pub amenities: Vec<String>,
    pub completion_date: Option<String>,
    pub image: Option<String>,
    pub match_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = schema::projects)]
#[diesel(treat_none_as_null = true)]
pub struct NewProject {
    pub name: String,
    pub slug: String,
    pub location: Option<String>,
    pub price_from: Option<String>,
    pub developer_id: Option<i32>,
    pub area_id: Option<i32>,
    pub unit_types: Option<serde_json::Value>,
    pub amenities: Vec<String>,
    pub completion_date: Option<String>,
    pub image: Option<String>,
    pub match_score: Option<f64>,
}

/// Contact-form submission. Rows are append-only.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::leads)]
pub struct Lead {
    pub id: i32,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub budget: Option<String>,
    pub interested_project: Option<String>,
    pub preferred_area: Option<String>,
    pub bedrooms: Option<String>,
    pub timeline: Option<String>,
    pub investment_purpose: Option<String>,
    pub notes: Option<String>,
    pub source: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::leads)]
pub struct NewLead {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub budget: Option<String>,
    pub interested_project: Option<String>,
    pub preferred_area: Option<String>,
    pub bedrooms: Option<String>,
    pub timeline: Option<String>,
    pub investment_purpose: Option<String>,
    pub notes: Option<String>,
    pub source: String,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::area_market_stats)]
pub struct AreaMarketStats {
    pub id: i32,
    pub area_name: String,
    pub area_slug: Option<String>,
    pub avg_price_per_sqft: Option<f64>,
    pub median_price: Option<f64>,
    pub transaction_count: i32,
    pub total_volume: Option<f64>,
    pub price_change_yoy: Option<f64>,
    pub rental_yield: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = schema::area_market_stats)]
#[diesel(treat_none_as_null = true)]
pub struct NewAreaMarketStats {
    pub area_name: String,
    pub area_slug: Option<String>,
    pub avg_price_per_sqft: Option<f64>,
    pub median_price: Option<f64>,
    pub transaction_count: i32,
    pub total_volume: Option<f64>,
    pub price_change_yoy: Option<f64>,
    pub rental_yield: Option<f64>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::market_trends)]
pub struct MarketTrend {
    pub id: i32,
    /// First day of the month the figures cover.
    pub month: NaiveDate,
    pub avg_price_per_sqft: Option<f64>,
    pub transaction_count: i32,
    pub total_volume: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = schema::market_trends)]
#[diesel(treat_none_as_null = true)]
pub struct NewMarketTrend {
    pub month: NaiveDate,
    pub avg_price_per_sqft: Option<f64>,
    pub transaction_count: i32,
    pub total_volume: Option<f64>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::area_monthly_stats)]
pub struct AreaMonthlyStat {
    pub id: i32,
    pub area_name: String,
    pub month: NaiveDate,
    pub avg_price_per_sqft: Option<f64>,
    pub transaction_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = schema::area_monthly_stats)]
#[diesel(treat_none_as_null = true)]
pub struct NewAreaMonthlyStat {
    pub area_name: String,
    pub month: NaiveDate,
    pub avg_price_per_sqft: Option<f64>,
    pub transaction_count: i32,
}

// View: area_stats
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::area_stats)]
pub struct AreaStat {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub image: Option<String>,
    pub starting_price: Option<String>,
    pub description: Option<String>,
    pub actual_project_count: i64,
    /// Lowest parseable `price_from` in AED; `None` when no project price parses.
    pub min_price: Option<i64>,
}

/// Developer row with aggregates over its projects.
#[derive(Debug, Clone, QueryableByName, Serialize, Deserialize)]
pub struct DeveloperSummary {
    #[diesel(sql_type = Integer)]
    pub id: i32,
    #[diesel(sql_type = Text)]
    pub slug: String,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub description: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub logo: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub website: Option<String>,
    #[diesel(sql_type = Nullable<Integer>)]
    pub founded_year: Option<i32>,
    #[diesel(sql_type = BigInt)]
    pub project_count: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_match_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeveloperDetail {
    #[serde(flatten)]
    pub developer: Developer,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectListing {
    #[serde(flatten)]
    pub project: Project,
    pub developer_name: Option<String>,
    pub area_name: Option<String>,
}

#[derive(Debug, Clone, Default, QueryableByName, Serialize, Deserialize)]
pub struct MarketSummary {
    #[diesel(sql_type = BigInt)]
    pub total_areas: i64,
    #[diesel(sql_type = BigInt)]
    pub total_transactions: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub avg_price_per_sqft: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    pub total_volume: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketOverview {
    pub summary: MarketSummary,
    pub top_areas: Vec<AreaMarketStats>,
    pub recent_trends: Vec<MarketTrend>,
}
