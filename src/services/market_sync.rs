//! Load market statistics exported from the transactions pipeline.
//!
//! Reporting tables are keyed by area *name* rather than an `areas` foreign
//! key, so names that match no catalogue area are still stored and only
//! reported as warnings.

use crate::db::models::{NewAreaMarketStats, NewAreaMonthlyStat, NewMarketTrend};
use crate::schema;
use crate::utils::{first_of_month, non_blank, slugify};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct MarketFile {
    #[serde(default)]
    pub areas: Vec<AreaRecord>,
    #[serde(default)]
    pub trends: Vec<TrendRecord>,
    #[serde(default)]
    pub monthly: Vec<MonthlyRecord>,
}

#[derive(Debug, Deserialize)]
pub struct AreaRecord {
    pub area_name: String,
    #[serde(default)]
    pub area_slug: Option<String>,
    #[serde(default)]
    pub avg_price_per_sqft: Option<f64>,
    #[serde(default)]
    pub median_price: Option<f64>,
    #[serde(default)]
    pub transaction_count: i32,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub price_change_yoy: Option<f64>,
    #[serde(default)]
    pub rental_yield: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TrendRecord {
    /// `YYYY-MM` or `YYYY-MM-DD`.
    pub month: String,
    #[serde(default)]
    pub avg_price_per_sqft: Option<f64>,
    #[serde(default)]
    pub transaction_count: i32,
    #[serde(default)]
    pub total_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyRecord {
    pub area_name: String,
    pub month: String,
    #[serde(default)]
    pub avg_price_per_sqft: Option<f64>,
    #[serde(default)]
    pub transaction_count: i32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub areas: usize,
    pub trends: usize,
    pub monthly: usize,
    pub unmatched_areas: usize,
}

/// Validated rows ready for upsert.
#[derive(Debug, Default)]
struct MarketRows {
    areas: Vec<NewAreaMarketStats>,
    trends: Vec<NewMarketTrend>,
    monthly: Vec<NewAreaMonthlyStat>,
}

pub fn parse_market_file(json: &str) -> Result<MarketFile, String> {
    let de = &mut serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(de).map_err(|e| format!("invalid market file at {}: {}", e.path(), e.inner()))
}

/// Accepts `2025-03` or any day of the month (`2025-03-17`); the result is
/// always the first of the month.
pub fn parse_month(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d"))
        .map(first_of_month)
        .map_err(|_| format!("invalid month {:?}, expected YYYY-MM or YYYY-MM-DD", raw))
}

fn into_rows(file: MarketFile) -> Result<MarketRows, String> {
    let mut rows = MarketRows::default();

    for (i, a) in file.areas.into_iter().enumerate() {
        let area_name = non_blank(Some(a.area_name)).ok_or_else(|| format!("areas[{}]: area_name is blank", i))?;
        let area_slug = non_blank(a.area_slug).map(|s| slugify(&s)).unwrap_or_else(|| slugify(&area_name));
        rows.areas.push(NewAreaMarketStats {
            area_name,
            area_slug: Some(area_slug),
            avg_price_per_sqft: a.avg_price_per_sqft,
            median_price: a.median_price,
            transaction_count: a.transaction_count,
            total_volume: a.total_volume,
            price_change_yoy: a.price_change_yoy,
            rental_yield: a.rental_yield,
        });
    }

    for (i, t) in file.trends.into_iter().enumerate() {
        let month = parse_month(&t.month).map_err(|e| format!("trends[{}]: {}", i, e))?;
        rows.trends.push(NewMarketTrend {
            month,
            avg_price_per_sqft: t.avg_price_per_sqft,
            transaction_count: t.transaction_count,
            total_volume: t.total_volume,
        });
    }

    for (i, m) in file.monthly.into_iter().enumerate() {
        let area_name = non_blank(Some(m.area_name)).ok_or_else(|| format!("monthly[{}]: area_name is blank", i))?;
        let month = parse_month(&m.month).map_err(|e| format!("monthly[{}]: {}", i, e))?;
        rows.monthly.push(NewAreaMonthlyStat {
            area_name,
            month,
            avg_price_per_sqft: m.avg_price_per_sqft,
            transaction_count: m.transaction_count,
        });
    }

    Ok(rows)
}

/// Distinct reporting area names that match no catalogue area by slug.
fn unmatched_area_names<'a>(names: impl IntoIterator<Item = &'a str>, catalogue_slugs: &BTreeSet<String>) -> Vec<&'a str> {
    let unmatched: BTreeSet<&str> = names
        .into_iter()
        .filter(|name| !catalogue_slugs.contains(&slugify(name)))
        .collect();
    unmatched.into_iter().collect()
}

pub fn run(conn: &mut PgConnection, path: &Path) -> Result<SyncReport, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let rows = into_rows(parse_market_file(&raw)?)?;
    info!(
        "Market sync: {} area row(s), {} trend month(s), {} area-month row(s) read from {}",
        rows.areas.len(),
        rows.trends.len(),
        rows.monthly.len(),
        path.display()
    );

    info!("Market sync: BEGIN");
    let report = conn.transaction(|conn| upsert_rows(conn, &rows)).map_err(|e| {
        warn!("Market sync: ROLLBACK");
        format!("market sync failed: {}", e)
    })?;
    info!(
        "Market sync: COMMIT (areas={}, trends={}, monthly={}, unmatched areas={})",
        report.areas, report.trends, report.monthly, report.unmatched_areas
    );
    Ok(report)
}

fn upsert_rows(conn: &mut PgConnection, rows: &MarketRows) -> QueryResult<SyncReport> {
    use schema::area_market_stats::dsl as S;
    use schema::area_monthly_stats::dsl as M;
    use schema::areas::dsl as A;
    use schema::market_trends::dsl as T;

    let mut report = SyncReport::default();

    for row in &rows.areas {
        diesel::insert_into(S::area_market_stats)
            .values(row)
            .on_conflict(S::area_name)
            .do_update()
            .set((row, S::updated_at.eq(Utc::now())))
            .execute(conn)?;
        report.areas += 1;
    }

    for row in &rows.trends {
        diesel::insert_into(T::market_trends)
            .values(row)
            .on_conflict(T::month)
            .do_update()
            .set(row)
            .execute(conn)?;
        report.trends += 1;
    }

    for row in &rows.monthly {
        diesel::insert_into(M::area_monthly_stats)
            .values(row)
            .on_conflict((M::area_name, M::month))
            .do_update()
            .set(row)
            .execute(conn)?;
        report.monthly += 1;
    }

    let catalogue_slugs: BTreeSet<String> = A::areas.select(A::slug).load::<String>(conn)?.into_iter().collect();
    let names = rows
        .areas
        .iter()
        .map(|r| r.area_name.as_str())
        .chain(rows.monthly.iter().map(|r| r.area_name.as_str()));
    for name in unmatched_area_names(names, &catalogue_slugs) {
        warn!("Market sync: area {:?} has no matching catalogue area", name);
        report.unmatched_areas += 1;
    }

    Ok(report)
}
