//! In-memory [`Store`] used by the handler tests.

use super::{AreaMarketQuery, AreaSort, ProjectFilter, SortOrder, Store, StoreError};
use crate::db::models::{
    Area, AreaMarketStats, AreaMonthlyStat, AreaStat, Developer, DeveloperDetail, DeveloperSummary, Lead,
    MarketOverview, MarketSummary, MarketTrend, NewLead, Project, ProjectListing,
};
use crate::price::parse_display_price;
use crate::utils::slugify;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    pub areas: Vec<Area>,
    pub developers: Vec<Developer>,
    pub projects: Vec<Project>,
    pub market: Vec<AreaMarketStats>,
    pub trends: Vec<MarketTrend>,
    pub monthly: Vec<AreaMonthlyStat>,
    pub leads: Mutex<Vec<Lead>>,
    /// Every call fails with a query error when set.
    pub offline: bool,
}

pub fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, 9, 0, 0).unwrap()
}

pub fn month(m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, 1).unwrap()
}

impl MemoryStore {
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Two developers, two areas, three projects and a few months of market data.
    pub fn seeded() -> Self {
        let developer = |id: i32, slug: &str, name: &str| Developer {
            id,
            slug: slug.to_string(),
            name: name.to_string(),
            description: None,
            logo: None,
            website: None,
            founded_year: Some(1997),
            headquarters: Some("Dubai".to_string()),
            created_at: ts(1),
            updated_at: ts(1),
        };
        let area = |id: i32, slug: &str, name: &str| Area {
            id,
            slug: slug.to_string(),
            name: name.to_string(),
            image: None,
            starting_price: None,
            project_count: 0,
            description: None,
            created_at: ts(1),
            updated_at: ts(1),
        };
        let project = |id: i32, slug: &str, developer_id: i32, area_id: Option<i32>, price: &str, score: f64| Project {
            id,
            name: slug.replace('-', " "),
            slug: slug.to_string(),
            location: None,
            price_from: Some(price.to_string()),
            developer_id: Some(developer_id),
            area_id,
            unit_types: None,
            amenities: vec!["Pool".to_string()],
            completion_date: Some("Q4 2027".to_string()),
            image: None,
            match_score: Some(score),
            created_at: ts(id as u32 + 1),
            updated_at: ts(id as u32 + 1),
        };
        let market = |id: i32, name: &str, tx: i32, psf: f64| AreaMarketStats {
            id,
            area_name: name.to_string(),
            area_slug: Some(slugify(name)),
            avg_price_per_sqft: Some(psf),
            median_price: None,
            transaction_count: tx,
            total_volume: Some(tx as f64 * 1_500_000.0),
            price_change_yoy: None,
            rental_yield: Some(6.5),
            updated_at: ts(1),
        };
        let trend = |id: i32, m: u32, tx: i32| MarketTrend {
            id,
            month: month(m),
            avg_price_per_sqft: Some(1500.0 + m as f64),
            transaction_count: tx,
            total_volume: None,
            created_at: ts(1),
        };

        Self {
            areas: vec![area(1, "dubai-marina", "Dubai Marina"), area(2, "business-bay", "Business Bay")],
            developers: vec![developer(1, "emaar", "Emaar Properties"), developer(2, "sobha", "Sobha Realty")],
            projects: vec![
                project(1, "marina-vista", 1, Some(1), "AED 1.2M", 80.0),
                project(2, "creek-edge", 1, None, "Price on request", 90.0),
                project(3, "sobha-one", 2, Some(2), "AED 850K", 70.0),
            ],
            market: vec![
                market(1, "Dubai Marina", 420, 1850.0),
                market(2, "Business Bay", 610, 1720.0),
                market(3, "Jumeirah Village Circle", 980, 1010.0),
            ],
            trends: (1..=8).map(|m| trend(m as i32, m, 3000 + m as i32)).collect(),
            monthly: (1..=4)
                .map(|m| AreaMonthlyStat {
                    id: m as i32,
                    area_name: "Dubai Marina".to_string(),
                    month: month(m),
                    avg_price_per_sqft: Some(1800.0),
                    transaction_count: 100 + m as i32,
                    created_at: ts(1),
                })
                .collect(),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Query(diesel::result::Error::QueryBuilderError("store offline".into())));
        }
        Ok(())
    }

    fn summaries(&self) -> Vec<DeveloperSummary> {
        let mut out: Vec<DeveloperSummary> = self
            .developers
            .iter()
            .map(|d| {
                let scores: Vec<f64> = self
                    .projects
                    .iter()
                    .filter(|p| p.developer_id == Some(d.id))
                    .filter_map(|p| p.match_score)
                    .collect();
                let count = self.projects.iter().filter(|p| p.developer_id == Some(d.id)).count();
                DeveloperSummary {
                    id: d.id,
                    slug: d.slug.clone(),
                    name: d.name.clone(),
                    description: d.description.clone(),
                    logo: d.logo.clone(),
                    website: d.website.clone(),
                    founded_year: d.founded_year,
                    project_count: count as i64,
                    avg_match_score: if scores.is_empty() {
                        None
                    } else {
                        Some(scores.iter().sum::<f64>() / scores.len() as f64)
                    },
                }
            })
            .collect();
        out.sort_by(|a, b| b.project_count.cmp(&a.project_count).then_with(|| a.name.cmp(&b.name)));
        out
    }

    fn matches_area(name: &str, query: &str) -> bool {
        let query = query.trim();
        name.eq_ignore_ascii_case(query) || name.eq_ignore_ascii_case(&query.replace('-', " "))
    }
}

fn latest<T: Clone>(rows: &[T], months: i64, key: impl Fn(&T) -> NaiveDate) -> Vec<T> {
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|r| std::cmp::Reverse(key(r)));
    sorted.truncate(months.max(0) as usize);
    sorted.reverse();
    sorted
}

impl Store for MemoryStore {
    fn list_developers(&self) -> Result<Vec<DeveloperSummary>, StoreError> {
        self.check()?;
        Ok(self.summaries())
    }

    fn featured_developers(&self, limit: i64) -> Result<Vec<DeveloperSummary>, StoreError> {
        self.check()?;
        let mut all = self.summaries();
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }

    fn developer_by_slug(&self, slug: &str) -> Result<Option<DeveloperDetail>, StoreError> {
        self.check()?;
        Ok(self.developers.iter().find(|d| d.slug == slug).map(|d| {
            let mut projects: Vec<Project> =
                self.projects.iter().filter(|p| p.developer_id == Some(d.id)).cloned().collect();
            projects.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            DeveloperDetail {
                developer: d.clone(),
                projects,
            }
        }))
    }

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<ProjectListing>, StoreError> {
        self.check()?;
        let area_id = match &filter.area {
            Some(slug) => match self.areas.iter().find(|a| &a.slug == slug) {
                Some(a) => Some(a.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        let developer_id = match &filter.developer {
            Some(slug) => match self.developers.iter().find(|d| &d.slug == slug) {
                Some(d) => Some(d.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut rows: Vec<ProjectListing> = self
            .projects
            .iter()
            .filter(|p| area_id.is_none() || p.area_id == area_id)
            .filter(|p| developer_id.is_none() || p.developer_id == developer_id)
            .map(|p| ProjectListing {
                project: p.clone(),
                developer_name: self.developers.iter().find(|d| Some(d.id) == p.developer_id).map(|d| d.name.clone()),
                area_name: self.areas.iter().find(|a| Some(a.id) == p.area_id).map(|a| a.name.clone()),
            })
            .collect();
        rows.sort_by(|a, b| (b.project.created_at, b.project.id).cmp(&(a.project.created_at, a.project.id)));
        rows.truncate(filter.limit.max(0) as usize);
        Ok(rows)
    }

    fn list_area_stats(&self) -> Result<Vec<AreaStat>, StoreError> {
        self.check()?;
        let mut out: Vec<AreaStat> = self
            .areas
            .iter()
            .map(|a| {
                let projects: Vec<&Project> = self.projects.iter().filter(|p| p.area_id == Some(a.id)).collect();
                AreaStat {
                    id: a.id,
                    slug: a.slug.clone(),
                    name: a.name.clone(),
                    image: a.image.clone(),
                    starting_price: a.starting_price.clone(),
                    description: a.description.clone(),
                    actual_project_count: projects.len() as i64,
                    min_price: projects
                        .iter()
                        .filter_map(|p| p.price_from.as_deref().and_then(parse_display_price))
                        .min(),
                }
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<Lead, StoreError> {
        self.check()?;
        let mut leads = self.leads.lock().unwrap();
        let row = Lead {
            id: leads.len() as i32 + 1,
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            email: lead.email.clone(),
            budget: lead.budget.clone(),
            interested_project: lead.interested_project.clone(),
            preferred_area: lead.preferred_area.clone(),
            bedrooms: lead.bedrooms.clone(),
            timeline: lead.timeline.clone(),
            investment_purpose: lead.investment_purpose.clone(),
            notes: lead.notes.clone(),
            source: lead.source.clone(),
            status: lead.status.clone(),
            created_at: ts(20),
        };
        leads.push(row.clone());
        Ok(row)
    }

    fn recent_leads(&self, limit: i64) -> Result<Vec<Lead>, StoreError> {
        self.check()?;
        let leads = self.leads.lock().unwrap();
        Ok(leads.iter().rev().take(limit.max(0) as usize).cloned().collect())
    }

    fn area_market(&self, area: &str) -> Result<Option<AreaMarketStats>, StoreError> {
        self.check()?;
        let slug = slugify(area);
        Ok(self
            .market
            .iter()
            .find(|m| Self::matches_area(&m.area_name, area) || m.area_slug.as_deref() == Some(slug.as_str()))
            .cloned())
    }

    fn list_area_market(&self, query: &AreaMarketQuery) -> Result<Vec<AreaMarketStats>, StoreError> {
        self.check()?;
        let mut rows = self.market.clone();
        let key = |m: &AreaMarketStats| -> f64 {
            match query.sort {
                AreaSort::TransactionCount => m.transaction_count as f64,
                AreaSort::AvgPricePerSqft => m.avg_price_per_sqft.unwrap_or(f64::MIN),
                AreaSort::MedianPrice => m.median_price.unwrap_or(f64::MIN),
                AreaSort::TotalVolume => m.total_volume.unwrap_or(f64::MIN),
                AreaSort::PriceChangeYoy => m.price_change_yoy.unwrap_or(f64::MIN),
                AreaSort::RentalYield => m.rental_yield.unwrap_or(f64::MIN),
                AreaSort::AreaName => 0.0,
            }
        };
        rows.sort_by(|a, b| {
            let ord = if query.sort == AreaSort::AreaName {
                a.area_name.cmp(&b.area_name)
            } else {
                key(a).total_cmp(&key(b))
            };
            match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        rows.truncate(query.limit.max(0) as usize);
        Ok(rows)
    }

    fn market_trends(&self, months: i64) -> Result<Vec<MarketTrend>, StoreError> {
        self.check()?;
        Ok(latest(&self.trends, months, |t| t.month))
    }

    fn area_history(&self, area: &str, months: i64) -> Result<Vec<AreaMonthlyStat>, StoreError> {
        self.check()?;
        let slug = slugify(area);
        let named_by_slug: Vec<&str> = self
            .market
            .iter()
            .filter(|m| m.area_slug.as_deref() == Some(slug.as_str()))
            .map(|m| m.area_name.as_str())
            .collect();
        let rows: Vec<AreaMonthlyStat> = self
            .monthly
            .iter()
            .filter(|m| Self::matches_area(&m.area_name, area) || named_by_slug.contains(&m.area_name.as_str()))
            .cloned()
            .collect();
        Ok(latest(&rows, months, |m| m.month))
    }

    fn market_overview(&self) -> Result<MarketOverview, StoreError> {
        self.check()?;
        let summary = MarketSummary {
            total_areas: self.market.len() as i64,
            total_transactions: self.market.iter().map(|m| m.transaction_count as i64).sum(),
            avg_price_per_sqft: None,
            total_volume: self.market.iter().filter_map(|m| m.total_volume).reduce(|a, b| a + b),
        };
        let mut top_areas = self.market.clone();
        top_areas.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));
        top_areas.truncate(5);
        Ok(MarketOverview {
            summary,
            top_areas,
            recent_trends: latest(&self.trends, 6, |t| t.month),
        })
    }
}
