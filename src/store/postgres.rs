use super::{AreaMarketQuery, AreaSort, ProjectFilter, SortOrder, Store, StoreError};
use crate::db::models::{
    AreaMarketStats, AreaMonthlyStat, AreaStat, Developer, DeveloperDetail, DeveloperSummary, Lead, MarketOverview,
    MarketSummary, MarketTrend, NewLead, Project, ProjectListing,
};
use crate::schema;
use crate::utils::slugify;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_types::BigInt;
use diesel::PgConnection;
use log::debug;
use std::num::NonZeroU32;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

const TOP_AREAS: i64 = 5;
const RECENT_TREND_MONTHS: i64 = 6;

const DEVELOPER_SUMMARY_SQL: &str = "\
    SELECT d.id, d.slug, d.name, d.description, d.logo, d.website, d.founded_year, \
           COUNT(p.id) AS project_count, \
           AVG(p.match_score)::float8 AS avg_match_score \
    FROM developers d \
    LEFT JOIN projects p ON p.developer_id = d.id \
    GROUP BY d.id \
    ORDER BY project_count DESC, d.name ASC";

const MARKET_SUMMARY_SQL: &str = "\
    SELECT COUNT(*) AS total_areas, \
           COALESCE(SUM(transaction_count), 0)::int8 AS total_transactions, \
           AVG(avg_price_per_sqft)::float8 AS avg_price_per_sqft, \
           SUM(total_volume)::float8 AS total_volume \
    FROM area_market_stats";

/// Build the process-wide pool. Connects eagerly so a bad `DATABASE_URL`
/// fails at startup rather than on the first request.
pub fn build_pool(database_url: &str, max_size: NonZeroU32) -> Result<PgPool, String> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size.get())
        .build(manager)
        .map_err(|e| format!("DB connection failed: {}", e))
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }
}

fn developer_summaries(conn: &mut PgConnection, limit: Option<i64>) -> QueryResult<Vec<DeveloperSummary>> {
    match limit {
        Some(n) => diesel::sql_query(format!("{DEVELOPER_SUMMARY_SQL} LIMIT $1"))
            .bind::<BigInt, _>(n)
            .load(conn),
        None => diesel::sql_query(DEVELOPER_SUMMARY_SQL).load(conn),
    }
}

/// ILIKE patterns for a user-supplied area name: as given, and with hyphens read
/// as spaces ("dubai-marina" matches "Dubai Marina"). LIKE wildcards are escaped.
fn area_name_patterns(area: &str) -> (String, String) {
    let escaped = area
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let spaced = escaped.replace('-', " ");
    (escaped, spaced)
}

type BoxedAreaMarket<'a> = schema::area_market_stats::BoxedQuery<'a, Pg>;

fn order_area_market(query: BoxedAreaMarket<'_>, sort: AreaSort, order: SortOrder) -> BoxedAreaMarket<'_> {
    use schema::area_market_stats::dsl as S;

    // Ties broken by id so paging is stable.
    macro_rules! by {
        ($col:expr) => {
            match order {
                SortOrder::Asc => query.order(($col.asc().nulls_last(), S::id.asc())),
                SortOrder::Desc => query.order(($col.desc().nulls_last(), S::id.asc())),
            }
        };
    }

    match sort {
        AreaSort::TransactionCount => by!(S::transaction_count),
        AreaSort::AvgPricePerSqft => by!(S::avg_price_per_sqft),
        AreaSort::MedianPrice => by!(S::median_price),
        AreaSort::TotalVolume => by!(S::total_volume),
        AreaSort::PriceChangeYoy => by!(S::price_change_yoy),
        AreaSort::RentalYield => by!(S::rental_yield),
        AreaSort::AreaName => by!(S::area_name),
    }
}

impl Store for PgStore {
    fn list_developers(&self) -> Result<Vec<DeveloperSummary>, StoreError> {
        let mut conn = self.conn()?;
        Ok(developer_summaries(&mut conn, None)?)
    }

    fn featured_developers(&self, limit: i64) -> Result<Vec<DeveloperSummary>, StoreError> {
        let mut conn = self.conn()?;
        Ok(developer_summaries(&mut conn, Some(limit))?)
    }

    fn developer_by_slug(&self, slug: &str) -> Result<Option<DeveloperDetail>, StoreError> {
        use schema::developers::dsl as D;
        use schema::projects::dsl as P;

        let mut conn = self.conn()?;
        let developer: Option<Developer> = D::developers
            .filter(D::slug.eq(slug))
            .select(Developer::as_select())
            .first(&mut conn)
            .optional()?;
        let Some(developer) = developer else {
            return Ok(None);
        };

        let projects = Project::belonging_to(&developer)
            .select(Project::as_select())
            .order((P::created_at.desc(), P::id.desc()))
            .load(&mut conn)?;
        debug!("Developer {} has {} project(s)", developer.slug, projects.len());

        Ok(Some(DeveloperDetail { developer, projects }))
    }

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<ProjectListing>, StoreError> {
        use schema::areas::dsl as A;
        use schema::developers::dsl as D;
        use schema::projects::dsl as P;

        let mut conn = self.conn()?;
        let mut query = P::projects
            .left_join(D::developers)
            .left_join(A::areas)
            .select((Project::as_select(), D::name.nullable(), A::name.nullable()))
            .order((P::created_at.desc(), P::id.desc()))
            .limit(filter.limit)
            .into_boxed();

        if let Some(area_slug) = &filter.area {
            let area_id: Option<i32> = A::areas
                .filter(A::slug.eq(area_slug))
                .select(A::id)
                .first(&mut conn)
                .optional()?;
            match area_id {
                Some(id) => query = query.filter(P::area_id.eq(id)),
                None => return Ok(Vec::new()),
            }
        }
        if let Some(developer_slug) = &filter.developer {
            let developer_id: Option<i32> = D::developers
                .filter(D::slug.eq(developer_slug))
                .select(D::id)
                .first(&mut conn)
                .optional()?;
            match developer_id {
                Some(id) => query = query.filter(P::developer_id.eq(id)),
                None => return Ok(Vec::new()),
            }
        }

        let rows: Vec<(Project, Option<String>, Option<String>)> = query.load(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(project, developer_name, area_name)| ProjectListing {
                project,
                developer_name,
                area_name,
            })
            .collect())
    }

    fn list_area_stats(&self) -> Result<Vec<AreaStat>, StoreError> {
        use schema::area_stats::dsl as V;

        let mut conn = self.conn()?;
        Ok(V::area_stats
            .select(AreaStat::as_select())
            .order(V::name.asc())
            .load(&mut conn)?)
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<Lead, StoreError> {
        use schema::leads::dsl as L;

        let mut conn = self.conn()?;
        Ok(diesel::insert_into(L::leads)
            .values(lead)
            .returning(Lead::as_returning())
            .get_result(&mut conn)?)
    }

    fn recent_leads(&self, limit: i64) -> Result<Vec<Lead>, StoreError> {
        use schema::leads::dsl as L;

        let mut conn = self.conn()?;
        Ok(L::leads
            .select(Lead::as_select())
            .order((L::created_at.desc(), L::id.desc()))
            .limit(limit)
            .load(&mut conn)?)
    }

    fn area_market(&self, area: &str) -> Result<Option<AreaMarketStats>, StoreError> {
        use schema::area_market_stats::dsl as S;

        let (as_given, spaced) = area_name_patterns(area);
        let mut conn = self.conn()?;
        Ok(S::area_market_stats
            .filter(
                S::area_name
                    .ilike(as_given)
                    .or(S::area_name.ilike(spaced))
                    .or(S::area_slug.eq(slugify(area))),
            )
            .order(S::id.asc())
            .select(AreaMarketStats::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn list_area_market(&self, query: &AreaMarketQuery) -> Result<Vec<AreaMarketStats>, StoreError> {
        use schema::area_market_stats::dsl as S;

        let mut conn = self.conn()?;
        let boxed = order_area_market(S::area_market_stats.into_boxed(), query.sort, query.order);
        Ok(boxed.limit(query.limit).load(&mut conn)?)
    }

    fn market_trends(&self, months: i64) -> Result<Vec<MarketTrend>, StoreError> {
        use schema::market_trends::dsl as T;

        let mut conn = self.conn()?;
        let mut rows: Vec<MarketTrend> = T::market_trends
            .select(MarketTrend::as_select())
            .order(T::month.desc())
            .limit(months)
            .load(&mut conn)?;
        rows.reverse();
        Ok(rows)
    }

    fn area_history(&self, area: &str, months: i64) -> Result<Vec<AreaMonthlyStat>, StoreError> {
        use schema::area_market_stats::dsl as S;
        use schema::area_monthly_stats::dsl as M;

        let (as_given, spaced) = area_name_patterns(area);
        // A slug reaches monthly rows through the name it carries in area_market_stats.
        let named_by_slug = S::area_market_stats
            .filter(S::area_slug.eq(slugify(area)))
            .select(S::area_name);
        let mut conn = self.conn()?;
        let mut rows: Vec<AreaMonthlyStat> = M::area_monthly_stats
            .filter(
                M::area_name
                    .ilike(as_given)
                    .or(M::area_name.ilike(spaced))
                    .or(M::area_name.eq_any(named_by_slug)),
            )
            .select(AreaMonthlyStat::as_select())
            .order(M::month.desc())
            .limit(months)
            .load(&mut conn)?;
        rows.reverse();
        Ok(rows)
    }

    fn market_overview(&self) -> Result<MarketOverview, StoreError> {
        use schema::area_market_stats::dsl as S;
        use schema::market_trends::dsl as T;

        let mut conn = self.conn()?;
        let summary: MarketSummary = diesel::sql_query(MARKET_SUMMARY_SQL).get_result(&mut conn)?;
        let top_areas = S::area_market_stats
            .select(AreaMarketStats::as_select())
            .order((S::transaction_count.desc(), S::id.asc()))
            .limit(TOP_AREAS)
            .load(&mut conn)?;
        let mut recent_trends: Vec<MarketTrend> = T::market_trends
            .select(MarketTrend::as_select())
            .order(T::month.desc())
            .limit(RECENT_TREND_MONTHS)
            .load(&mut conn)?;
        recent_trends.reverse();

        Ok(MarketOverview {
            summary,
            top_areas,
            recent_trends,
        })
    }
}
