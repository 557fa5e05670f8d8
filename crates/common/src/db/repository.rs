//! Repository pattern for database operations
//!
//! Implements the hierarchy collaborator traits over PostgreSQL. Type
//! tags, relations and memberships live in JSONB columns and are matched
//! with `jsonb_array_elements`, folding every tag synonym of a tier.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::hierarchy::store::{
    CitationCounter, EntityStore, PersonStore, StoreSearch, WorkCounter, WorkStore,
};
use crate::hierarchy::{
    Affiliation, AffiliationSort, AvailableFilters, CitationSnapshot, ExternalId, PersonRef,
    RelatedEntityRef, Tier, Work, WorkFilters, WorkSort, YearRange,
};
use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, Statement, Value,
};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, warn};

/// Positional-parameter SQL builder
struct SqlBuilder {
    sql: String,
    values: Vec<Value>,
}

impl SqlBuilder {
    fn new(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            values: Vec::new(),
        }
    }

    /// Bind a value and return its placeholder
    fn bind(&mut self, value: impl Into<Value>) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }

    fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    fn build(self) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, self.sql, self.values)
    }
}

/// Quoted tag list for `IN (...)`; tags are compile-time constants
fn tag_list(tier: Tier) -> String {
    tier.tags()
        .iter()
        .map(|t| format!("'{}'", t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `true` when a JSONB array of type records at `types_expr` holds a tag of `tier`
fn has_type(types_expr: &str, tier: Tier) -> String {
    format!(
        "EXISTS (SELECT 1 FROM jsonb_array_elements(COALESCE({}, '[]'::jsonb)) t \
         WHERE LOWER(t->>'type') IN ({}))",
        types_expr,
        tag_list(tier)
    )
}

fn affiliation_order(sort: AffiliationSort) -> &'static str {
    match sort {
        AffiliationSort::NameAsc => "a.name ASC",
        AffiliationSort::NameDesc => "a.name DESC",
        AffiliationSort::CitationsDesc => "COALESCE(c.citations_count, 0) DESC, a.name ASC",
        AffiliationSort::CitationsAsc => "COALESCE(c.citations_count, 0) ASC, a.name ASC",
    }
}

fn work_order(sort: WorkSort) -> &'static str {
    match sort {
        WorkSort::CitationsDesc => "w.citations_count DESC, w.id ASC",
        WorkSort::CitationsAsc => "w.citations_count ASC, w.id ASC",
        WorkSort::YearDesc => "w.year DESC NULLS LAST, w.id ASC",
        WorkSort::YearAsc => "w.year ASC NULLS LAST, w.id ASC",
        WorkSort::TitleAsc => "w.title ASC, w.id ASC",
    }
}

/// `ILIKE` substring pattern with wildcard characters in `keywords` escaped
fn contains_pattern(keywords: &str) -> String {
    let mut pattern = String::with_capacity(keywords.len() + 2);
    pattern.push('%');
    for c in keywords.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Paging value as a SQL `BIGINT`
fn sql_bigint(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| AppError::Validation {
        message: format!("{} {} is out of range", field, value),
        field: Some(field.to_string()),
    })
}

/// Append the `WHERE` body selecting search matches
fn push_search_filter(q: &mut SqlBuilder, request: &StoreSearch<'_>) {
    q.push(" WHERE TRUE");
    if let Some(keywords) = request.keywords {
        let p = q.bind(contains_pattern(keywords));
        q.push(&format!(" AND a.name ILIKE {} ESCAPE '\\'", p));
    }
    if let Some(scope) = request.scope {
        q.push(&format!(
            " AND LOWER(a.types->0->>'type') IN ({})",
            tag_list(scope)
        ));
    }
}

/// Append the `WHERE` body selecting works credited to an id+tier pair
fn push_work_scope(q: &mut SqlBuilder, id: &str, tier: Tier, filters: Option<&WorkFilters>) {
    let id_param = q.bind(id);
    let scope = match tier {
        Tier::Group => format!(
            "EXISTS (SELECT 1 FROM jsonb_array_elements(w.groups) g WHERE g->>'id' = {})",
            id_param
        ),
        Tier::Author => format!(
            "EXISTS (SELECT 1 FROM jsonb_array_elements(w.authors) au WHERE au->>'id' = {})",
            id_param
        ),
        _ => format!(
            "EXISTS (SELECT 1 FROM jsonb_array_elements(w.authors) au, \
             jsonb_array_elements(COALESCE(au->'affiliations', '[]'::jsonb)) af \
             WHERE af->>'id' = {} AND {})",
            id_param,
            has_type("af->'types'", tier)
        ),
    };
    q.push(&format!(" WHERE {}", scope));

    let Some(filters) = filters.filter(|f| !f.is_empty()) else {
        return;
    };
    if let Some(start) = filters.start_year {
        let p = q.bind(start);
        q.push(&format!(" AND w.year >= {}", p));
    }
    if let Some(end) = filters.end_year {
        let p = q.bind(end);
        q.push(&format!(" AND w.year <= {}", p));
    }
    if let Some(ref product_type) = filters.product_type {
        let p = q.bind(product_type.as_str());
        q.push(&format!(" AND w.product_type = {}", p));
    }
}

/// JSONB array column into a typed list; SQL `NULL`/JSON `null` is empty
fn json_list<T: DeserializeOwned>(value: serde_json::Value) -> Result<Vec<T>> {
    match value {
        serde_json::Value::Null => Ok(Vec::new()),
        other => Ok(serde_json::from_value(other)?),
    }
}

fn to_affiliation(row: AffiliationRow) -> Result<Affiliation> {
    Ok(Affiliation {
        id: row.id,
        name: row.name,
        types: json_list(row.types)?,
        relations: json_list(row.relations)?,
        logo: row.logo,
    })
}

fn to_work(row: WorkRow) -> Result<Work> {
    Ok(Work {
        id: row.id,
        title: row.title,
        year: row.year,
        product_type: row.product_type,
        citations_count: row.citations_count.max(0) as u64,
        authors: json_list(row.authors)?,
    })
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    /// Bound a collaborator call by the configured query timeout
    async fn timed<T>(
        &self,
        collaborator: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let limit = self.pool.query_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    collaborator,
                    timeout_ms = limit.as_millis() as u64,
                    "Collaborator query timed out"
                );
                Err(AppError::CollaboratorUnavailable {
                    collaborator: collaborator.to_string(),
                    message: format!("timed out after {:?}", limit),
                })
            }
        }
    }

    async fn count(&self, q: SqlBuilder) -> Result<u64> {
        let row = self
            .read_conn()
            .query_one(q.build())
            .await?
            .ok_or_else(|| AppError::Internal {
                message: "COUNT query returned no row".to_string(),
            })?;
        let total: i64 = row.try_get("", "total")?;
        Ok(total.max(0) as u64)
    }

    // ========================================================================
    // Affiliation Operations
    // ========================================================================

    async fn find_affiliation(&self, id: &str) -> Result<Option<Affiliation>> {
        AffiliationEntity::find_by_id(id.to_string())
            .one(self.read_conn())
            .await?
            .map(to_affiliation)
            .transpose()
    }

    async fn search_affiliations(&self, request: &StoreSearch<'_>) -> Result<(Vec<Affiliation>, u64)> {
        let mut count_q = SqlBuilder::new("SELECT COUNT(*) AS total FROM affiliations a");
        push_search_filter(&mut count_q, request);
        let total = self.count(count_q).await?;

        let mut q = SqlBuilder::new(
            "SELECT a.* FROM affiliations a \
             LEFT JOIN affiliation_calculations c ON c.id = a.id",
        );
        push_search_filter(&mut q, request);
        let offset = q.bind(sql_bigint(request.skip, "page")?);
        let limit = q.bind(sql_bigint(request.limit, "max")?);
        q.push(&format!(
            " ORDER BY {} OFFSET {} LIMIT {}",
            affiliation_order(request.sort),
            offset,
            limit
        ));

        let rows = AffiliationEntity::find()
            .from_raw_sql(q.build())
            .all(self.read_conn())
            .await?;
        let records = rows.into_iter().map(to_affiliation).collect::<Result<Vec<_>>>()?;

        debug!(total, page_len = records.len(), "Affiliation search executed");
        Ok((records, total))
    }

    async fn find_children(&self, id: &str, child: Tier, parent: Tier) -> Result<Vec<RelatedEntityRef>> {
        let mut q = SqlBuilder::new("SELECT a.* FROM affiliations a WHERE ");
        let p = q.bind(id);
        q.push(&format!(
            "LOWER(a.types->0->>'type') IN ({}) \
             AND EXISTS (SELECT 1 FROM jsonb_array_elements(COALESCE(a.relations, '[]'::jsonb)) r \
             WHERE r->>'id' = {} AND LOWER(r->>'type') IN ({})) \
             ORDER BY a.name ASC",
            tag_list(child),
            p,
            tag_list(parent)
        ));

        let rows = AffiliationEntity::find()
            .from_raw_sql(q.build())
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| RelatedEntityRef {
                id: row.id,
                name: row.name,
                logo: row.logo,
            })
            .collect())
    }

    async fn find_authors(&self, id: &str, tier: Tier) -> Result<Vec<PersonRef>> {
        let mut q = SqlBuilder::new("SELECT p.* FROM persons p WHERE ");
        let p = q.bind(id);
        q.push(&format!(
            "EXISTS (SELECT 1 FROM jsonb_array_elements(COALESCE(p.affiliations, '[]'::jsonb)) m \
             WHERE m->>'id' = {} AND {}) \
             ORDER BY p.full_name ASC",
            p,
            has_type("m->'types'", tier)
        ));

        let rows = PersonEntity::find()
            .from_raw_sql(q.build())
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| PersonRef {
                id: row.id,
                full_name: row.full_name,
            })
            .collect())
    }

    // ========================================================================
    // Work Operations
    // ========================================================================

    async fn count_works(&self, id: &str, tier: Tier, filters: Option<&WorkFilters>) -> Result<u64> {
        let mut q = SqlBuilder::new("SELECT COUNT(*) AS total FROM works w");
        push_work_scope(&mut q, id, tier, filters);
        self.count(q).await
    }

    async fn list_works(
        &self,
        id: &str,
        tier: Tier,
        skip: u64,
        limit: u64,
        sort: WorkSort,
        filters: &WorkFilters,
    ) -> Result<Vec<Work>> {
        let mut q = SqlBuilder::new("SELECT w.* FROM works w");
        push_work_scope(&mut q, id, tier, Some(filters));
        let offset = q.bind(sql_bigint(skip, "page")?);
        let limit = q.bind(sql_bigint(limit, "max")?);
        q.push(&format!(
            " ORDER BY {} OFFSET {} LIMIT {}",
            work_order(sort),
            offset,
            limit
        ));

        let rows = WorkEntity::find()
            .from_raw_sql(q.build())
            .all(self.read_conn())
            .await?;
        rows.into_iter().map(to_work).collect()
    }

    async fn work_filters(&self, id: &str, tier: Tier) -> Result<AvailableFilters> {
        let mut types_q = SqlBuilder::new("SELECT DISTINCT w.product_type AS product_type FROM works w");
        push_work_scope(&mut types_q, id, tier, None);
        types_q.push(" AND w.product_type IS NOT NULL ORDER BY 1");

        let product_types = self
            .read_conn()
            .query_all(types_q.build())
            .await?
            .into_iter()
            .map(|row| row.try_get::<String>("", "product_type"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut years_q =
            SqlBuilder::new("SELECT MIN(w.year) AS min_year, MAX(w.year) AS max_year FROM works w");
        push_work_scope(&mut years_q, id, tier, None);

        let years = match self.read_conn().query_one(years_q.build()).await? {
            Some(row) => {
                let min: Option<i32> = row.try_get("", "min_year")?;
                let max: Option<i32> = row.try_get("", "max_year")?;
                min.zip(max).map(|(min, max)| YearRange { min, max })
            }
            None => None,
        };

        Ok(AvailableFilters {
            product_types,
            years,
        })
    }
}

#[async_trait]
impl EntityStore for Repository {
    async fn get_by_id(&self, id: &str) -> Result<Option<Affiliation>> {
        self.timed("entity_store", self.find_affiliation(id)).await
    }

    async fn search(&self, request: &StoreSearch<'_>) -> Result<(Vec<Affiliation>, u64)> {
        self.timed("entity_store", self.search_affiliations(request))
            .await
    }

    async fn children_by_type(
        &self,
        id: &str,
        child: Tier,
        parent: Tier,
    ) -> Result<Vec<RelatedEntityRef>> {
        self.timed("entity_store", self.find_children(id, child, parent))
            .await
    }

    async fn authors_by_affiliation(&self, id: &str, tier: Tier) -> Result<Vec<PersonRef>> {
        self.timed("entity_store", self.find_authors(id, tier)).await
    }
}

#[async_trait]
impl WorkCounter for Repository {
    async fn count_by_affiliation(
        &self,
        id: &str,
        type_tag: &str,
        filters: Option<&WorkFilters>,
    ) -> Result<u64> {
        let Some(tier) = Tier::from_tag(type_tag) else {
            return Ok(0);
        };
        self.timed("work_counter", self.count_works(id, tier, filters))
            .await
    }
}

#[async_trait]
impl WorkStore for Repository {
    async fn list_by_affiliation(
        &self,
        id: &str,
        type_tag: &str,
        skip: u64,
        limit: u64,
        sort: WorkSort,
        filters: &WorkFilters,
    ) -> Result<Vec<Work>> {
        let Some(tier) = Tier::from_tag(type_tag) else {
            return Ok(Vec::new());
        };
        self.timed(
            "work_store",
            self.list_works(id, tier, skip, limit, sort, filters),
        )
        .await
    }

    async fn available_filters(&self, id: &str, type_tag: &str) -> Result<AvailableFilters> {
        let Some(tier) = Tier::from_tag(type_tag) else {
            return Ok(AvailableFilters::default());
        };
        self.timed("work_store", self.work_filters(id, tier)).await
    }
}

#[async_trait]
impl CitationCounter for Repository {
    async fn citations_by_id(&self, id: &str) -> Result<Option<CitationSnapshot>> {
        self.timed("citation_counter", async {
            let row = AffiliationCalculationEntity::find_by_id(id.to_string())
                .one(self.read_conn())
                .await?;
            Ok(row.map(|r| CitationSnapshot {
                citations_count: r.citations_count.max(0) as u64,
            }))
        })
        .await
    }
}

#[async_trait]
impl PersonStore for Repository {
    async fn external_ids(&self, person_id: &str) -> Result<Vec<ExternalId>> {
        self.timed("person_store", async {
            let row = PersonEntity::find_by_id(person_id.to_string())
                .one(self.read_conn())
                .await?
                .ok_or_else(|| AppError::NotFound {
                    resource_type: "person".to_string(),
                    id: person_id.to_string(),
                })?;
            json_list(row.external_ids)
        })
        .await
    }
}
