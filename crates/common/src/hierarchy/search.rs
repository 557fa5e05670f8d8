//! Paged affiliation search with per-record enrichment

use super::aggregator::enrich;
use super::model::EnrichedAffiliation;
use super::store::{CitationCounter, EntityStore, StoreSearch, WorkCounter};
use super::tier::Tier;
use crate::config::PaginationConfig;
use crate::errors::Result;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Ordering of affiliation search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliationSort {
    NameAsc,
    NameDesc,
    #[default]
    CitationsDesc,
    CitationsAsc,
}

fn default_page() -> u64 { 1 }

/// Affiliation search parameters
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AffiliationQuery {
    #[serde(default)]
    #[validate(length(max = 500))]
    pub keywords: Option<String>,

    /// 1-based page number
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u64,

    /// Page size; falls back to the configured default
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max: Option<u64>,

    #[serde(default)]
    pub sort: AffiliationSort,

    /// Primary tier to search in, usually taken from the route
    #[serde(skip)]
    pub scope: Option<Tier>,
}

impl AffiliationQuery {
    /// Trimmed keywords, `None` when blank
    pub fn keywords(&self) -> Option<&str> {
        self.keywords
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Matches across all pages
    pub total_results: u64,
    pub page: u64,
    /// Length of `data`
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> PagedResult<T> {
    pub fn new(total_results: u64, page: u64, data: Vec<T>) -> Self {
        Self {
            total_results,
            page,
            count: data.len(),
            data,
        }
    }
}

/// Run a paged search and enrich every record on the page.
///
/// Enrichment is fail-fast: the first failing record fails the page.
pub async fn search_affiliations(
    store: &dyn EntityStore,
    works: &dyn WorkCounter,
    citations: &dyn CitationCounter,
    query: &AffiliationQuery,
    pagination: &PaginationConfig,
) -> Result<PagedResult<EnrichedAffiliation>> {
    query.validate()?;
    let window = pagination.window(query.page, query.max)?;

    let (mut records, total) = store
        .search(&StoreSearch {
            keywords: query.keywords(),
            skip: window.skip,
            limit: window.limit,
            sort: query.sort,
            scope: query.scope,
        })
        .await?;
    records.truncate(window.limit as usize);

    let data = try_join_all(
        records
            .into_iter()
            .map(|record| enrich(record, works, citations)),
    )
    .await?;

    Ok(PagedResult::new(total, query.page, data))
}
