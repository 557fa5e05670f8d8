//! Collaborator contracts consumed by the hierarchy core
//!
//! The core never talks to storage directly. [`crate::db::Repository`]
//! implements every trait here; tests use in-memory fakes.

use super::model::{Affiliation, CitationSnapshot, ExternalId, PersonRef, RelatedEntityRef};
use super::products::{AvailableFilters, Work, WorkFilters, WorkSort};
use super::search::AffiliationSort;
use super::tier::Tier;
use crate::errors::Result;
use async_trait::async_trait;

/// Paged lookup parameters handed to [`EntityStore::search`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSearch<'a> {
    pub keywords: Option<&'a str>,
    pub skip: u64,
    pub limit: u64,
    pub sort: AffiliationSort,
    /// Restrict to affiliations whose primary type is this tier
    pub scope: Option<Tier>,
}

/// Affiliation records and hierarchy edges
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch one affiliation; `None` when the id is absent
    async fn get_by_id(&self, id: &str) -> Result<Option<Affiliation>>;

    /// One page of matches plus the total match count across all pages
    async fn search(&self, request: &StoreSearch<'_>) -> Result<(Vec<Affiliation>, u64)>;

    /// Direct children of `id` whose type is `child`
    async fn children_by_type(
        &self,
        id: &str,
        child: Tier,
        parent: Tier,
    ) -> Result<Vec<RelatedEntityRef>>;

    /// Persons affiliated with `id` under the given tier
    async fn authors_by_affiliation(&self, id: &str, tier: Tier) -> Result<Vec<PersonRef>>;
}

/// Product counts scoped to one id+type pair
#[async_trait]
pub trait WorkCounter: Send + Sync {
    async fn count_by_affiliation(
        &self,
        id: &str,
        type_tag: &str,
        filters: Option<&WorkFilters>,
    ) -> Result<u64>;
}

/// Research product listings
#[async_trait]
pub trait WorkStore: WorkCounter {
    async fn list_by_affiliation(
        &self,
        id: &str,
        type_tag: &str,
        skip: u64,
        limit: u64,
        sort: WorkSort,
        filters: &WorkFilters,
    ) -> Result<Vec<Work>>;

    /// Filter values present among the pair's works
    async fn available_filters(&self, id: &str, type_tag: &str) -> Result<AvailableFilters>;
}

/// Precomputed citation totals
#[async_trait]
pub trait CitationCounter: Send + Sync {
    async fn citations_by_id(&self, id: &str) -> Result<Option<CitationSnapshot>>;
}

/// Person records
#[async_trait]
pub trait PersonStore: Send + Sync {
    async fn external_ids(&self, person_id: &str) -> Result<Vec<ExternalId>>;
}
