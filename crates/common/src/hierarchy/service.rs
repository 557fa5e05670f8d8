//! Affiliation service
//!
//! Entry point used by the API layer. Holds the collaborators and the
//! slices of configuration the core needs, and wraps each operation with
//! logging and metrics.

use super::aggregator::enrich;
use super::model::EnrichedAffiliation;
use super::products::{research_products, ResearchProducts, ResearchProductsQuery};
use super::related::{assemble_related, RelatedEntities};
use super::search::{search_affiliations, AffiliationQuery, PagedResult};
use super::store::{CitationCounter, EntityStore, PersonStore, WorkStore};
use crate::config::{ApiConfig, PaginationConfig};
use crate::db::Repository;
use crate::errors::{AppError, Result};
use crate::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Affiliation read operations
#[derive(Clone)]
pub struct AffiliationService {
    entities: Arc<dyn EntityStore>,
    works: Arc<dyn WorkStore>,
    citations: Arc<dyn CitationCounter>,
    persons: Arc<dyn PersonStore>,
    api: ApiConfig,
    pagination: PaginationConfig,
}

impl AffiliationService {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        works: Arc<dyn WorkStore>,
        citations: Arc<dyn CitationCounter>,
        persons: Arc<dyn PersonStore>,
        api: ApiConfig,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            entities,
            works,
            citations,
            persons,
            api,
            pagination,
        }
    }

    /// Service backed by a single repository for every collaborator
    pub fn from_repository(
        repo: Repository,
        api: ApiConfig,
        pagination: PaginationConfig,
    ) -> Self {
        let repo = Arc::new(repo);
        Self::new(repo.clone(), repo.clone(), repo.clone(), repo, api, pagination)
    }

    /// Fetch and enrich one affiliation
    #[instrument(skip(self))]
    pub async fn get_enriched_affiliation(&self, id: &str) -> Result<EnrichedAffiliation> {
        let start = Instant::now();

        let affiliation = self
            .entities
            .get_by_id(id)
            .await
            .inspect_err(|e| {
                metrics::record_collaborator_error("get", e);
            })?
            .ok_or_else(|| AppError::AffiliationNotFound { id: id.to_string() })?;

        let enriched = enrich(affiliation, self.works.as_ref(), self.citations.as_ref())
            .await
            .inspect_err(|e| {
                metrics::record_collaborator_error("enrich", e);
            })?;

        metrics::record_enrichment(start.elapsed().as_secs_f64(), 1);
        Ok(enriched)
    }

    /// Paged search with every record enriched
    #[instrument(skip(self, query), fields(page = query.page, scope = ?query.scope))]
    pub async fn search_affiliations(
        &self,
        query: &AffiliationQuery,
    ) -> Result<PagedResult<EnrichedAffiliation>> {
        let start = Instant::now();

        let result = search_affiliations(
            self.entities.as_ref(),
            self.works.as_ref(),
            self.citations.as_ref(),
            query,
            &self.pagination,
        )
        .await
        .inspect_err(|e| {
            metrics::record_collaborator_error("search", e);
        })?;

        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_enrichment(elapsed, result.count);
        metrics::record_search(
            elapsed,
            query.scope.map(|s| s.as_tag()).unwrap_or("all"),
            result.count,
        );

        info!(
            keywords = ?query.keywords(),
            total_results = result.total_results,
            count = result.count,
            latency_ms = (elapsed * 1000.0) as u64,
            "Affiliation search completed"
        );

        Ok(result)
    }

    /// Descendant tiers of an affiliation
    #[instrument(skip(self))]
    pub async fn get_related_entities(
        &self,
        id: &str,
        typ: Option<&str>,
    ) -> Result<RelatedEntities> {
        let related = assemble_related(self.entities.as_ref(), id, typ)
            .await
            .inspect_err(|e| {
                metrics::record_collaborator_error("related", e);
            })?;

        metrics::record_related(typ.unwrap_or("none"), related.tier_keys().len());
        Ok(related)
    }

    /// Research products of an affiliation
    #[instrument(skip(self, query))]
    pub async fn research_products(
        &self,
        id: &str,
        typ: &str,
        query: &ResearchProductsQuery,
    ) -> Result<ResearchProducts> {
        research_products(
            self.works.as_ref(),
            self.persons.as_ref(),
            &self.api,
            &self.pagination,
            id,
            typ,
            query,
        )
        .await
        .inspect_err(|e| {
            metrics::record_collaborator_error("research_products", e);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::testing::{affiliation, relation, MemoryStore};
    use crate::hierarchy::Tier;

    fn service(store: MemoryStore) -> AffiliationService {
        let store = Arc::new(store);
        AffiliationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            ApiConfig::default(),
            PaginationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_get_enriched_affiliation() {
        let mut store = MemoryStore::with(vec![affiliation(
            "D1",
            "department",
            vec![
                relation("F1", "faculty", Some("fac.png")),
                relation("I1", "institution", Some("inst.png")),
            ],
        )]);
        store.set_products("D1", "department", 9);

        let enriched = service(store).get_enriched_affiliation("D1").await.unwrap();
        assert_eq!(enriched.affiliations.len(), 2);
        assert_eq!(enriched.logo.as_deref(), Some("fac.png"));
        assert_eq!(enriched.products_count, 9);
    }

    #[tokio::test]
    async fn test_missing_affiliation_is_not_found() {
        let err = service(MemoryStore::default())
            .get_enriched_affiliation("nope")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AffiliationNotFound { ref id } if id == "nope"));
    }

    #[tokio::test]
    async fn test_search_through_service() {
        let store = MemoryStore::with(vec![
            affiliation("G1", "group", vec![]),
            affiliation("G2", "group", vec![]),
        ]);
        let query = AffiliationQuery {
            page: 1,
            scope: Some(Tier::Group),
            ..AffiliationQuery::default()
        };
        let result = service(store).search_affiliations(&query).await.unwrap();
        assert_eq!(result.total_results, 2);
        assert_eq!(result.count, 2);
    }

    #[tokio::test]
    async fn test_related_through_service() {
        let store = MemoryStore::with(vec![affiliation(
            "G1",
            "group",
            vec![relation("D1", "department", None)],
        )]);
        let related = service(store)
            .get_related_entities("D1", Some("department"))
            .await
            .unwrap();
        assert_eq!(related.groups.unwrap().len(), 1);
        assert_eq!(related.authors, Some(vec![]));
    }
}
