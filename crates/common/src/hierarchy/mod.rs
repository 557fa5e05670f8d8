//! Affiliation hierarchy core
//!
//! Read-side aggregation for the institution > faculty > department >
//! group > author hierarchy:
//! - Upside relation resolution and logo inheritance
//! - Enrichment with live product and citation counts
//! - Downward assembly of related tiers
//! - Paged search with per-record enrichment
//! - Research product listings
//!
//! Storage is reached only through the traits in [`store`].

mod aggregator;
mod model;
mod products;
mod related;
mod resolver;
mod search;
mod service;
pub mod store;
mod tier;

#[cfg(test)]
mod testing;

pub use aggregator::enrich;
pub use model::{
    Affiliation, CitationSnapshot, EnrichedAffiliation, ExternalId, PersonRef, RelatedEntityRef,
    Relation, TypeRecord,
};
pub use products::{
    research_products, AvailableFilters, Cursor, ResearchProducts, ResearchProductsQuery, Work,
    WorkAuthor, WorkFilters, WorkSort, YearRange,
};
pub use related::{assemble_related, RelatedEntities};
pub use resolver::{resolve_upside, Upside};
pub use search::{search_affiliations, AffiliationQuery, AffiliationSort, PagedResult};
pub use service::AffiliationService;
pub use tier::Tier;
