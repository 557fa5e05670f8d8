//! Affiliation enrichment
//!
//! Combines the resolved upside with live product and citation counts.
//! Counts are never cached; two reads may differ if works changed.

use super::model::{Affiliation, EnrichedAffiliation};
use super::resolver::resolve_upside;
use super::store::{CitationCounter, WorkCounter};
use crate::errors::{AppError, Result};
use tracing::debug;

/// Enrich one affiliation record.
///
/// Fails with [`AppError::InvalidPrecondition`] when the record has no
/// types. Collaborator errors are returned unchanged.
pub async fn enrich(
    affiliation: Affiliation,
    works: &dyn WorkCounter,
    citations: &dyn CitationCounter,
) -> Result<EnrichedAffiliation> {
    let primary = affiliation
        .primary_type()
        .ok_or_else(|| AppError::InvalidPrecondition {
            message: format!("affiliation {} has no types", affiliation.id),
        })?
        .to_string();

    let upside = resolve_upside(&affiliation.relations, &primary);

    let (products_count, snapshot) = tokio::try_join!(
        works.count_by_affiliation(&affiliation.id, &primary, None),
        citations.citations_by_id(&affiliation.id),
    )?;
    let citations_count = snapshot.map(|s| s.citations_count).unwrap_or(0);

    debug!(
        affiliation_id = %affiliation.id,
        primary_type = %primary,
        parents = upside.parents.len(),
        products_count,
        citations_count,
        "Affiliation enriched"
    );

    Ok(EnrichedAffiliation {
        logo: upside.logo.or(affiliation.logo),
        id: affiliation.id,
        name: affiliation.name,
        types: affiliation.types,
        relations: affiliation.relations,
        affiliations: upside.parents,
        products_count,
        citations_count,
    })
}
