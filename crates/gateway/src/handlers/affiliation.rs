//! Affiliation detail handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use validator::Validate;

use super::{observe, parse_tier};
use crate::AppState;
use quyca_common::{
    errors::Result,
    hierarchy::{EnrichedAffiliation, RelatedEntities, ResearchProducts, ResearchProductsQuery},
    metrics::RequestMetrics,
};

/// Affiliation detail envelope
#[derive(Debug, Serialize)]
pub struct AffiliationResponse {
    pub data: EnrichedAffiliation,
    /// Reserved for detail-page filters; always empty
    pub filters: serde_json::Map<String, serde_json::Value>,
}

/// Get one enriched affiliation
///
/// GET /affiliation/{typ}/{id}
pub async fn get_affiliation(
    State(state): State<AppState>,
    Path((typ, id)): Path<(String, String)>,
) -> Result<Json<AffiliationResponse>> {
    let metrics = RequestMetrics::start("GET", "/affiliation/{typ}/{id}");

    let result = async {
        parse_tier(&typ)?;
        state.service.get_enriched_affiliation(&id).await
    }
    .await;

    Ok(Json(AffiliationResponse {
        data: observe(metrics, result)?,
        filters: serde_json::Map::new(),
    }))
}

/// Descendant tiers of an affiliation
///
/// GET /affiliation/{typ}/{id}/affiliations
///
/// An unrecognized `typ` yields an empty object.
pub async fn get_related(
    State(state): State<AppState>,
    Path((typ, id)): Path<(String, String)>,
) -> Result<Json<RelatedEntities>> {
    let metrics = RequestMetrics::start("GET", "/affiliation/{typ}/{id}/affiliations");

    let result = state.service.get_related_entities(&id, Some(&typ)).await;
    observe(metrics, result).map(Json)
}

/// Research products credited to an affiliation
///
/// GET /affiliation/{typ}/{id}/research/products
pub async fn get_research_products(
    State(state): State<AppState>,
    Path((typ, id)): Path<(String, String)>,
    Query(query): Query<ResearchProductsQuery>,
) -> Result<Json<ResearchProducts>> {
    let metrics = RequestMetrics::start("GET", "/affiliation/{typ}/{id}/research/products");

    let result = async {
        query.validate()?;
        state.service.research_products(&id, &typ, &query).await
    }
    .await;

    observe(metrics, result).map(Json)
}
