//! Search handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use super::{observe, parse_tier};
use crate::AppState;
use quyca_common::{
    errors::Result,
    hierarchy::{AffiliationQuery, EnrichedAffiliation, PagedResult},
    metrics::RequestMetrics,
};

/// Search affiliations of one tier
///
/// GET /search/affiliations/{typ}
pub async fn search_affiliations(
    State(state): State<AppState>,
    Path(typ): Path<String>,
    Query(mut query): Query<AffiliationQuery>,
) -> Result<Json<PagedResult<EnrichedAffiliation>>> {
    let metrics = RequestMetrics::start("GET", "/search/affiliations/{typ}");

    let result = async {
        query.validate()?;
        query.scope = Some(parse_tier(&typ)?);
        state.service.search_affiliations(&query).await
    }
    .await;

    observe(metrics, result).map(Json)
}

#[cfg(test)]
mod tests {
    use quyca_common::hierarchy::{AffiliationQuery, AffiliationSort};

    #[test]
    fn test_query_string_defaults() {
        let query: AffiliationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.max, None);
        assert_eq!(query.sort, AffiliationSort::CitationsDesc);
        assert!(query.scope.is_none());
    }

    #[test]
    fn test_query_string_sort() {
        let query: AffiliationQuery =
            serde_json::from_str(r#"{"keywords":"física","page":2,"max":25,"sort":"name_asc"}"#)
                .unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.max, Some(25));
        assert_eq!(query.sort, AffiliationSort::NameAsc);
    }
}
