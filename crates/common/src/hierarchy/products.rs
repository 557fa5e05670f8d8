//! Research products attributed to an affiliation
//!
//! Lists works for an id+type pair with filters, decorates each author
//! with external identifiers, and builds cursor links from the API
//! configuration handed in by the caller.

use super::model::ExternalId;
use super::store::{PersonStore, WorkStore};
use crate::config::{ApiConfig, PaginationConfig};
use crate::errors::{AppError, Result};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Author entry on a work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkAuthor {
    #[serde(default)]
    pub id: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub external_ids: Vec<ExternalId>,
}

/// Research product summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub citations_count: u64,
    #[serde(default)]
    pub authors: Vec<WorkAuthor>,
}

/// Ordering of research products
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkSort {
    #[default]
    CitationsDesc,
    CitationsAsc,
    YearDesc,
    YearAsc,
    TitleAsc,
}

/// Narrowing applied to both the listing and its count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkFilters {
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub product_type: Option<String>,
}

impl WorkFilters {
    pub fn is_empty(&self) -> bool {
        self.start_year.is_none() && self.end_year.is_none() && self.product_type.is_none()
    }
}

/// Inclusive year span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

/// Filter values present among an affiliation's works
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableFilters {
    pub product_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<YearRange>,
}

fn default_page() -> u64 { 1 }

/// Research product listing parameters
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ResearchProductsQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u64,

    #[serde(default)]
    #[validate(range(min = 1))]
    pub max: Option<u64>,

    #[serde(default)]
    pub sort: WorkSort,

    #[serde(default)]
    #[validate(range(min = 1000, max = 3000))]
    pub start_year: Option<i32>,

    #[serde(default)]
    #[validate(range(min = 1000, max = 3000))]
    pub end_year: Option<i32>,

    #[serde(default)]
    pub product_type: Option<String>,
}

impl ResearchProductsQuery {
    pub fn filters(&self) -> WorkFilters {
        WorkFilters {
            start_year: self.start_year,
            end_year: self.end_year,
            product_type: self.product_type.clone().filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Links to neighbouring pages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl Cursor {
    /// Build links for `page` of size `max` over `total` items at `base`
    pub fn build(base: &str, page: u64, max: u64, total: u64) -> Self {
        let link = |p: u64| format!("{}?page={}&max={}", base, p, max);
        let previous = (page > 1).then(|| link(page - 1));
        let next = (page.saturating_mul(max) < total).then(|| link(page + 1));
        Self { previous, next }
    }
}

/// Research products page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchProducts {
    pub data: Vec<Work>,
    pub total_results: u64,
    pub count: usize,
    pub filters: AvailableFilters,
    pub cursor: Cursor,
}

/// Attach external identifiers to every author with a known id
async fn with_external_ids(mut work: Work, persons: &dyn PersonStore) -> Result<Work> {
    for author in work.authors.iter_mut() {
        author.external_ids = match author.id.as_deref() {
            Some(id) => match persons.external_ids(id).await {
                Ok(ids) => ids,
                // Works can cite persons that were never ingested
                Err(AppError::NotFound { .. }) => Vec::new(),
                Err(e) => return Err(e),
            },
            None => Vec::new(),
        };
    }
    Ok(work)
}

/// List the research products of `id` seen as an affiliation of type `typ`
pub async fn research_products(
    works: &dyn WorkStore,
    persons: &dyn PersonStore,
    api: &ApiConfig,
    pagination: &PaginationConfig,
    id: &str,
    typ: &str,
    query: &ResearchProductsQuery,
) -> Result<ResearchProducts> {
    query.validate()?;
    let window = pagination.window(query.page, query.max)?;
    let filters = query.filters();

    let (listed, total_results, available) = tokio::try_join!(
        works.list_by_affiliation(id, typ, window.skip, window.limit, query.sort, &filters),
        works.count_by_affiliation(id, typ, Some(&filters)),
        works.available_filters(id, typ),
    )?;

    let data = try_join_all(listed.into_iter().map(|w| with_external_ids(w, persons))).await?;

    let base = api.api_url(&format!("/affiliation/{}/{}/research/products", typ, id));

    Ok(ResearchProducts {
        count: data.len(),
        data,
        total_results,
        filters: available,
        cursor: Cursor::build(&base, query.page, window.limit, total_results),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::testing::MemoryStore;

    fn work(id: &str, year: i32, kind: &str, citations: u64, author: Option<&str>) -> Work {
        Work {
            id: id.to_string(),
            title: format!("Work {}", id),
            year: Some(year),
            product_type: Some(kind.to_string()),
            citations_count: citations,
            authors: vec![WorkAuthor {
                id: author.map(str::to_string),
                full_name: "Someone".to_string(),
                external_ids: vec![],
            }],
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::default();
        store.works = vec![
            work("W1", 2019, "article", 5, Some("P1")),
            work("W2", 2021, "book", 50, None),
            work("W3", 2023, "article", 12, Some("P404")),
        ];
        store.persons.insert(
            "P1".to_string(),
            (
                "Ada Lovelace".to_string(),
                vec![ExternalId {
                    source: "orcid".to_string(),
                    id: "0000-0001".to_string(),
                }],
            ),
        );
        store
    }

    fn query() -> ResearchProductsQuery {
        ResearchProductsQuery {
            page: 1,
            max: Some(2),
            ..ResearchProductsQuery::default()
        }
    }

    #[tokio::test]
    async fn test_products_page_with_cursor() {
        let store = store();
        let api = ApiConfig::default();
        let result = research_products(
            &store,
            &store,
            &api,
            &PaginationConfig::default(),
            "F1",
            "faculty",
            &query(),
        )
        .await
        .unwrap();

        assert_eq!(result.total_results, 3);
        assert_eq!(result.count, 2);
        assert_eq!(result.data[0].id, "W2");
        assert_eq!(result.filters.product_types, vec!["article", "book"]);
        assert_eq!(result.filters.years, Some(YearRange { min: 2019, max: 2023 }));
        assert_eq!(result.cursor.previous, None);
        assert_eq!(
            result.cursor.next.as_deref(),
            Some("http://localhost:8010/api/v1/affiliation/faculty/F1/research/products?page=2&max=2")
        );
    }

    #[tokio::test]
    async fn test_authors_get_external_ids() {
        let store = store();
        let mut q = query();
        q.sort = WorkSort::YearAsc;
        q.max = Some(10);
        let result = research_products(
            &store,
            &store,
            &ApiConfig::default(),
            &PaginationConfig::default(),
            "F1",
            "faculty",
            &q,
        )
        .await
        .unwrap();

        assert_eq!(result.data[0].authors[0].external_ids.len(), 1);
        assert!(result.data[1].authors[0].external_ids.is_empty());
        // unknown person P404
        assert!(result.data[2].authors[0].external_ids.is_empty());
        assert_eq!(result.cursor, Cursor::default());
    }

    #[tokio::test]
    async fn test_filters_apply_to_count() {
        let store = store();
        let mut q = query();
        q.product_type = Some("article".to_string());
        q.start_year = Some(2020);
        let result = research_products(
            &store,
            &store,
            &ApiConfig::default(),
            &PaginationConfig::default(),
            "F1",
            "faculty",
            &q,
        )
        .await
        .unwrap();

        assert_eq!(result.total_results, 1);
        assert_eq!(result.data[0].id, "W3");
    }

    #[tokio::test]
    async fn test_huge_page_is_a_validation_error() {
        let store = store();
        let mut q = query();
        q.page = u64::MAX;
        let err = research_products(
            &store,
            &store,
            &ApiConfig::default(),
            &PaginationConfig::default(),
            "F1",
            "faculty",
            &q,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { field: Some(ref f), .. } if f == "page"));
    }

    #[test]
    fn test_cursor_middle_page() {
        let cursor = Cursor::build("/p", 2, 10, 25);
        assert_eq!(cursor.previous.as_deref(), Some("/p?page=1&max=10"));
        assert_eq!(cursor.next.as_deref(), Some("/p?page=3&max=10"));

        let last = Cursor::build("/p", 3, 10, 25);
        assert_eq!(last.next, None);
    }
}
