//! In-memory collaborators for unit tests

use super::model::{
    Affiliation, CitationSnapshot, ExternalId, PersonRef, RelatedEntityRef, Relation, TypeRecord,
};
use super::products::{AvailableFilters, Work, WorkFilters, WorkSort, YearRange};
use super::search::AffiliationSort;
use super::store::{CitationCounter, EntityStore, PersonStore, StoreSearch, WorkCounter, WorkStore};
use super::tier::Tier;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn affiliation(id: &str, primary: &str, relations: Vec<Relation>) -> Affiliation {
    Affiliation {
        id: id.to_string(),
        name: format!("Affiliation {}", id),
        types: vec![TypeRecord::new(primary)],
        relations,
        logo: None,
    }
}

pub fn relation(id: &str, tag: &str, logo: Option<&str>) -> Relation {
    Relation {
        id: id.to_string(),
        name: Some(format!("Affiliation {}", id)),
        type_tag: tag.to_string(),
        logo: logo.map(str::to_string),
    }
}

/// In-memory equivalent of the SQL work filter
pub fn filter_matches(filters: &WorkFilters, work: &Work) -> bool {
    let year_ok = match (work.year, filters.start_year, filters.end_year) {
        (None, None, None) => true,
        (None, _, _) => false,
        (Some(y), start, end) => start.map_or(true, |s| y >= s) && end.map_or(true, |e| y <= e),
    };
    let type_ok = match &filters.product_type {
        Some(t) => work.product_type.as_deref() == Some(t.as_str()),
        None => true,
    };
    year_ok && type_ok
}

/// Filter values present among `works`
pub fn filters_of(works: &[Work]) -> AvailableFilters {
    let mut product_types: Vec<String> = works
        .iter()
        .filter_map(|w| w.product_type.clone())
        .collect();
    product_types.sort();
    product_types.dedup();

    let years = works
        .iter()
        .filter_map(|w| w.year)
        .fold(None::<YearRange>, |acc, y| {
            Some(match acc {
                None => YearRange { min: y, max: y },
                Some(r) => YearRange {
                    min: r.min.min(y),
                    max: r.max.max(y),
                },
            })
        });

    AvailableFilters {
        product_types,
        years,
    }
}

/// Fake store backing every collaborator trait.
#[derive(Default)]
pub struct MemoryStore {
    pub affiliations: Vec<Affiliation>,
    /// (id, canonical tag) -> product count
    pub products: HashMap<(String, String), u64>,
    pub citations: HashMap<String, u64>,
    pub works: Vec<Work>,
    pub persons: HashMap<String, (String, Vec<ExternalId>)>,
    /// person id -> [(affiliation id, tier)]
    pub memberships: HashMap<String, Vec<(String, Tier)>>,
    /// Ids whose product count fails
    pub failing_counts: Vec<String>,
    pub count_calls: AtomicUsize,
    pub child_queries: Mutex<Vec<(String, Tier, Tier)>>,
    /// (skip, limit) of every search request
    pub searches: Mutex<Vec<(u64, u64)>>,
}

impl MemoryStore {
    pub fn with(affiliations: Vec<Affiliation>) -> Self {
        Self {
            affiliations,
            ..Self::default()
        }
    }

    pub fn set_products(&mut self, id: &str, tag: &str, count: u64) {
        self.products.insert((id.to_string(), tag.to_string()), count);
    }

    fn is_child_of(aff: &Affiliation, parent_id: &str, child: Tier) -> bool {
        aff.primary_type().and_then(Tier::from_tag) == Some(child)
            && aff.relations.iter().any(|r| r.id == parent_id)
    }

    fn sort_key(&self, aff: &Affiliation) -> u64 {
        self.citations.get(&aff.id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<Affiliation>> {
        Ok(self.affiliations.iter().find(|a| a.id == id).cloned())
    }

    async fn search(&self, request: &StoreSearch<'_>) -> Result<(Vec<Affiliation>, u64)> {
        self.searches
            .lock()
            .unwrap()
            .push((request.skip, request.limit));

        let mut matches: Vec<Affiliation> = self
            .affiliations
            .iter()
            .filter(|a| match request.keywords {
                Some(kw) => a.name.to_lowercase().contains(&kw.to_lowercase()),
                None => true,
            })
            .filter(|a| match request.scope {
                Some(scope) => a.primary_type().and_then(Tier::from_tag) == Some(scope),
                None => true,
            })
            .cloned()
            .collect();

        match request.sort {
            AffiliationSort::NameAsc => matches.sort_by(|a, b| a.name.cmp(&b.name)),
            AffiliationSort::NameDesc => matches.sort_by(|a, b| b.name.cmp(&a.name)),
            AffiliationSort::CitationsDesc => {
                matches.sort_by_key(|a| std::cmp::Reverse(self.sort_key(a)))
            }
            AffiliationSort::CitationsAsc => matches.sort_by_key(|a| self.sort_key(a)),
        }

        let total = matches.len() as u64;
        let page = matches
            .into_iter()
            .skip(request.skip as usize)
            .take(request.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn children_by_type(
        &self,
        id: &str,
        child: Tier,
        parent: Tier,
    ) -> Result<Vec<RelatedEntityRef>> {
        self.child_queries
            .lock()
            .unwrap()
            .push((id.to_string(), child, parent));

        Ok(self
            .affiliations
            .iter()
            .filter(|a| Self::is_child_of(a, id, child))
            .map(|a| RelatedEntityRef {
                id: a.id.clone(),
                name: a.name.clone(),
                logo: a.logo.clone(),
            })
            .collect())
    }

    async fn authors_by_affiliation(&self, id: &str, tier: Tier) -> Result<Vec<PersonRef>> {
        let mut authors: Vec<PersonRef> = self
            .memberships
            .iter()
            .filter(|(_, units)| units.iter().any(|(uid, t)| uid == id && *t == tier))
            .filter_map(|(pid, _)| {
                self.persons.get(pid).map(|(name, _)| PersonRef {
                    id: pid.clone(),
                    full_name: name.clone(),
                })
            })
            .collect();
        authors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(authors)
    }
}

#[async_trait]
impl WorkCounter for MemoryStore {
    async fn count_by_affiliation(
        &self,
        id: &str,
        type_tag: &str,
        filters: Option<&WorkFilters>,
    ) -> Result<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_counts.iter().any(|f| f == id) {
            return Err(AppError::CollaboratorUnavailable {
                collaborator: "work_counter".to_string(),
                message: format!("count for {} timed out", id),
            });
        }

        let tag = Tier::from_tag(type_tag)
            .map(|t| t.as_tag().to_string())
            .unwrap_or_else(|| type_tag.to_string());
        match filters {
            Some(filters) => Ok(self
                .works
                .iter()
                .filter(|w| filter_matches(filters, w))
                .count() as u64),
            None => Ok(self
                .products
                .get(&(id.to_string(), tag))
                .copied()
                .unwrap_or(0)),
        }
    }
}

#[async_trait]
impl WorkStore for MemoryStore {
    async fn list_by_affiliation(
        &self,
        _id: &str,
        _type_tag: &str,
        skip: u64,
        limit: u64,
        sort: WorkSort,
        filters: &WorkFilters,
    ) -> Result<Vec<Work>> {
        let mut works: Vec<Work> = self
            .works
            .iter()
            .filter(|w| filter_matches(filters, w))
            .cloned()
            .collect();
        match sort {
            WorkSort::CitationsDesc => {
                works.sort_by_key(|w| std::cmp::Reverse(w.citations_count))
            }
            WorkSort::CitationsAsc => works.sort_by_key(|w| w.citations_count),
            WorkSort::YearDesc => works.sort_by_key(|w| std::cmp::Reverse(w.year)),
            WorkSort::YearAsc => works.sort_by_key(|w| w.year),
            WorkSort::TitleAsc => works.sort_by(|a, b| a.title.cmp(&b.title)),
        }
        Ok(works
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn available_filters(&self, _id: &str, _type_tag: &str) -> Result<AvailableFilters> {
        Ok(filters_of(&self.works))
    }
}

#[async_trait]
impl CitationCounter for MemoryStore {
    async fn citations_by_id(&self, id: &str) -> Result<Option<CitationSnapshot>> {
        Ok(self
            .citations
            .get(id)
            .map(|&citations_count| CitationSnapshot { citations_count }))
    }
}

#[async_trait]
impl PersonStore for MemoryStore {
    async fn external_ids(&self, person_id: &str) -> Result<Vec<ExternalId>> {
        self.persons
            .get(person_id)
            .map(|(_, ids)| ids.clone())
            .ok_or_else(|| AppError::NotFound {
                resource_type: "person".to_string(),
                id: person_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(year: Option<i32>, kind: &str) -> Work {
        Work {
            id: "W".to_string(),
            title: "W".to_string(),
            year,
            product_type: Some(kind.to_string()),
            citations_count: 0,
            authors: vec![],
        }
    }

    #[test]
    fn test_filter_without_year_excludes_undated() {
        let undated = dated(None, "article");
        assert!(filter_matches(&WorkFilters::default(), &undated));
        let ranged = WorkFilters {
            start_year: Some(1990),
            ..WorkFilters::default()
        };
        assert!(!filter_matches(&ranged, &undated));
    }

    #[test]
    fn test_filters_of_spans_years() {
        let works = vec![
            dated(Some(2021), "book"),
            dated(None, "article"),
            dated(Some(2018), "article"),
        ];
        let filters = filters_of(&works);
        assert_eq!(filters.product_types, vec!["article", "book"]);
        assert_eq!(filters.years, Some(YearRange { min: 2018, max: 2021 }));
        assert_eq!(filters_of(&[]), AvailableFilters::default());
    }
}
