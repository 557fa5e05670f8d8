//! Affiliation records as read from the entity store, and the
//! enriched shapes composed from them at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A type tag with optional validity timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(rename = "type")]
    pub type_tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl TypeRecord {
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            source: None,
            type_tag: type_tag.into(),
            date: None,
        }
    }
}

/// Reference from an affiliation to another entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub type_tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Stored affiliation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affiliation {
    pub id: String,

    pub name: String,

    /// Ordered; the first entry is the primary type
    pub types: Vec<TypeRecord>,

    #[serde(default)]
    pub relations: Vec<Relation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Affiliation {
    /// Tag of `types[0]`
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(|t| t.type_tag.as_str())
    }
}

/// Affiliation augmented with resolved parents, logo, and live counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedAffiliation {
    pub id: String,
    pub name: String,
    pub types: Vec<TypeRecord>,

    /// Declared relations, untouched
    pub relations: Vec<Relation>,

    /// Resolved upside relations
    pub affiliations: Vec<Relation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    pub products_count: u64,
    pub citations_count: u64,
}

impl From<EnrichedAffiliation> for Affiliation {
    fn from(enriched: EnrichedAffiliation) -> Self {
        Self {
            id: enriched.id,
            name: enriched.name,
            types: enriched.types,
            relations: enriched.relations,
            logo: enriched.logo,
        }
    }
}

/// Child affiliation in a related-entity listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntityRef {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Person affiliated with a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: String,
    pub full_name: String,
}

/// Precomputed citation totals for an affiliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationSnapshot {
    pub citations_count: u64,
}

/// Identifier of a person in an external registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalId {
    pub source: String,
    pub id: String,
}
