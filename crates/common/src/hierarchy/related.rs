//! Downward hierarchy assembly
//!
//! Collects the descendant tiers of an affiliation. Which tiers appear
//! depends only on the requested scope:
//!
//! | tier        | included for                       |
//! |-------------|------------------------------------|
//! | faculties   | institution                        |
//! | departments | faculty, institution               |
//! | groups      | department, faculty, institution   |
//! | authors     | group, department, faculty         |

use super::model::{PersonRef, RelatedEntityRef};
use super::store::EntityStore;
use super::tier::Tier;
use crate::errors::Result;
use futures::future::OptionFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Descendants of an affiliation, one optional list per tier.
///
/// An ineligible tier is `None` and omitted when serialized; an eligible
/// tier with no members is an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculties: Option<Vec<RelatedEntityRef>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departments: Option<Vec<RelatedEntityRef>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<RelatedEntityRef>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<PersonRef>>,
}

impl RelatedEntities {
    /// Names of the populated tiers, top-down
    pub fn tier_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.faculties.is_some() {
            keys.push("faculties");
        }
        if self.departments.is_some() {
            keys.push("departments");
        }
        if self.groups.is_some() {
            keys.push("groups");
        }
        if self.authors.is_some() {
            keys.push("authors");
        }
        keys
    }
}

/// Whether child affiliations of tier `child` are listed under `scope`
fn lists_children(scope: Tier, child: Tier) -> bool {
    match child {
        Tier::Faculty => scope == Tier::Institution,
        Tier::Department => matches!(scope, Tier::Faculty | Tier::Institution),
        Tier::Group => matches!(
            scope,
            Tier::Department | Tier::Faculty | Tier::Institution
        ),
        Tier::Institution | Tier::Author => false,
    }
}

/// Whether authors are listed under `scope`
fn lists_authors(scope: Tier) -> bool {
    matches!(scope, Tier::Group | Tier::Department | Tier::Faculty)
}

/// Assemble the related tiers for `id` seen as an affiliation of type `typ`.
///
/// Unknown or missing types produce an empty bundle, not an error.
pub async fn assemble_related(
    store: &dyn EntityStore,
    id: &str,
    typ: Option<&str>,
) -> Result<RelatedEntities> {
    let Some(scope) = typ.and_then(Tier::from_tag) else {
        debug!(affiliation_id = %id, typ = ?typ, "No related tiers for type");
        return Ok(RelatedEntities::default());
    };

    let children = |child: Tier| -> OptionFuture<_> {
        lists_children(scope, child)
            .then(|| store.children_by_type(id, child, scope))
            .into()
    };
    let authors: OptionFuture<_> = lists_authors(scope)
        .then(|| store.authors_by_affiliation(id, scope))
        .into();

    let (faculties, departments, groups, authors) = tokio::join!(
        children(Tier::Faculty),
        children(Tier::Department),
        children(Tier::Group),
        authors,
    );

    Ok(RelatedEntities {
        faculties: faculties.transpose()?,
        departments: departments.transpose()?,
        groups: groups.transpose()?,
        authors: authors.transpose()?,
    })
}
