//! Upside relation resolution
//!
//! Given the relations declared on an affiliation and its primary type,
//! picks the relations that point at ancestors and the logo to display.

use super::model::Relation;
use super::tier::Tier;
use serde::{Deserialize, Serialize};

/// Ancestors of an affiliation and the logo inherited from them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Upside {
    /// Ancestor relations in declared order
    pub parents: Vec<Relation>,

    /// `None` means the caller keeps its own logo
    pub logo: Option<String>,
}

/// Select the relations that are valid parents for `primary_type`.
///
/// Only faculties, departments and groups have an upside. Relations with
/// unrecognized type tags are dropped silently. The logo comes from the
/// closest ancestor tier that has a non-empty one; within a tier the
/// first declared relation wins.
pub fn resolve_upside(relations: &[Relation], primary_type: &str) -> Upside {
    let tier = match Tier::from_tag(primary_type) {
        Some(tier @ (Tier::Faculty | Tier::Department | Tier::Group)) => tier,
        _ => return Upside::default(),
    };

    let ancestors = tier.ancestors();
    let candidates: Vec<(Tier, &Relation)> = relations
        .iter()
        .filter_map(|rel| {
            let rel_tier = Tier::from_tag(&rel.type_tag)?;
            ancestors.contains(&rel_tier).then_some((rel_tier, rel))
        })
        .collect();

    let logo = candidates
        .iter()
        .filter_map(|(rel_tier, rel)| {
            let logo = rel.logo.as_deref().map(str::trim).filter(|l| !l.is_empty())?;
            Some((tier.depth() - rel_tier.depth(), logo))
        })
        // min_by_key keeps the first of equal keys, i.e. declared order
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, logo)| logo.to_string());

    Upside {
        parents: candidates.into_iter().map(|(_, rel)| rel.clone()).collect(),
        logo,
    }
}
