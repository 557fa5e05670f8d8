//! Affiliation tiers and the type-tag vocabulary
//!
//! Stored records carry free-form type tags ("institution", "Education",
//! "faculty", ...). Every comparison in the hierarchy goes through
//! [`Tier::from_tag`], which is the only place synonyms and letter case
//! are folded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Institution-kind tags that all denote the top tier.
const INSTITUTION_KINDS: &[&str] = &[
    "institution",
    "archive",
    "company",
    "education",
    "facility",
    "government",
    "healthcare",
    "nonprofit",
    "other",
];

/// One level of the institution > faculty > department > group > author hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Institution,
    Faculty,
    Department,
    Group,
    Author,
}

impl Tier {
    /// All tiers, top-down
    pub const ALL: [Tier; 5] = [
        Tier::Institution,
        Tier::Faculty,
        Tier::Department,
        Tier::Group,
        Tier::Author,
    ];

    /// Canonicalize a stored type tag. Unknown tags return `None`.
    pub fn from_tag(tag: &str) -> Option<Tier> {
        let tag = tag.trim().to_ascii_lowercase();
        if INSTITUTION_KINDS.contains(&tag.as_str()) {
            return Some(Tier::Institution);
        }
        match tag.as_str() {
            "faculty" => Some(Tier::Faculty),
            "department" => Some(Tier::Department),
            "group" => Some(Tier::Group),
            "author" | "person" => Some(Tier::Author),
            _ => None,
        }
    }

    /// Canonical lowercase tag
    pub fn as_tag(&self) -> &'static str {
        match self {
            Tier::Institution => "institution",
            Tier::Faculty => "faculty",
            Tier::Department => "department",
            Tier::Group => "group",
            Tier::Author => "author",
        }
    }

    /// Every lowercase tag that canonicalizes to this tier
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Tier::Institution => INSTITUTION_KINDS,
            Tier::Faculty => &["faculty"],
            Tier::Department => &["department"],
            Tier::Group => &["group"],
            Tier::Author => &["author", "person"],
        }
    }

    /// Distance from the top of the hierarchy (institution = 0)
    pub fn depth(&self) -> usize {
        match self {
            Tier::Institution => 0,
            Tier::Faculty => 1,
            Tier::Department => 2,
            Tier::Group => 3,
            Tier::Author => 4,
        }
    }

    /// Tiers strictly above this one, closest first
    pub fn ancestors(&self) -> Vec<Tier> {
        Tier::ALL[..self.depth()].iter().rev().copied().collect()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::from_tag(s).ok_or_else(|| format!("unknown affiliation type: {}", s))
    }
}
