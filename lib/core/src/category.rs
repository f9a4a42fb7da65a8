//! Static category tables and the encoder built on them.
//!
//! The tables are data, not learned: a category either appears in the active
//! scheme or it is rejected. Changing a table means bumping its version so
//! persisted indexes fitted under the old codes are refitted.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::{Error, FeatureVector, Result};

pub type CategoryCode = u32;

/// One code per category, dense in `[0, 21)`
const FLAT_V1: &[(&str, CategoryCode)] = &[
    ("Poetry", 0),
    ("Historical Fiction", 1),
    ("Fiction", 2),
    ("Mystery", 3),
    ("History", 4),
    ("Young Adult", 5),
    ("Business", 6),
    ("Default", 7),
    ("Science Fiction", 8),
    ("Politics", 9),
    ("Travel", 10),
    ("Thriller", 11),
    ("Music", 12),
    ("Food and Drink", 13),
    ("Romance", 14),
    ("Childrens", 15),
    ("Nonfiction", 16),
    ("Art", 17),
    ("Spirituality", 18),
    ("Philosophy", 19),
    ("Sequential Art", 20),
];

/// Related categories share a bucket, dense in `[0, 10)`
const GROUPED_V1: &[(&str, CategoryCode)] = &[
    ("Thriller", 0),
    ("Mystery", 0),
    ("Travel", 1),
    ("Food and Drink", 1),
    ("Fiction", 2),
    ("Historical Fiction", 2),
    ("Science Fiction", 2),
    ("Poetry", 3),
    ("Childrens", 4),
    ("Young Adult", 4),
    ("Romance", 5),
    ("Nonfiction", 6),
    ("History", 6),
    ("Philosophy", 6),
    ("Spirituality", 6),
    ("Art", 7),
    ("Music", 7),
    ("Sequential Art", 7),
    ("Business", 8),
    ("Politics", 8),
    ("Default", 9),
];

/// Which static table the encoder uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryScheme {
    /// Canonical: every category gets its own code
    #[default]
    Flat,
    /// Semantically related categories share a code
    Grouped,
}

impl CategoryScheme {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CategoryScheme::Flat => "flat",
            CategoryScheme::Grouped => "grouped",
        }
    }

    #[must_use]
    pub fn version(self) -> u32 {
        match self {
            CategoryScheme::Flat => 1,
            CategoryScheme::Grouped => 1,
        }
    }

    fn table(self) -> &'static [(&'static str, CategoryCode)] {
        match self {
            CategoryScheme::Flat => FLAT_V1,
            CategoryScheme::Grouped => GROUPED_V1,
        }
    }
}

impl std::fmt::Display for CategoryScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-v{}", self.name(), self.version())
    }
}

impl FromStr for CategoryScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(CategoryScheme::Flat),
            "grouped" => Ok(CategoryScheme::Grouped),
            other => Err(Error::InvalidConfig(format!("unknown category scheme '{}'", other))),
        }
    }
}

/// Maps category names to codes using one of the static tables
#[derive(Debug, Clone)]
pub struct CategoryEncoder {
    scheme: CategoryScheme,
    codes: AHashMap<&'static str, CategoryCode>,
    distinct: usize,
}

impl CategoryEncoder {
    pub fn new(scheme: CategoryScheme) -> Self {
        let table = scheme.table();
        let codes: AHashMap<&'static str, CategoryCode> = table.iter().copied().collect();
        let mut distinct: Vec<CategoryCode> = table.iter().map(|(_, code)| *code).collect();
        distinct.sort_unstable();
        distinct.dedup();

        Self {
            scheme,
            codes,
            distinct: distinct.len(),
        }
    }

    #[inline]
    pub fn scheme(&self) -> CategoryScheme {
        self.scheme
    }

    /// Exact, case-sensitive lookup
    #[inline]
    pub fn encode(&self, category: &str) -> Result<CategoryCode> {
        self.codes
            .get(category)
            .copied()
            .ok_or_else(|| Error::CategoryUnknown(category.to_string()))
    }

    #[inline]
    pub fn feature(&self, category: &str) -> Result<FeatureVector> {
        self.encode(category).map(FeatureVector::from)
    }

    #[inline]
    pub fn contains(&self, category: &str) -> bool {
        self.codes.contains_key(category)
    }

    /// Number of distinct codes
    #[inline]
    pub fn len(&self) -> usize {
        self.distinct
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distinct == 0
    }

    /// Table entries in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, CategoryCode)> {
        self.scheme.table().iter().copied()
    }
}

impl Default for CategoryEncoder {
    fn default() -> Self {
        Self::new(CategoryScheme::Flat)
    }
}
