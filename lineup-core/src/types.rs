//! Domain types for the Lineup catalogs.
//!
//! Identifiers are newtypes; never bare `u64`/`String` in public APIs.
//! All types are serializable/deserializable via serde + serde_yaml.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed item identifier, stable for the life of the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A strongly-typed item type slug ("article", "page", ...).
///
/// The item type is the primary scope discriminator: primary ordering is
/// dense within one type, never across types.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemType(pub String);

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ItemType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemType {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed taxonomy term identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TermId(pub u64);

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for TermId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A strongly-typed taxonomy name ("category", "topic", ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaxonomyName(pub String);

impl fmt::Display for TaxonomyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TaxonomyName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaxonomyName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle status of an item.
///
/// Every status except `Trashed` is "eligible": it counts toward the dense
/// primary ordering of its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Published,
    Pending,
    Draft,
    Private,
    Scheduled,
    Trashed,
}

impl ItemStatus {
    /// Whether this status participates in ordering.
    pub fn is_eligible(self) -> bool {
        !matches!(self, ItemStatus::Trashed)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStatus::Published => "published",
            ItemStatus::Pending => "pending",
            ItemStatus::Draft => "draft",
            ItemStatus::Private => "private",
            ItemStatus::Scheduled => "scheduled",
            ItemStatus::Trashed => "trashed",
        };
        f.write_str(s)
    }
}

/// Deterministic tiebreak sort used when (re)deriving a sequential order.
///
/// Configured per item type in [`crate::config::ScopeConfig`]; `DateDesc`
/// is the default for content-like types, `TitleAsc` suits page-like ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackSort {
    #[default]
    DateDesc,
    DateAsc,
    TitleAsc,
    TitleDesc,
}

impl fmt::Display for FallbackSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FallbackSort::DateDesc => "date_desc",
            FallbackSort::DateAsc => "date_asc",
            FallbackSort::TitleAsc => "title_asc",
            FallbackSort::TitleDesc => "title_desc",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A single ordered entity within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub status: ItemStatus,
    /// Dense sequential position within the eligible items of this type.
    /// May transiently hold gaps or duplicates between a mutation and the
    /// next reconcile pass.
    #[serde(default)]
    pub primary_order: i64,
    pub created_at: DateTime<Utc>,
    /// Terms this item is assigned to, across all taxonomies.
    #[serde(default)]
    pub terms: Vec<TermId>,
}

impl Item {
    /// Whether this item counts toward the dense primary ordering.
    pub fn is_eligible(&self) -> bool {
        self.status.is_eligible()
    }
}

/// All items of one type — one YAML document per catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub item_type: ItemType,
    #[serde(default)]
    pub items: Vec<Item>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Catalog {
    /// Largest item id currently in the catalog, 0 when empty.
    pub fn max_id(&self) -> u64 {
        self.items.iter().map(|item| item.id.0).max().unwrap_or(0)
    }

    /// Iterator over items whose status counts toward ordering.
    pub fn eligible(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.is_eligible())
    }
}

/// A taxonomy term (secondary dimension instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    /// Position when the term collection itself is orderable.
    #[serde(default)]
    pub order_value: i64,
}

/// All terms of one taxonomy — one YAML document per taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub name: TaxonomyName,
    #[serde(default)]
    pub terms: Vec<Term>,
    pub updated_at: DateTime<Utc>,
}

impl Taxonomy {
    pub fn term(&self, id: TermId) -> Option<&Term> {
        self.terms.iter().find(|t| t.id == id)
    }

    pub fn max_id(&self) -> u64 {
        self.terms.iter().map(|t| t.id.0).max().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
