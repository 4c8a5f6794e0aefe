//! Scope configuration — which collections have ordering enabled.
//!
//! # Storage layout
//!
//! ```text
//! ~/.lineup/
//!   config.yaml   (mode 0600, atomic writes)
//! ```
//!
//! # API pattern
//!
//! Every function that touches disk has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::paths::{ensure_dir, home, lineup_root, write_atomic};
use crate::types::{FallbackSort, ItemType, TaxonomyName};

/// Which item types, taxonomies, and term collections have ordering enabled.
///
/// Loaded once per invocation; effectively read-only configuration with
/// admin-triggered mutation through `save_config_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScopeConfig {
    /// Item types with dense primary ordering.
    #[serde(default)]
    pub item_types: Vec<ItemType>,
    /// Taxonomies with per-term stored permutations of items.
    #[serde(default)]
    pub taxonomies: Vec<TaxonomyName>,
    /// Taxonomies whose term collections are themselves orderable.
    #[serde(default)]
    pub term_order: Vec<TaxonomyName>,
    /// Per-type tiebreak policy used by reconciliation and reset.
    /// Types absent from the map use [`FallbackSort::default`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fallback_sorts: BTreeMap<ItemType, FallbackSort>,
}

impl ScopeConfig {
    pub fn type_enabled(&self, item_type: &ItemType) -> bool {
        self.item_types.contains(item_type)
    }

    pub fn taxonomy_enabled(&self, taxonomy: &TaxonomyName) -> bool {
        self.taxonomies.contains(taxonomy)
    }

    pub fn term_order_enabled(&self, taxonomy: &TaxonomyName) -> bool {
        self.term_order.contains(taxonomy)
    }

    /// The deterministic tiebreak sort for an item type.
    pub fn fallback_sort_for(&self, item_type: &ItemType) -> FallbackSort {
        self.fallback_sorts
            .get(item_type)
            .copied()
            .unwrap_or_default()
    }
}

/// `<home>/.lineup/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    lineup_root(home).join("config.yaml")
}

/// Load the scope configuration.
///
/// A missing file is not an error: ordering simply isn't enabled anywhere
/// yet, so the default (empty) config is returned.
pub fn load_config_at(home: &Path) -> Result<ScopeConfig, StoreError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(ScopeConfig::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })
}

/// `load_config_at` convenience wrapper.
pub fn load_config() -> Result<ScopeConfig, StoreError> {
    load_config_at(&home()?)
}

/// Atomically save the scope configuration to `<home>/.lineup/config.yaml`.
pub fn save_config_at(home: &Path, config: &ScopeConfig) -> Result<(), StoreError> {
    ensure_dir(&lineup_root(home))?;
    let yaml = serde_yaml::to_string(config)?;
    write_atomic(&config_path_at(home), &yaml)
}

/// `save_config_at` convenience wrapper.
pub fn save_config(config: &ScopeConfig) -> Result<(), StoreError> {
    save_config_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
