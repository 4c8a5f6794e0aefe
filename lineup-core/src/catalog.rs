//! Per-type YAML item catalogs — the item store behind ordering.
//!
//! # Storage layout
//!
//! ```text
//! ~/.lineup/
//!   catalogs/
//!     <item_type>.yaml   (one file per item type — mode 0600)
//! ```
//!
//! The catalog is deliberately a dumb store: it persists items and their
//! `primary_order` field and knows nothing about density or staleness.
//! Mutating callers are responsible for notifying the staleness tracker
//! through the engine's event functions.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::StoreError;
use crate::paths::{catalogs_dir, ensure_dir, home, write_atomic};
use crate::types::{Catalog, Item, ItemId, ItemType};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.lineup/catalogs/<item_type>.yaml` — pure, no I/O.
pub fn catalog_path_at(home: &Path, item_type: &ItemType) -> PathBuf {
    catalogs_dir(home).join(format!("{}.yaml", item_type.0))
}

/// List the item types of all catalogs under `<home>/.lineup/catalogs/`,
/// sorted by name.
pub fn list_item_types_at(home: &Path) -> Result<Vec<ItemType>, StoreError> {
    let dir = catalogs_dir(home);
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut types: Vec<ItemType> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.strip_suffix(".yaml").map(ItemType::from)
        })
        .collect();
    types.sort();
    Ok(types)
}

/// `list_item_types_at` convenience wrapper.
pub fn list_item_types() -> Result<Vec<ItemType>, StoreError> {
    list_item_types_at(&home()?)
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the catalog for `item_type`.
///
/// Returns `StoreError::NotFound` if absent, `StoreError::Parse` (with path
/// + line context) if malformed YAML.
pub fn load_catalog_at(home: &Path, item_type: &ItemType) -> Result<Catalog, StoreError> {
    let path = catalog_path_at(home, item_type);
    if !path.exists() {
        return Err(StoreError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })
}

/// `load_catalog_at` convenience wrapper.
pub fn load_catalog(item_type: &ItemType) -> Result<Catalog, StoreError> {
    load_catalog_at(&home()?, item_type)
}

/// Load the catalog for `item_type`, or an empty one if none exists yet.
pub fn load_or_init_catalog_at(home: &Path, item_type: &ItemType) -> Result<Catalog, StoreError> {
    match load_catalog_at(home, item_type) {
        Ok(catalog) => Ok(catalog),
        Err(StoreError::NotFound { .. }) => {
            let now = Utc::now();
            Ok(Catalog {
                item_type: item_type.clone(),
                items: vec![],
                created_at: now,
                updated_at: now,
            })
        }
        Err(err) => Err(err),
    }
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a catalog, bumping its `updated_at`.
pub fn save_catalog_at(home: &Path, catalog: &mut Catalog) -> Result<(), StoreError> {
    ensure_dir(&catalogs_dir(home))?;
    catalog.updated_at = Utc::now();
    let yaml = serde_yaml::to_string(catalog)?;
    write_atomic(&catalog_path_at(home, &catalog.item_type), &yaml)
}

/// `save_catalog_at` convenience wrapper.
pub fn save_catalog(catalog: &mut Catalog) -> Result<(), StoreError> {
    save_catalog_at(&home()?, catalog)
}

// ---------------------------------------------------------------------------
// 4. Item mutation helpers
// ---------------------------------------------------------------------------

/// Append a new item to the catalog and persist it.
///
/// The item gets the next free id and a provisional `primary_order` of
/// `max + 1` among eligible items; the reconciler later assigns it a clean
/// sequential slot.
pub fn add_item_at(
    home: &Path,
    item_type: &ItemType,
    mut item: Item,
) -> Result<Item, StoreError> {
    let mut catalog = load_or_init_catalog_at(home, item_type)?;
    item.id = ItemId(catalog.max_id() + 1);
    item.primary_order = catalog
        .eligible()
        .map(|i| i.primary_order)
        .max()
        .map(|max| max + 1)
        .unwrap_or(0);
    catalog.items.push(item.clone());
    save_catalog_at(home, &mut catalog)?;
    Ok(item)
}

/// Apply `mutate` to the item with `id` and persist the catalog.
///
/// Returns `Ok(false)` without writing when the item does not exist.
pub fn update_item_at<F>(
    home: &Path,
    item_type: &ItemType,
    id: ItemId,
    mutate: F,
) -> Result<bool, StoreError>
where
    F: FnOnce(&mut Item),
{
    let mut catalog = load_catalog_at(home, item_type)?;
    let Some(item) = catalog.items.iter_mut().find(|i| i.id == id) else {
        return Ok(false);
    };
    mutate(item);
    save_catalog_at(home, &mut catalog)?;
    Ok(true)
}

/// Remove the item with `id` entirely and persist the catalog.
///
/// Returns `Ok(false)` without writing when the item does not exist.
pub fn remove_item_at(home: &Path, item_type: &ItemType, id: ItemId) -> Result<bool, StoreError> {
    let mut catalog = load_catalog_at(home, item_type)?;
    let before = catalog.items.len();
    catalog.items.retain(|i| i.id != id);
    if catalog.items.len() == before {
        return Ok(false);
    }
    save_catalog_at(home, &mut catalog)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
