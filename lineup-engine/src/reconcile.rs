//! Reconciliation — keeping the primary order dense.
//!
//! An item type's primary order is "dense" when its eligible items hold
//! exactly the positions `0..count`. Mutations (trash, delete, out-of-band
//! edits) can open gaps or duplicates; reconciliation repairs that by
//! resorting and reassigning sequential positions.
//!
//! The cheap path is a counting check, not a scan: when
//! `count == max + 1` the order is taken as dense and nothing is written.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use lineup_core::catalog::{load_catalog_at, save_catalog_at};
use lineup_core::types::{FallbackSort, Item, ItemId, ItemType};
use lineup_core::{ScopeConfig, StoreError};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::staleness;

/// What a reconcile pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No catalog, or no eligible items. Nothing to order.
    Empty,
    /// The counting check passed; no write happened.
    AlreadyDense,
    /// Positions were reassigned and the catalog saved.
    Resequenced { count: usize },
}

/// What an initialization pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// No catalog, or no eligible items.
    Empty,
    /// Some item already carries a nonzero position (or a single item sits
    /// at 0, which is already dense). Existing order is left alone.
    AlreadyOrdered,
    /// All positions were zero; a fresh sequence was derived and saved.
    Initialized { count: usize },
}

/// Deterministic tiebreak comparison between two items.
///
/// Item id is the final key so equal titles and timestamps still produce a
/// stable order.
pub fn fallback_cmp(sort: FallbackSort, a: &Item, b: &Item) -> Ordering {
    let primary = match sort {
        FallbackSort::DateDesc => b.created_at.cmp(&a.created_at),
        FallbackSort::DateAsc => a.created_at.cmp(&b.created_at),
        FallbackSort::TitleAsc => a.title.cmp(&b.title),
        FallbackSort::TitleDesc => b.title.cmp(&a.title),
    };
    primary.then(a.id.cmp(&b.id))
}

/// Repair the primary order of `item_type` if it has gaps or duplicates.
///
/// Sort is by current position first, then the type's configured fallback
/// sort, so relative user ordering survives resequencing. Trashed items
/// keep whatever position they last held; they are simply skipped.
pub fn reconcile_at(
    home: &Path,
    config: &ScopeConfig,
    item_type: &ItemType,
) -> Result<ReconcileOutcome, EngineError> {
    let mut catalog = match load_catalog_at(home, item_type) {
        Ok(catalog) => catalog,
        Err(StoreError::NotFound { .. }) => return Ok(ReconcileOutcome::Empty),
        Err(err) => return Err(err.into()),
    };

    let count = catalog.eligible().count();
    if count == 0 {
        return Ok(ReconcileOutcome::Empty);
    }
    let max = catalog.eligible().map(|i| i.primary_order).max().unwrap_or(0);
    if count as i64 == max + 1 {
        debug!("'{item_type}' order is dense ({count} items), skipping");
        return Ok(ReconcileOutcome::AlreadyDense);
    }

    let sort = config.fallback_sort_for(item_type);
    let mut ordered: Vec<&Item> = catalog.eligible().collect();
    ordered.sort_by(|a, b| {
        a.primary_order
            .cmp(&b.primary_order)
            .then_with(|| fallback_cmp(sort, a, b))
    });
    let positions: HashMap<ItemId, i64> = ordered
        .iter()
        .enumerate()
        .map(|(pos, item)| (item.id, pos as i64))
        .collect();

    for item in catalog.items.iter_mut() {
        if let Some(&pos) = positions.get(&item.id) {
            item.primary_order = pos;
        }
    }
    save_catalog_at(home, &mut catalog)?;
    info!("resequenced {count} '{item_type}' items");
    Ok(ReconcileOutcome::Resequenced { count })
}

/// Derive a first sequence for a type that has never been ordered.
///
/// Runs when ordering is first enabled for a type. Only acts when every
/// eligible item sits at position 0 and the catalog is not already dense;
/// otherwise the existing order (hand-made or migrated) is preserved.
pub fn initialize_at(
    home: &Path,
    config: &ScopeConfig,
    item_type: &ItemType,
) -> Result<InitOutcome, EngineError> {
    let mut catalog = match load_catalog_at(home, item_type) {
        Ok(catalog) => catalog,
        Err(StoreError::NotFound { .. }) => return Ok(InitOutcome::Empty),
        Err(err) => return Err(err.into()),
    };

    let count = catalog.eligible().count();
    if count == 0 {
        return Ok(InitOutcome::Empty);
    }
    let max = catalog.eligible().map(|i| i.primary_order).max().unwrap_or(0);
    if count as i64 == max + 1 || max > 0 {
        return Ok(InitOutcome::AlreadyOrdered);
    }

    let sort = config.fallback_sort_for(item_type);
    let mut ordered: Vec<&Item> = catalog.eligible().collect();
    ordered.sort_by(|a, b| fallback_cmp(sort, a, b));
    let positions: HashMap<ItemId, i64> = ordered
        .iter()
        .enumerate()
        .map(|(pos, item)| (item.id, pos as i64))
        .collect();

    for item in catalog.items.iter_mut() {
        if let Some(&pos) = positions.get(&item.id) {
            item.primary_order = pos;
        }
    }
    save_catalog_at(home, &mut catalog)?;
    info!("initialized order for {count} '{item_type}' items ({sort})");
    Ok(InitOutcome::Initialized { count })
}

/// Reconcile `item_type` only if its staleness flag is live, clearing the
/// flag afterwards. Returns `None` when the type was clean.
pub fn reconcile_if_stale_at(
    home: &Path,
    config: &ScopeConfig,
    item_type: &ItemType,
) -> Result<Option<ReconcileOutcome>, EngineError> {
    if !staleness::is_dirty_at(home, item_type)? {
        return Ok(None);
    }
    let outcome = reconcile_at(home, config, item_type)?;
    staleness::clear_at(home, item_type)?;
    Ok(Some(outcome))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
