//! Merging a submitted (partial) ordering into the stored state.
//!
//! Drag-and-drop surfaces submit only the ids the user can currently see,
//! usually one page of a larger collection. The merge rules keep off-page
//! items where they were:
//!
//! - primary order: the submitted items are redistributed across the SLOTS
//!   they collectively held before, so they cannot jump over unseen items
//! - scoped permutations: the submission replaces the prefix, and ids from
//!   the previous permutation that were not submitted are appended behind
//!   it in their prior relative order
//! - term order: slot redistribution again, with a zero-seeding pass for
//!   collections that have never been ordered

use std::collections::HashSet;
use std::path::Path;

use lineup_core::catalog::{load_catalog_at, save_catalog_at};
use lineup_core::taxonomy::{load_taxonomy_at, save_taxonomy_at};
use lineup_core::types::{ItemId, ItemType, TaxonomyName, TermId};
use tracing::info;

use crate::error::EngineError;
use crate::permutation::{load_permutation_at, save_permutation_at, PermutationFile};

/// Merge a submitted primary ordering for `item_type`.
///
/// The current positions of the submitted ids are collected and sorted
/// ascending, then handed back out in submission order: the first submitted
/// id gets the lowest slot, and so on. Ids with no current position (raced
/// deletions, stale pages) fall back to their index in the submission.
/// Unknown ids are skipped without error.
pub fn merge_primary_at(
    home: &Path,
    item_type: &ItemType,
    submitted: &[ItemId],
) -> Result<(), EngineError> {
    if submitted.is_empty() {
        return Err(EngineError::InvalidInput("empty order submission".into()));
    }
    let mut catalog = load_catalog_at(home, item_type)?;

    let submitted_set: HashSet<ItemId> = submitted.iter().copied().collect();
    let mut slots: Vec<i64> = catalog
        .items
        .iter()
        .filter(|i| submitted_set.contains(&i.id))
        .map(|i| i.primary_order)
        .collect();
    slots.sort_unstable();

    for (index, id) in submitted.iter().enumerate() {
        let slot = slots.get(index).copied().unwrap_or(index as i64);
        if let Some(item) = catalog.items.iter_mut().find(|i| i.id == *id) {
            item.primary_order = slot;
        }
    }
    save_catalog_at(home, &mut catalog)?;
    info!("merged primary order for {} '{item_type}' items", submitted.len());
    Ok(())
}

/// Merge a submitted permutation for one term.
///
/// Previously stored ids missing from the submission are appended after it
/// in their prior relative order, so reordering one page cannot silently
/// drop the rest of the term's arrangement.
pub fn merge_scoped_at(
    home: &Path,
    term_id: TermId,
    submitted: &[ItemId],
) -> Result<(), EngineError> {
    if submitted.is_empty() {
        return Err(EngineError::InvalidInput("empty order submission".into()));
    }
    let previous = load_permutation_at(home, term_id)?;

    let seen: HashSet<ItemId> = submitted.iter().copied().collect();
    let mut item_ids: Vec<ItemId> = submitted.to_vec();
    item_ids.extend(previous.item_ids.iter().filter(|id| !seen.contains(id)));

    save_permutation_at(home, term_id, &PermutationFile::new(item_ids))?;
    info!("merged permutation for term {term_id} ({} ids submitted)", submitted.len());
    Ok(())
}

/// Merge a submitted ordering of the terms of `taxonomy`.
///
/// Same slot redistribution as the primary merge, with one extra rule: a
/// collection whose submitted terms all still sit at 0 has never been
/// ordered, so the slots are seeded with `0..n` first. Otherwise every
/// submission of an untouched taxonomy would collapse to all-zero again.
pub fn merge_terms_at(
    home: &Path,
    taxonomy: &TaxonomyName,
    submitted: &[TermId],
) -> Result<(), EngineError> {
    if submitted.is_empty() {
        return Err(EngineError::InvalidInput("empty order submission".into()));
    }
    let mut tax = load_taxonomy_at(home, taxonomy)?;

    let submitted_set: HashSet<TermId> = submitted.iter().copied().collect();
    let mut slots: Vec<i64> = tax
        .terms
        .iter()
        .filter(|t| submitted_set.contains(&t.id))
        .map(|t| t.order_value)
        .collect();
    slots.sort_unstable();
    if !slots.is_empty() && slots.iter().all(|&v| v == 0) {
        slots = (0..submitted.len() as i64).collect();
    }

    for (index, id) in submitted.iter().enumerate() {
        let slot = slots.get(index).copied().unwrap_or(index as i64);
        if let Some(term) = tax.terms.iter_mut().find(|t| t.id == *id) {
            term.order_value = slot;
        }
    }
    save_taxonomy_at(home, &mut tax)?;
    info!("merged term order for '{taxonomy}' ({} terms submitted)", submitted.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
