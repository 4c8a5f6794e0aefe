//! Per-taxonomy YAML term collections.
//!
//! Same persistence idiom as catalogs: one document per taxonomy under
//! `~/.lineup/taxonomies/`, atomic writes, `_at` + wrapper API.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::StoreError;
use crate::paths::{ensure_dir, home, taxonomies_dir, write_atomic};
use crate::types::{Taxonomy, TaxonomyName, Term, TermId};

/// `<home>/.lineup/taxonomies/<taxonomy>.yaml` — pure, no I/O.
pub fn taxonomy_path_at(home: &Path, taxonomy: &TaxonomyName) -> PathBuf {
    taxonomies_dir(home).join(format!("{}.yaml", taxonomy.0))
}

/// Load the taxonomy, or `StoreError::NotFound` if it was never created.
pub fn load_taxonomy_at(home: &Path, taxonomy: &TaxonomyName) -> Result<Taxonomy, StoreError> {
    let path = taxonomy_path_at(home, taxonomy);
    if !path.exists() {
        return Err(StoreError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })
}

/// `load_taxonomy_at` convenience wrapper.
pub fn load_taxonomy(taxonomy: &TaxonomyName) -> Result<Taxonomy, StoreError> {
    load_taxonomy_at(&home()?, taxonomy)
}

/// Atomically save a taxonomy, bumping its `updated_at`.
pub fn save_taxonomy_at(home: &Path, taxonomy: &mut Taxonomy) -> Result<(), StoreError> {
    ensure_dir(&taxonomies_dir(home))?;
    taxonomy.updated_at = Utc::now();
    let yaml = serde_yaml::to_string(taxonomy)?;
    write_atomic(&taxonomy_path_at(home, &taxonomy.name), &yaml)
}

/// List all taxonomy names with stored term collections, sorted by name.
pub fn list_taxonomies_at(home: &Path) -> Result<Vec<TaxonomyName>, StoreError> {
    let dir = taxonomies_dir(home);
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut names: Vec<TaxonomyName> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.strip_suffix(".yaml").map(TaxonomyName::from)
        })
        .collect();
    names.sort();
    Ok(names)
}

/// Add a term to a taxonomy, creating the taxonomy on first use.
///
/// Term ids are unique across ALL taxonomies (permutations are keyed by
/// term id alone), so the next id is derived from every stored collection.
/// The new term's `order_value` is 0; terms stay unordered until the
/// collection is first reordered.
pub fn add_term_at(
    home: &Path,
    taxonomy: &TaxonomyName,
    name: &str,
) -> Result<Term, StoreError> {
    let mut next_id = 1;
    for existing in list_taxonomies_at(home)? {
        let tax = load_taxonomy_at(home, &existing)?;
        next_id = next_id.max(tax.max_id() + 1);
    }

    let mut tax = match load_taxonomy_at(home, taxonomy) {
        Ok(tax) => tax,
        Err(StoreError::NotFound { .. }) => Taxonomy {
            name: taxonomy.clone(),
            terms: vec![],
            updated_at: Utc::now(),
        },
        Err(err) => return Err(err),
    };
    let term = Term {
        id: TermId(next_id),
        name: name.to_string(),
        order_value: 0,
    };
    tax.terms.push(term.clone());
    save_taxonomy_at(home, &mut tax)?;
    Ok(term)
}

/// Find a term by id across all stored taxonomies.
///
/// Walks `<home>/.lineup/taxonomies/*.yaml` in deterministic order the way
/// catalogs are listed; returns the first match.
pub fn find_term_at(
    home: &Path,
    term_id: TermId,
) -> Result<Option<(TaxonomyName, Term)>, StoreError> {
    for name in list_taxonomies_at(home)? {
        let tax = load_taxonomy_at(home, &name)?;
        if let Some(term) = tax.term(term_id) {
            return Ok(Some((name, term.clone())));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
