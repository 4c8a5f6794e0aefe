//! The authorized action surface.
//!
//! Everything a UI or CLI can ask the engine to do goes through here, in a
//! fixed validation order: permission, then payload shape, then referenced
//! entities, then the mutation itself. Transport concerns (request
//! signing, session handling) live with the caller; the engine only asks
//! an [`Authorizer`] whether the principal may act.

use std::path::Path;

use lineup_core::catalog::{load_catalog_at, save_catalog_at};
use lineup_core::config::load_config_at;
use lineup_core::taxonomy::find_term_at;
use lineup_core::types::{FallbackSort, Item, ItemId, ItemType, TaxonomyName, TermId};
use tracing::info;

use crate::error::EngineError;
use crate::merge;
use crate::permutation::delete_permutation_at;
use crate::reconcile::fallback_cmp;

/// Capability checks for the acting principal.
pub trait Authorizer {
    /// May reorder items (primary and per-term).
    fn can_edit_items(&self) -> bool;
    /// May reorder the terms of a taxonomy.
    fn can_manage_terms(&self) -> bool;
}

/// Grants everything. The right authorizer for a single-user CLI working
/// on its own home directory.
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn can_edit_items(&self) -> bool {
        true
    }
    fn can_manage_terms(&self) -> bool {
        true
    }
}

/// What a reset should wipe.
#[derive(Debug, Clone)]
pub enum ResetScope {
    /// Rebuild the primary order of one type from a chosen sort.
    Primary {
        item_type: ItemType,
        sort: FallbackSort,
    },
    /// Discard the stored permutation of one term.
    Scoped { term_id: TermId },
}

fn authorize(ok: bool, action: &'static str) -> Result<(), EngineError> {
    if ok {
        Ok(())
    } else {
        Err(EngineError::PermissionDenied { action })
    }
}

/// Persist a drag-and-drop reordering of the primary sequence.
pub fn save_primary_order(
    home: &Path,
    auth: &dyn Authorizer,
    item_type: &ItemType,
    item_ids: &[ItemId],
) -> Result<(), EngineError> {
    authorize(auth.can_edit_items(), "save_primary_order")?;
    merge::merge_primary_at(home, item_type, item_ids)
}

/// Persist a drag-and-drop reordering within one term's view.
///
/// The term must exist in some stored taxonomy; permutations for phantom
/// terms would never be read and never cleaned up.
pub fn save_scoped_permutation(
    home: &Path,
    auth: &dyn Authorizer,
    term_id: TermId,
    item_ids: &[ItemId],
) -> Result<(), EngineError> {
    authorize(auth.can_edit_items(), "save_scoped_permutation")?;
    if item_ids.is_empty() {
        return Err(EngineError::InvalidInput("empty order submission".into()));
    }
    if find_term_at(home, term_id)?.is_none() {
        return Err(EngineError::TermNotFound { term_id });
    }
    merge::merge_scoped_at(home, term_id, item_ids)
}

/// Persist a reordering of a taxonomy's terms.
pub fn save_dimension_order(
    home: &Path,
    auth: &dyn Authorizer,
    taxonomy: &TaxonomyName,
    term_ids: &[TermId],
) -> Result<(), EngineError> {
    authorize(auth.can_manage_terms(), "save_dimension_order")?;
    merge::merge_terms_at(home, taxonomy, term_ids)
}

/// Throw away a stored order and return to a derived one.
pub fn reset_order(
    home: &Path,
    auth: &dyn Authorizer,
    scope: ResetScope,
) -> Result<(), EngineError> {
    authorize(auth.can_edit_items(), "reset_order")?;
    match scope {
        ResetScope::Primary { item_type, sort } => {
            let config = load_config_at(home)?;
            if !config.type_enabled(&item_type) {
                return Err(EngineError::TypeNotEnabled { item_type });
            }
            let mut catalog = load_catalog_at(home, &item_type)?;
            let mut ordered: Vec<&Item> = catalog.eligible().collect();
            ordered.sort_by(|a, b| fallback_cmp(sort, a, b));
            let positions: Vec<(ItemId, i64)> = ordered
                .iter()
                .enumerate()
                .map(|(pos, item)| (item.id, pos as i64))
                .collect();
            for (id, pos) in positions {
                if let Some(item) = catalog.items.iter_mut().find(|i| i.id == id) {
                    item.primary_order = pos;
                }
            }
            save_catalog_at(home, &mut catalog)?;
            info!("reset primary order of '{item_type}' to {sort}");
            Ok(())
        }
        ResetScope::Scoped { term_id } => {
            if find_term_at(home, term_id)?.is_none() {
                return Err(EngineError::TermNotFound { term_id });
            }
            delete_permutation_at(home, term_id)?;
            info!("reset scoped order of term {term_id}");
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use lineup_core::config::save_config_at;
    use lineup_core::taxonomy::add_term_at;
    use lineup_core::types::{Catalog, ItemStatus};
    use lineup_core::ScopeConfig;
    use tempfile::TempDir;

    use crate::permutation::{load_permutation_at, save_permutation_at, PermutationFile};

    struct DenyAll;

    impl Authorizer for DenyAll {
        fn can_edit_items(&self) -> bool {
            false
        }
        fn can_manage_terms(&self) -> bool {
            false
        }
    }

    fn article() -> ItemType {
        ItemType::from("article")
    }

    fn write_catalog(home: &Path, rows: &[(u64, &str, i64, i64)]) {
        let now = Utc::now();
        let mut catalog = Catalog {
            item_type: article(),
            items: rows
                .iter()
                .map(|&(id, title, order, age)| Item {
                    id: ItemId(id),
                    title: title.to_string(),
                    status: ItemStatus::Published,
                    primary_order: order,
                    created_at: now - Duration::minutes(age),
                    terms: vec![],
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        save_catalog_at(home, &mut catalog).expect("save");
    }

    fn enable_article(home: &Path) {
        let mut config = ScopeConfig::default();
        config.item_types.push(article());
        save_config_at(home, &config).expect("save config");
    }

    #[test]
    fn unauthorized_principal_is_rejected_before_validation() {
        let home = TempDir::new().expect("tempdir");
        // Deliberately invalid payload: the permission check must win.
        let err = save_primary_order(home.path(), &DenyAll, &article(), &[]).unwrap_err();
        assert!(matches!(err, EngineError::PermissionDenied { .. }));

        let err = save_dimension_order(
            home.path(),
            &DenyAll,
            &TaxonomyName::from("category"),
            &[TermId(1)],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::PermissionDenied { .. }));
    }

    #[test]
    fn scoped_save_requires_an_existing_term() {
        let home = TempDir::new().expect("tempdir");
        let err = save_scoped_permutation(home.path(), &AllowAll, TermId(42), &[ItemId(1)])
            .unwrap_err();
        assert!(matches!(err, EngineError::TermNotFound { term_id: TermId(42) }));
    }

    #[test]
    fn scoped_save_persists_for_known_term() {
        let home = TempDir::new().expect("tempdir");
        let term = add_term_at(home.path(), &TaxonomyName::from("category"), "News")
            .expect("add term");
        save_scoped_permutation(home.path(), &AllowAll, term.id, &[ItemId(2), ItemId(1)])
            .expect("save");
        let perm = load_permutation_at(home.path(), term.id).expect("load");
        assert_eq!(perm.item_ids, vec![ItemId(2), ItemId(1)]);
    }

    #[test]
    fn reset_primary_rebuilds_from_title() {
        let home = TempDir::new().expect("tempdir");
        enable_article(home.path());
        write_catalog(
            home.path(),
            &[(10, "Banana", 0, 30), (20, "Apple", 1, 20), (30, "Cherry", 2, 10)],
        );
        reset_order(
            home.path(),
            &AllowAll,
            ResetScope::Primary {
                item_type: article(),
                sort: FallbackSort::TitleAsc,
            },
        )
        .expect("reset");
        let catalog = load_catalog_at(home.path(), &article()).expect("load");
        let got: Vec<(u64, i64)> = catalog
            .items
            .iter()
            .map(|i| (i.id.0, i.primary_order))
            .collect();
        assert_eq!(got, vec![(10, 1), (20, 0), (30, 2)]);
    }

    #[test]
    fn reset_primary_requires_enabled_type() {
        let home = TempDir::new().expect("tempdir");
        write_catalog(home.path(), &[(1, "a", 0, 10)]);
        let err = reset_order(
            home.path(),
            &AllowAll,
            ResetScope::Primary {
                item_type: article(),
                sort: FallbackSort::DateDesc,
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::TypeNotEnabled { .. }));
    }

    #[test]
    fn reset_scoped_removes_the_permutation() {
        let home = TempDir::new().expect("tempdir");
        let term = add_term_at(home.path(), &TaxonomyName::from("category"), "News")
            .expect("add term");
        save_permutation_at(
            home.path(),
            term.id,
            &PermutationFile::new(vec![ItemId(1), ItemId(2)]),
        )
        .expect("seed");
        reset_order(home.path(), &AllowAll, ResetScope::Scoped { term_id: term.id })
            .expect("reset");
        let perm = load_permutation_at(home.path(), term.id).expect("load");
        assert!(perm.item_ids.is_empty());
    }

    #[test]
    fn reset_scoped_requires_an_existing_term() {
        let home = TempDir::new().expect("tempdir");
        let err = reset_order(home.path(), &AllowAll, ResetScope::Scoped { term_id: TermId(9) })
            .unwrap_err();
        assert!(matches!(err, EngineError::TermNotFound { .. }));
    }
}
