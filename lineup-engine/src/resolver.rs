//! Query-time order resolution.
//!
//! The resolver decides, per query, which ordering applies:
//!
//! - explicit sort requested        -> pass through, lineup stays out
//! - item type not order-enabled    -> pass through
//! - single enabled-taxonomy term   -> inject that term's permutation
//! - anything else                  -> dense primary order
//!
//! Permutation injection is advisory: ids that no longer match an eligible
//! item are dropped, and matching items absent from the permutation are
//! appended behind it in primary order. The read path also opportunistically
//! repairs a stale primary order before resolving.

use std::collections::HashMap;
use std::path::Path;

use lineup_core::catalog::load_catalog_at;
use lineup_core::taxonomy::load_taxonomy_at;
use lineup_core::types::{Item, ItemId, ItemType, TaxonomyName, Term, TermId};
use lineup_core::{ScopeConfig, StoreError};
use tracing::debug;

use crate::error::EngineError;
use crate::permutation::load_permutation_at;
use crate::reconcile::reconcile_if_stale_at;

/// Term constraint carried by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermFilter {
    /// No term constraint.
    None,
    /// Exactly one term of one taxonomy. The only shape that can receive an
    /// injected permutation.
    Single {
        taxonomy: TaxonomyName,
        term_id: TermId,
    },
    /// Several terms (union). Too ambiguous to inject; primary order wins.
    Multiple(Vec<TermId>),
}

/// Explicitly requested sort; presence disables all order injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    TitleAsc,
    DateDesc,
}

/// Everything the resolver needs to know about one item query.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub item_type: ItemType,
    pub term_filter: TermFilter,
    pub explicit_sort: Option<SortKey>,
}

impl QueryContext {
    pub fn for_type(item_type: ItemType) -> Self {
        Self {
            item_type,
            term_filter: TermFilter::None,
            explicit_sort: None,
        }
    }

    pub fn with_term(mut self, taxonomy: TaxonomyName, term_id: TermId) -> Self {
        self.term_filter = TermFilter::Single { taxonomy, term_id };
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.explicit_sort = Some(sort);
        self
    }
}

/// The ordering decision for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderDirective {
    /// Lineup imposes nothing; the caller's own sort applies.
    PassThrough,
    /// Order by the dense `primary_order` field.
    PrimaryOrder,
    /// Order by this explicit id sequence, unmatched items after it.
    Injected(Vec<ItemId>),
}

/// Hook over an injected permutation before it is applied.
///
/// Extensions (say, a per-locale content layer) can reshape the id list for
/// a term without the resolver knowing they exist. Filters run in order;
/// each receives the previous filter's output.
pub trait OrderFilter {
    fn filter(&self, item_ids: Vec<ItemId>, term_id: TermId) -> Vec<ItemId>;
}

impl<F> OrderFilter for F
where
    F: Fn(Vec<ItemId>, TermId) -> Vec<ItemId>,
{
    fn filter(&self, item_ids: Vec<ItemId>, term_id: TermId) -> Vec<ItemId> {
        self(item_ids, term_id)
    }
}

/// Decide the [`OrderDirective`] for `query` without materializing items.
pub fn resolve_at(
    home: &Path,
    config: &ScopeConfig,
    query: &QueryContext,
    filters: &[&dyn OrderFilter],
) -> Result<OrderDirective, EngineError> {
    if query.explicit_sort.is_some() {
        return Ok(OrderDirective::PassThrough);
    }
    if !config.type_enabled(&query.item_type) {
        return Ok(OrderDirective::PassThrough);
    }
    if let TermFilter::Single { taxonomy, term_id } = &query.term_filter {
        if config.taxonomy_enabled(taxonomy) {
            let mut item_ids = load_permutation_at(home, *term_id)?.item_ids;
            for f in filters {
                item_ids = f.filter(item_ids, *term_id);
            }
            if !item_ids.is_empty() {
                debug!(
                    "injecting {}-id permutation for term {term_id}",
                    item_ids.len()
                );
                return Ok(OrderDirective::Injected(item_ids));
            }
        }
    }
    Ok(OrderDirective::PrimaryOrder)
}

/// Resolve `query` to a fully ordered item list.
///
/// A missing catalog resolves to an empty list rather than an error; read
/// paths must not fail just because nothing was ever stored for a type.
pub fn resolve_items_at(
    home: &Path,
    config: &ScopeConfig,
    query: &QueryContext,
    filters: &[&dyn OrderFilter],
) -> Result<Vec<Item>, EngineError> {
    if config.type_enabled(&query.item_type) {
        reconcile_if_stale_at(home, config, &query.item_type)?;
    }

    let catalog = match load_catalog_at(home, &query.item_type) {
        Ok(catalog) => catalog,
        Err(StoreError::NotFound { .. }) => return Ok(vec![]),
        Err(err) => return Err(err.into()),
    };

    let mut items: Vec<Item> = catalog
        .eligible()
        .filter(|item| match &query.term_filter {
            TermFilter::None => true,
            TermFilter::Single { term_id, .. } => item.terms.contains(term_id),
            TermFilter::Multiple(ids) => ids.iter().any(|id| item.terms.contains(id)),
        })
        .cloned()
        .collect();

    match resolve_at(home, config, query, filters)? {
        OrderDirective::PassThrough => {
            match query.explicit_sort {
                Some(SortKey::TitleAsc) => {
                    items.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
                }
                // No injected order and no lineup order: newest first.
                Some(SortKey::DateDesc) | None => {
                    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
                }
            }
        }
        OrderDirective::PrimaryOrder => {
            items.sort_by(|a, b| a.primary_order.cmp(&b.primary_order).then(a.id.cmp(&b.id)));
        }
        OrderDirective::Injected(item_ids) => {
            let rank: HashMap<ItemId, usize> = item_ids
                .iter()
                .enumerate()
                .map(|(pos, id)| (*id, pos))
                .collect();
            // Ranked items first in permutation order, then everything the
            // permutation never saw, in primary order.
            items.sort_by(|a, b| match (rank.get(&a.id), rank.get(&b.id)) {
                (Some(ra), Some(rb)) => ra.cmp(rb),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.primary_order.cmp(&b.primary_order).then(a.id.cmp(&b.id)),
            });
        }
    }
    Ok(items)
}

/// Explicitly requested term sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSort {
    NameAsc,
}

/// Resolve the terms of `taxonomy` in display order.
///
/// When term ordering is enabled for the taxonomy and no explicit sort is
/// requested, terms come back by `order_value` ascending (name as the
/// tiebreak). An explicit name sort always wins. A missing taxonomy
/// resolves to an empty list.
pub fn resolve_terms_at(
    home: &Path,
    config: &ScopeConfig,
    taxonomy: &TaxonomyName,
    explicit_sort: Option<TermSort>,
) -> Result<Vec<Term>, EngineError> {
    let tax = match load_taxonomy_at(home, taxonomy) {
        Ok(tax) => tax,
        Err(StoreError::NotFound { .. }) => return Ok(vec![]),
        Err(err) => return Err(err.into()),
    };
    let mut terms = tax.terms;
    if explicit_sort.is_none() && config.term_order_enabled(taxonomy) {
        terms.sort_by(|a, b| {
            a.order_value
                .cmp(&b.order_value)
                .then_with(|| a.name.cmp(&b.name))
        });
    } else {
        terms.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(terms)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use lineup_core::catalog::save_catalog_at;
    use lineup_core::taxonomy::save_taxonomy_at;
    use lineup_core::types::{Catalog, ItemStatus, Taxonomy};
    use tempfile::TempDir;

    use crate::permutation::{save_permutation_at, PermutationFile};

    fn article() -> ItemType {
        ItemType::from("article")
    }

    fn category() -> TaxonomyName {
        TaxonomyName::from("category")
    }

    fn enabled_config() -> ScopeConfig {
        let mut config = ScopeConfig::default();
        config.item_types.push(article());
        config.taxonomies.push(category());
        config
    }

    /// Catalog of (id, title, order, age in minutes, terms).
    fn write_catalog(home: &Path, rows: &[(u64, &str, i64, i64, &[u64])]) {
        let now = Utc::now();
        let mut catalog = Catalog {
            item_type: article(),
            items: rows
                .iter()
                .map(|&(id, title, order, age, terms)| Item {
                    id: ItemId(id),
                    title: title.to_string(),
                    status: ItemStatus::Published,
                    primary_order: order,
                    created_at: now - Duration::minutes(age),
                    terms: terms.iter().map(|&t| TermId(t)).collect(),
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        save_catalog_at(home, &mut catalog).expect("save");
    }

    fn ids(items: &[Item]) -> Vec<u64> {
        items.iter().map(|i| i.id.0).collect()
    }

    #[test]
    fn explicit_sort_passes_through() {
        let home = TempDir::new().expect("tempdir");
        write_catalog(
            home.path(),
            &[(1, "b", 1, 10, &[]), (2, "a", 0, 20, &[])],
        );
        let query = QueryContext::for_type(article()).with_sort(SortKey::TitleAsc);
        let directive =
            resolve_at(home.path(), &enabled_config(), &query, &[]).expect("resolve");
        assert_eq!(directive, OrderDirective::PassThrough);
        let items =
            resolve_items_at(home.path(), &enabled_config(), &query, &[]).expect("items");
        assert_eq!(ids(&items), vec![2, 1], "title sort, not primary order");
    }

    #[test]
    fn disabled_type_passes_through() {
        let home = TempDir::new().expect("tempdir");
        let query = QueryContext::for_type(article());
        let directive =
            resolve_at(home.path(), &ScopeConfig::default(), &query, &[]).expect("resolve");
        assert_eq!(directive, OrderDirective::PassThrough);
    }

    #[test]
    fn unfiltered_query_uses_primary_order() {
        let home = TempDir::new().expect("tempdir");
        write_catalog(
            home.path(),
            &[(1, "x", 2, 10, &[]), (2, "y", 0, 20, &[]), (3, "z", 1, 30, &[])],
        );
        let query = QueryContext::for_type(article());
        let items =
            resolve_items_at(home.path(), &enabled_config(), &query, &[]).expect("items");
        assert_eq!(ids(&items), vec![2, 3, 1]);
    }

    #[test]
    fn single_term_query_gets_the_permutation() {
        let home = TempDir::new().expect("tempdir");
        write_catalog(
            home.path(),
            &[
                (3, "c", 0, 10, &[7]),
                (9, "i", 1, 20, &[7]),
                (5, "e", 2, 30, &[7]),
            ],
        );
        save_permutation_at(
            home.path(),
            TermId(7),
            &PermutationFile::new(vec![ItemId(9), ItemId(3), ItemId(5)]),
        )
        .expect("seed");

        let query = QueryContext::for_type(article()).with_term(category(), TermId(7));
        let items =
            resolve_items_at(home.path(), &enabled_config(), &query, &[]).expect("items");
        assert_eq!(ids(&items), vec![9, 3, 5]);
    }

    #[test]
    fn permutation_with_vanished_id_drops_it_and_appends_strays() {
        let home = TempDir::new().expect("tempdir");
        // Permutation [3, 7, 9]: item 7 was deleted, item 5 joined the term
        // after the permutation was saved.
        write_catalog(
            home.path(),
            &[
                (3, "c", 1, 10, &[4]),
                (9, "i", 2, 20, &[4]),
                (5, "e", 0, 30, &[4]),
            ],
        );
        save_permutation_at(
            home.path(),
            TermId(4),
            &PermutationFile::new(vec![ItemId(3), ItemId(7), ItemId(9)]),
        )
        .expect("seed");

        let query = QueryContext::for_type(article()).with_term(category(), TermId(4));
        let items =
            resolve_items_at(home.path(), &enabled_config(), &query, &[]).expect("items");
        assert_eq!(
            ids(&items),
            vec![3, 9, 5],
            "deleted id vanishes; the stray follows in primary order"
        );
    }

    #[test]
    fn missing_permutation_falls_back_to_primary_order() {
        let home = TempDir::new().expect("tempdir");
        write_catalog(
            home.path(),
            &[(1, "a", 1, 10, &[42]), (2, "b", 0, 20, &[42])],
        );
        let query = QueryContext::for_type(article()).with_term(category(), TermId(42));
        let directive =
            resolve_at(home.path(), &enabled_config(), &query, &[]).expect("resolve");
        assert_eq!(directive, OrderDirective::PrimaryOrder);
        let items =
            resolve_items_at(home.path(), &enabled_config(), &query, &[]).expect("items");
        assert_eq!(ids(&items), vec![2, 1]);
    }

    #[test]
    fn multi_term_query_never_injects() {
        let home = TempDir::new().expect("tempdir");
        save_permutation_at(
            home.path(),
            TermId(1),
            &PermutationFile::new(vec![ItemId(1)]),
        )
        .expect("seed");
        let mut query = QueryContext::for_type(article());
        query.term_filter = TermFilter::Multiple(vec![TermId(1), TermId(2)]);
        let directive =
            resolve_at(home.path(), &enabled_config(), &query, &[]).expect("resolve");
        assert_eq!(directive, OrderDirective::PrimaryOrder);
    }

    #[test]
    fn filters_can_reshape_the_permutation() {
        let home = TempDir::new().expect("tempdir");
        save_permutation_at(
            home.path(),
            TermId(6),
            &PermutationFile::new(vec![ItemId(1), ItemId(2), ItemId(3)]),
        )
        .expect("seed");

        let reverse = |mut ids: Vec<ItemId>, _term: TermId| {
            ids.reverse();
            ids
        };
        let query = QueryContext::for_type(article()).with_term(category(), TermId(6));
        let directive = resolve_at(home.path(), &enabled_config(), &query, &[&reverse])
            .expect("resolve");
        assert_eq!(
            directive,
            OrderDirective::Injected(vec![ItemId(3), ItemId(2), ItemId(1)])
        );
    }

    #[test]
    fn filter_emptying_the_list_falls_back() {
        let home = TempDir::new().expect("tempdir");
        save_permutation_at(
            home.path(),
            TermId(6),
            &PermutationFile::new(vec![ItemId(1)]),
        )
        .expect("seed");
        let drop_all = |_ids: Vec<ItemId>, _term: TermId| Vec::<ItemId>::new();
        let query = QueryContext::for_type(article()).with_term(category(), TermId(6));
        let directive =
            resolve_at(home.path(), &enabled_config(), &query, &[&drop_all]).expect("resolve");
        assert_eq!(directive, OrderDirective::PrimaryOrder);
    }

    #[test]
    fn missing_catalog_resolves_to_empty() {
        let home = TempDir::new().expect("tempdir");
        let query = QueryContext::for_type(article());
        let items =
            resolve_items_at(home.path(), &enabled_config(), &query, &[]).expect("items");
        assert!(items.is_empty());
    }

    fn write_terms(home: &Path, rows: &[(u64, &str, i64)]) {
        let mut tax = Taxonomy {
            name: category(),
            terms: rows
                .iter()
                .map(|&(id, name, order)| Term {
                    id: TermId(id),
                    name: name.to_string(),
                    order_value: order,
                })
                .collect(),
            updated_at: Utc::now(),
        };
        save_taxonomy_at(home, &mut tax).expect("save");
    }

    #[test]
    fn enabled_terms_sort_by_order_value() {
        let home = TempDir::new().expect("tempdir");
        write_terms(home.path(), &[(1, "News", 2), (2, "Sport", 0), (3, "Tech", 1)]);
        let mut config = ScopeConfig::default();
        config.term_order.push(category());
        let terms =
            resolve_terms_at(home.path(), &config, &category(), None).expect("terms");
        let names: Vec<&str> = terms.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Sport", "Tech", "News"]);
    }

    #[test]
    fn explicit_name_sort_wins_over_order_value() {
        let home = TempDir::new().expect("tempdir");
        write_terms(home.path(), &[(1, "News", 2), (2, "Sport", 0)]);
        let mut config = ScopeConfig::default();
        config.term_order.push(category());
        let terms =
            resolve_terms_at(home.path(), &config, &category(), Some(TermSort::NameAsc))
                .expect("terms");
        let names: Vec<&str> = terms.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["News", "Sport"]);
    }

    #[test]
    fn disabled_taxonomy_sorts_by_name() {
        let home = TempDir::new().expect("tempdir");
        write_terms(home.path(), &[(1, "Zebra", 0), (2, "Apple", 5)]);
        let terms = resolve_terms_at(home.path(), &ScopeConfig::default(), &category(), None)
            .expect("terms");
        let names: Vec<&str> = terms.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Zebra"]);
    }
}
