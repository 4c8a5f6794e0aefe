//! End-to-end ordering lifecycle against a temp home: enable, initialize,
//! reorder, trash, and watch the read path repair itself.

use chrono::{Duration, Utc};
use lineup_core::catalog::{add_item_at, load_catalog_at, update_item_at};
use lineup_core::config::save_config_at;
use lineup_core::taxonomy::add_term_at;
use lineup_core::types::{Item, ItemId, ItemStatus, ItemType, TaxonomyName};
use lineup_core::ScopeConfig;
use lineup_engine::actions::{save_primary_order, save_scoped_permutation, AllowAll};
use lineup_engine::reconcile::{initialize_at, InitOutcome};
use lineup_engine::resolver::{resolve_items_at, QueryContext};
use lineup_engine::{events, staleness};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn article() -> ItemType {
    ItemType::from("article")
}

fn category() -> TaxonomyName {
    TaxonomyName::from("category")
}

fn new_item(title: &str, age_mins: i64) -> Item {
    Item {
        id: ItemId(0),
        title: title.to_string(),
        status: ItemStatus::Published,
        primary_order: 0,
        created_at: Utc::now() - Duration::minutes(age_mins),
        terms: vec![],
    }
}

fn enabled_config(home: &std::path::Path) -> ScopeConfig {
    let mut config = ScopeConfig::default();
    config.item_types.push(article());
    config.taxonomies.push(category());
    save_config_at(home, &config).expect("save config");
    config
}

fn listed_ids(home: &std::path::Path, config: &ScopeConfig) -> Vec<u64> {
    let items = resolve_items_at(home, config, &QueryContext::for_type(article()), &[])
        .expect("resolve");
    items.iter().map(|i| i.id.0).collect()
}

#[test]
fn full_primary_order_lifecycle() {
    init_logging();
    let home = TempDir::new().expect("tempdir");
    let config = enabled_config(home.path());

    // Three items, newest last. add_item_at hands out provisional slots.
    add_item_at(home.path(), &article(), new_item("first", 60)).expect("add");
    add_item_at(home.path(), &article(), new_item("second", 40)).expect("add");
    add_item_at(home.path(), &article(), new_item("third", 20)).expect("add");

    // Provisional slots are already dense, so init leaves them alone.
    assert_eq!(
        initialize_at(home.path(), &config, &article()).expect("init"),
        InitOutcome::AlreadyOrdered
    );
    assert_eq!(listed_ids(home.path(), &config), vec![1, 2, 3]);

    // The user drags "third" to the top.
    save_primary_order(
        home.path(),
        &AllowAll,
        &article(),
        &[ItemId(3), ItemId(1), ItemId(2)],
    )
    .expect("reorder");
    assert_eq!(listed_ids(home.path(), &config), vec![3, 1, 2]);

    // Trashing the middle item opens a gap and flags the type.
    update_item_at(home.path(), &article(), ItemId(1), |item| {
        item.status = ItemStatus::Trashed;
    })
    .expect("trash");
    events::item_trashed(home.path(), &config, &article()).expect("event");
    assert!(staleness::is_dirty_at(home.path(), &article()).expect("dirty"));

    // The next read repairs the gap and clears the flag.
    assert_eq!(listed_ids(home.path(), &config), vec![3, 2]);
    assert!(!staleness::is_dirty_at(home.path(), &article()).expect("clean"));
    let catalog = load_catalog_at(home.path(), &article()).expect("load");
    let dense: Vec<(u64, i64)> = catalog
        .eligible()
        .map(|i| (i.id.0, i.primary_order))
        .collect();
    assert_eq!(dense, vec![(2, 1), (3, 0)]);
}

#[test]
fn scoped_permutation_overrides_primary_within_the_term() {
    init_logging();
    let home = TempDir::new().expect("tempdir");
    let config = enabled_config(home.path());

    let term = add_term_at(home.path(), &category(), "News").expect("term");
    for (title, age) in [("a", 30), ("b", 20), ("c", 10)] {
        let added = add_item_at(home.path(), &article(), new_item(title, age)).expect("add");
        update_item_at(home.path(), &article(), added.id, |item| {
            item.terms.push(term.id);
        })
        .expect("tag");
    }

    save_scoped_permutation(
        home.path(),
        &AllowAll,
        term.id,
        &[ItemId(2), ItemId(3), ItemId(1)],
    )
    .expect("save permutation");

    let scoped = QueryContext::for_type(article()).with_term(category(), term.id);
    let items = resolve_items_at(home.path(), &config, &scoped, &[]).expect("resolve");
    let ids: Vec<u64> = items.iter().map(|i| i.id.0).collect();
    assert_eq!(ids, vec![2, 3, 1]);

    // The unscoped listing is untouched by the permutation.
    assert_eq!(listed_ids(home.path(), &config), vec![1, 2, 3]);
}
