//! Lineup core library — domain types, scope config, catalog persistence.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs
//! - [`error`] — [`StoreError`]
//! - [`config`] — [`config::ScopeConfig`] load / save
//! - [`catalog`] — item catalogs (load / save / mutate)
//! - [`taxonomy`] — term collections
//! - [`paths`] — `~/.lineup/` layout helpers

pub mod catalog;
pub mod config;
pub mod error;
pub mod paths;
pub mod taxonomy;
pub mod types;

pub use config::ScopeConfig;
pub use error::StoreError;
pub use types::{
    Catalog, FallbackSort, Item, ItemId, ItemStatus, ItemType, Taxonomy, TaxonomyName, Term,
    TermId,
};
