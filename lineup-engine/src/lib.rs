//! Lineup engine — reconciliation, merging, and query-time order resolution
//! on top of the `lineup-core` stores.
//!
//! Module map:
//! - [`permutation`] — per-term item-id permutations (JSON artifacts)
//! - [`staleness`] — per-type TTL'd dirty flags
//! - [`reconcile`] — dense-order repair and first-time initialization
//! - [`merge`] — partial-submission merge rules
//! - [`resolver`] — which order applies to a given query
//! - [`events`] — write-path lifecycle notifications
//! - [`actions`] — the authorized mutation surface

pub mod actions;
pub mod error;
pub mod events;
pub mod merge;
pub mod permutation;
pub mod reconcile;
pub mod resolver;
pub mod staleness;

pub use actions::{AllowAll, Authorizer, ResetScope};
pub use error::EngineError;
pub use reconcile::{InitOutcome, ReconcileOutcome};
pub use resolver::{OrderDirective, OrderFilter, QueryContext, SortKey, TermFilter, TermSort};
