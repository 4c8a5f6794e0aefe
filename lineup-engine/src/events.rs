//! Write-path lifecycle events.
//!
//! Every code path that mutates a catalog (save, trash, delete) calls the
//! matching event so the type gets flagged stale. The events never
//! reconcile inline; repair is deferred to the next read or to the daemon.

use std::path::Path;

use lineup_core::types::ItemType;
use lineup_core::ScopeConfig;
use tracing::debug;

use crate::error::EngineError;
use crate::staleness;

fn mark_if_enabled(
    home: &Path,
    config: &ScopeConfig,
    item_type: &ItemType,
    event: &str,
) -> Result<(), EngineError> {
    if !config.type_enabled(item_type) {
        debug!("{event} for '{item_type}': ordering disabled, ignoring");
        return Ok(());
    }
    staleness::mark_dirty_at(home, item_type)
}

/// An item of `item_type` was created or edited.
pub fn item_saved(home: &Path, config: &ScopeConfig, item_type: &ItemType) -> Result<(), EngineError> {
    mark_if_enabled(home, config, item_type, "save")
}

/// An item of `item_type` was trashed.
pub fn item_trashed(
    home: &Path,
    config: &ScopeConfig,
    item_type: &ItemType,
) -> Result<(), EngineError> {
    mark_if_enabled(home, config, item_type, "trash")
}

/// An item of `item_type` was permanently deleted.
pub fn item_deleted(
    home: &Path,
    config: &ScopeConfig,
    item_type: &ItemType,
) -> Result<(), EngineError> {
    mark_if_enabled(home, config, item_type, "delete")
}
