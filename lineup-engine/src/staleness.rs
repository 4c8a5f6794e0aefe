//! Per-type staleness flags with a one-hour TTL.
//!
//! Write-path mutations drop a marker file under `~/.lineup/stale/`; the
//! next read of that type (or the daemon) notices the flag, reconciles, and
//! clears it. The flag's mtime is the mark time: a flag older than
//! [`STALE_TTL`] is treated as expired and removed on inspection, so a
//! crashed reader cannot wedge a type into permanent re-reconciliation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lineup_core::paths::{ensure_dir, lineup_root};
use lineup_core::types::ItemType;
use tracing::debug;

use crate::error::{io_err, EngineError};

/// How long a staleness flag stays live before it expires.
pub const STALE_TTL: Duration = Duration::from_secs(60 * 60);

/// `<home>/.lineup/stale/`
pub fn stale_dir(home: &Path) -> PathBuf {
    lineup_root(home).join("stale")
}

/// `<home>/.lineup/stale/<item_type>.flag` — pure, no I/O.
pub fn flag_path_at(home: &Path, item_type: &ItemType) -> PathBuf {
    stale_dir(home).join(format!("{}.flag", item_type.0))
}

/// Mark `item_type` as needing reconciliation.
///
/// Re-marking an already-dirty type refreshes the flag's mtime, which
/// restarts the TTL. That matches the intent: the newest mutation is what
/// the TTL should measure from.
pub fn mark_dirty_at(home: &Path, item_type: &ItemType) -> Result<(), EngineError> {
    ensure_dir(&stale_dir(home))?;
    let path = flag_path_at(home, item_type);
    std::fs::write(&path, "1\n").map_err(|e| io_err(&path, e))?;
    debug!("marked '{item_type}' stale");
    Ok(())
}

/// Whether `item_type` has a live staleness flag.
///
/// An expired flag is removed here as a side effect and reported clean.
pub fn is_dirty_at(home: &Path, item_type: &ItemType) -> Result<bool, EngineError> {
    let path = flag_path_at(home, item_type);
    let meta = match std::fs::metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(io_err(&path, e)),
    };
    let age = meta
        .modified()
        .map_err(|e| io_err(&path, e))?
        .elapsed()
        .unwrap_or(Duration::ZERO);
    if age > STALE_TTL {
        debug!("staleness flag for '{item_type}' expired after {age:?}");
        clear_at(home, item_type)?;
        return Ok(false);
    }
    Ok(true)
}

/// Clear the staleness flag for `item_type`. Clearing a clean type is fine.
pub fn clear_at(home: &Path, item_type: &ItemType) -> Result<(), EngineError> {
    let path = flag_path_at(home, item_type);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(&path, e)),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
