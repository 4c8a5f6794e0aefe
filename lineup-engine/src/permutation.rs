//! Per-term item permutations — the scoped half of the order store.
//!
//! # Storage layout
//!
//! ```text
//! ~/.lineup/
//!   permutations/
//!     <term_id>.json   (one file per term — mode 0600, atomic writes)
//! ```
//!
//! A permutation is an explicit item-id list for one term: the items the
//! user has dragged into place within that term's view. It is consulted at
//! read time only when the query filters on exactly that term; ids that no
//! longer resolve to eligible items are dropped by the resolver, never
//! eagerly scrubbed here.
//!
//! A term with no file simply has no stored permutation. Deleting the file
//! is the reset path.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lineup_core::paths::{ensure_dir, lineup_root, write_atomic};
use lineup_core::types::{ItemId, TermId};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, EngineError};

/// `<home>/.lineup/permutations/`
pub fn permutations_dir(home: &Path) -> PathBuf {
    lineup_root(home).join("permutations")
}

/// `<home>/.lineup/permutations/<term_id>.json` — pure, no I/O.
pub fn permutation_path_at(home: &Path, term_id: TermId) -> PathBuf {
    permutations_dir(home).join(format!("{term_id}.json"))
}

/// The stored permutation for one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationFile {
    pub saved_at: DateTime<Utc>,
    pub item_ids: Vec<ItemId>,
}

impl PermutationFile {
    pub fn new(item_ids: Vec<ItemId>) -> Self {
        Self {
            saved_at: Utc::now(),
            item_ids,
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }
}

/// On-disk shapes we accept. Early versions stored a bare id array; the
/// structured form added `saved_at`. Readers accept both, writers emit only
/// the structured form.
#[derive(Deserialize)]
#[serde(untagged)]
enum PermutationCompat {
    Structured {
        saved_at: DateTime<Utc>,
        item_ids: Vec<ItemId>,
    },
    Legacy(Vec<ItemId>),
}

impl From<PermutationCompat> for PermutationFile {
    fn from(compat: PermutationCompat) -> Self {
        match compat {
            PermutationCompat::Structured { saved_at, item_ids } => {
                PermutationFile { saved_at, item_ids }
            }
            PermutationCompat::Legacy(item_ids) => PermutationFile::new(item_ids),
        }
    }
}

/// Load the permutation for `term_id`, or an empty one if none is stored.
pub fn load_permutation_at(home: &Path, term_id: TermId) -> Result<PermutationFile, EngineError> {
    let path = permutation_path_at(home, term_id);
    if !path.exists() {
        return Ok(PermutationFile::empty());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let compat: PermutationCompat = serde_json::from_str(&contents)?;
    Ok(compat.into())
}

/// Atomically save the permutation for `term_id`.
pub fn save_permutation_at(
    home: &Path,
    term_id: TermId,
    permutation: &PermutationFile,
) -> Result<(), EngineError> {
    ensure_dir(&permutations_dir(home))?;
    let json = serde_json::to_string_pretty(permutation)?;
    write_atomic(&permutation_path_at(home, term_id), &json)?;
    Ok(())
}

/// Remove the stored permutation for `term_id`. Removing an absent
/// permutation is not an error.
pub fn delete_permutation_at(home: &Path, term_id: TermId) -> Result<(), EngineError> {
    let path = permutation_path_at(home, term_id);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(&path, e)),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
