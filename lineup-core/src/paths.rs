//! Shared path and atomic-write helpers for the `~/.lineup/` tree.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// `<home>/.lineup/`
pub fn lineup_root(home: &Path) -> PathBuf {
    home.join(".lineup")
}

/// `<home>/.lineup/catalogs/`
pub fn catalogs_dir(home: &Path) -> PathBuf {
    lineup_root(home).join("catalogs")
}

/// `<home>/.lineup/taxonomies/`
pub fn taxonomies_dir(home: &Path) -> PathBuf {
    lineup_root(home).join("taxonomies")
}

/// The user's home directory, or `StoreError::HomeNotFound`.
pub fn home() -> Result<PathBuf, StoreError> {
    dirs::home_dir().ok_or(StoreError::HomeNotFound)
}

/// Create `dir` (mode `0700`) if it does not yet exist.
pub fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        set_dir_permissions(dir)?;
    }
    Ok(())
}

/// Atomically write `contents` to `path`.
///
/// Write flow: `.tmp` sibling → `chmod 0600` → `rename`. The `.tmp` file is
/// always in the same directory as the target (same filesystem — no EXDEV).
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = tmp_sibling(path);
    std::fs::write(&tmp, contents)?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.tmp"))
}

#[cfg(unix)]
pub(crate) fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
pub(crate) fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
pub(crate) fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
pub(crate) fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_cleans_up_tmp() {
        let tmp = TempDir::new().expect("tempdir");
        let target = tmp.path().join("doc.yaml");
        write_atomic(&target, "key: value\n").expect("write");
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "key: value\n");
        assert!(
            !tmp.path().join("doc.yaml.tmp").exists(),
            ".tmp must be gone after successful write"
        );
    }

    #[test]
    fn ensure_dir_sets_perms() {
        let tmp = TempDir::new().expect("tempdir");
        let dir = tmp.path().join("nested").join("deep");
        ensure_dir(&dir).expect("ensure");
        assert!(dir.exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o700);
        }
    }
}
