//! Filesystem helpers shared by file-editing resources.
use std::path::Path;

use anyhow::{Context as _, Result};

/// Create the parent directory of `path` if it does not exist.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Write `content` to `path` atomically: stage to a sibling temp file, then
/// rename into place so a partial write never corrupts the target.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    std::io::Write::write_all(&mut tmp, content.as_bytes())
        .with_context(|| format!("write temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("rename into place: {}", path.display()))?;
    Ok(())
}

/// Set the Unix mode bits of `path`. No-op on non-Unix targets.
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .with_context(|| format!("chmod {:o} {}", mode, path.display()))?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

/// Read the Unix mode bits of `path` (lower 12 bits). Returns `None` when
/// the file is missing or on non-Unix targets.
#[must_use]
pub fn read_mode(path: &Path) -> Option<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        std::fs::metadata(path)
            .ok()
            .map(|m| m.permissions().mode() & 0o7777)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn ensure_parent_dir_creates_missing_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a/b/c.txt");
        ensure_parent_dir(&path).unwrap();
        assert!(tmp.path().join("a/b").is_dir());
    }

    #[test]
    fn ensure_parent_dir_noop_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("c.txt");
        ensure_parent_dir(&path).unwrap();
        ensure_parent_dir(&path).unwrap();
    }

    #[test]
    fn write_atomic_creates_file_and_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/out.txt");
        write_atomic(&path, "hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn write_atomic_replaces_existing_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.txt");
        write_atomic(&path, "one\n").unwrap();
        write_atomic(&path, "two\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two\n");
    }

    #[cfg(unix)]
    #[test]
    fn set_and_read_mode_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("f");
        std::fs::write(&path, "x").unwrap();
        set_mode(&path, 0o600).unwrap();
        assert_eq!(read_mode(&path), Some(0o600));
    }

    #[test]
    fn read_mode_missing_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(read_mode(&tmp.path().join("absent")), None);
    }
}
