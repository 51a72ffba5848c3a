//! File system helpers used by the CLI and the loader.
//!
//! The engine itself never touches the file system; everything here serves the
//! collaborators around it (writing artifacts, comparing them against disk,
//! locating the configuration file).

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Create a directory and all of its parents if it does not exist yet.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!(
            "Path exists but is not a directory: {}",
            path.display()
        ));
    }
    Ok(())
}

/// Atomically write bytes to `path`.
///
/// Content is written to a temporary file in the target directory, synced, and
/// then persisted over the destination, so readers never observe a partially
/// written file. Parent directories are created as needed.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;
    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Atomically write a string to `path`.
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Lexically normalize a path, resolving `.` and `..` without touching disk.
///
/// A `..` that would climb above the start of a relative path is dropped.
/// Use [`normalize_within`] when escaping must be detected.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                components.pop();
            }
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Lexically normalize a relative path, returning `None` if it climbs above its
/// starting directory or is absolute.
#[must_use]
pub fn normalize_within(path: &Path) -> Option<PathBuf> {
    let mut components: Vec<&std::ffi::OsStr> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                components.pop()?;
            }
            Component::Normal(part) => components.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(components.iter().collect())
}

/// Whether `path`, interpreted relative to `base`, stays inside `base`.
#[must_use]
pub fn is_safe_path(base: &Path, path: &Path) -> bool {
    if path.is_absolute() {
        let base = normalize_path(base);
        return normalize_path(path).starts_with(base);
    }
    normalize_within(path).is_some()
}

/// Render a relative path with forward slashes on every platform.
///
/// Generated artifacts reference each other by path, and the bytes must not
/// depend on the host.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// SHA-256 checksum of bytes, formatted as `sha256:<hex>`.
#[must_use]
pub fn checksum_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// SHA-256 checksum of a file on disk, or `None` if it does not exist.
pub fn file_checksum(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(checksum_bytes(&content))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read file for checksum: {}", path.display())),
    }
}

/// Walk up from `start` looking for a file named `file_name`.
pub fn find_upwards(start: &Path, file_name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parents() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("a/b/c.txt");
        atomic_write(&target, b"hello").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");

        safe_write(&target, "again").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "again");
    }

    #[test]
    fn test_normalize_within() {
        assert_eq!(normalize_within(Path::new("a/./b/../c.md")), Some(PathBuf::from("a/c.md")));
        assert_eq!(normalize_within(Path::new("a/../../c.md")), None);
        assert_eq!(normalize_within(Path::new("/etc/passwd")), None);
    }

    #[test]
    fn test_is_safe_path() {
        let base = Path::new("/project");
        assert!(is_safe_path(base, Path::new("src/main.rs")));
        assert!(!is_safe_path(base, Path::new("../etc")));
        assert!(is_safe_path(base, Path::new("/project/x")));
        assert!(!is_safe_path(base, Path::new("/etc/passwd")));
    }

    #[test]
    fn test_to_slash() {
        let path: PathBuf = ["rules", "shared", "a.md"].iter().collect();
        assert_eq!(to_slash(&path), "rules/shared/a.md");
    }

    #[test]
    fn test_checksums() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("x");
        assert_eq!(file_checksum(&file).unwrap(), None);
        fs::write(&file, "abc").unwrap();
        assert_eq!(
            file_checksum(&file).unwrap().unwrap(),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_find_upwards() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("marker.toml"), "").unwrap();
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_upwards(&nested, "marker.toml"), Some(temp.path().join("marker.toml")));
        assert_eq!(find_upwards(&nested, "absent.toml"), None);
    }
}
