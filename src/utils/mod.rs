//! Shared utilities
//!
//! - [`fs`] - atomic writes, lexical path normalization and checksums
//! - [`suggest`] - did-you-mean suggestions for misspelled identifiers
//! - [`resolve_path`] - `~` and environment variable expansion for configured paths

pub mod fs;

use anyhow::Result;
use std::path::PathBuf;

pub use fs::{
    atomic_write, checksum_bytes, ensure_dir, file_checksum, find_upwards, is_safe_path,
    normalize_path, normalize_within, safe_write, to_slash,
};

/// Minimum Jaro-Winkler similarity for a candidate to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Find the candidate closest to `input`, if any is close enough to be a likely
/// typo.
pub fn suggest<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .map(|candidate| (candidate, strsim::jaro_winkler(input, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate.to_string())
}

/// Expand `~` and `$VAR` / `${VAR}` references in a configured path.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| anyhow::anyhow!("Failed to expand path '{path}': {e}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_finds_close_match() {
        assert_eq!(suggest("claud", ["claude", "cursor", "opencode"]).as_deref(), Some("claude"));
        assert_eq!(suggest("npn", ["npm", "pip", "go"]).as_deref(), Some("npm"));
    }

    #[test]
    fn test_suggest_rejects_distant_input() {
        assert_eq!(suggest("zzzz", ["claude", "cursor"]), None);
    }

    #[test]
    fn test_resolve_path_plain() {
        assert_eq!(resolve_path("rules/shared").unwrap(), PathBuf::from("rules/shared"));
    }
}
