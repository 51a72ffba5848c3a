//! Loader for sources on the local file system.
//!
//! Layout of a source directory:
//!
//! ```text
//! <root>/
//!   rules/        rule documents
//!   personas/     persona documents (agents/ is accepted too)
//!   commands/     command documents
//!   hooks/        hook documents
//!   shared/...    anything else: include-only fragments
//! ```
//!
//! Every `.md`/`.mdc` file under the root can be the target of an `@include`.
//! Files inside a kind directory whose name starts with `_` are fragments, not
//! documents. Hidden directories are skipped and symlinks are never followed.
//!
//! Directory traversal uses `walkdir`, which is synchronous, so it runs inside
//! `spawn_blocking`. Several sources are loaded concurrently with `join_all`.

use anyhow::{Result, anyhow};
use futures::future::join_all;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::{MultiSourceLoadResult, SourceDescriptor, SourceLoadResult};
use crate::core::{Diagnostic, DocumentKind, ErrorCategory, Provenance, RulesmithError};
use crate::markdown::is_markdown_file;

/// Load one local source directory.
///
/// A missing root is an error. Files that cannot be read are reported in
/// [`SourceLoadResult::errors`] and skipped.
pub async fn load_local_source(descriptor: SourceDescriptor) -> Result<SourceLoadResult> {
    if !descriptor.root.is_dir() {
        return Err(RulesmithError::SourceNotFound {
            name: descriptor.name.clone(),
            path: descriptor.root.display().to_string(),
        }
        .into());
    }

    let name = descriptor.name.clone();
    let result = tokio::task::spawn_blocking(move || scan_source(descriptor))
        .await
        .map_err(|e| anyhow!("Task join error while loading source '{name}': {e}"))?;

    tracing::debug!(
        "Loaded source '{}': {} documents, {} files, {} errors",
        result.source.name,
        result.documents.len(),
        result.files.len(),
        result.errors.len()
    );
    Ok(result)
}

/// Load several sources concurrently, preserving their order.
pub async fn load_local_sources(descriptors: Vec<SourceDescriptor>) -> Result<MultiSourceLoadResult> {
    let results = join_all(descriptors.into_iter().map(load_local_source)).await;

    let mut loaded = MultiSourceLoadResult::new();
    for result in results {
        loaded.push(result?);
    }
    Ok(loaded)
}

fn scan_source(descriptor: SourceDescriptor) -> SourceLoadResult {
    let root = descriptor.root.clone();
    let mut result = SourceLoadResult::new(descriptor);

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(|p| relative_to(&root, p)).unwrap_or_default();
                result.errors.push(
                    Diagnostic::error(ErrorCategory::Load, format!("failed to read directory entry: {e}"))
                        .with_provenance(&Provenance::new(result.source.name.clone(), path)),
                );
                continue;
            }
        };

        let relative = relative_to(&root, entry.path());
        if entry.file_type().is_symlink() {
            result.errors.push(
                Diagnostic::warning(ErrorCategory::Load, "symlinks are not followed; entry skipped")
                    .with_provenance(&Provenance::new(result.source.name.clone(), &relative)),
            );
            continue;
        }
        if !entry.file_type().is_file() || !is_markdown_file(entry.path()) {
            continue;
        }

        // BLOCKING I/O is fine here: scan_source runs on the blocking pool.
        let text = match std::fs::read_to_string(entry.path()) {
            Ok(text) => text,
            Err(e) => {
                result.errors.push(
                    Diagnostic::error(ErrorCategory::Load, format!("failed to read file: {e}"))
                        .with_provenance(&Provenance::new(result.source.name.clone(), &relative)),
                );
                continue;
            }
        };

        match document_kind(&relative) {
            Some(kind) => result.add_document(kind, &relative, text),
            None => result.files.insert(relative, text),
        }
    }

    result
}

/// The document kind implied by a path relative to the source root.
fn document_kind(relative: &Path) -> Option<DocumentKind> {
    let mut components = relative.components();
    let directory = components.next()?.as_os_str().to_str()?;
    components.next()?;

    let is_fragment = relative
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('_'));
    if is_fragment {
        return None;
    }

    match directory {
        "rules" => Some(DocumentKind::Rule),
        "personas" | "agents" => Some(DocumentKind::Persona),
        "commands" => Some(DocumentKind::Command),
        "hooks" => Some(DocumentKind::Hook),
        _ => None,
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

fn relative_to(root: &Path, path: &Path) -> std::path::PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
