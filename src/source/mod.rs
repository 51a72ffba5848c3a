//! Raw document sources.
//!
//! A source is a named directory tree of documents. Loaders turn a
//! [`SourceDescriptor`] into a [`SourceLoadResult`]: the raw documents found,
//! every includable file keyed by its path relative to the source root, and any
//! problems met along the way. The engine consumes these values and never reads
//! the file system itself.
//!
//! # Components
//!
//! - [`local`] - loader for a directory on the local file system
//! - [`SourceFiles`] - in-memory file table that `@include` directives resolve against
//! - [`MultiSourceLoadResult`] - the ordered set of loaded sources handed to the resolver
//!
//! Results can also be assembled in memory, which is how tests drive the engine:
//!
//! ```rust
//! use rulesmith::core::DocumentKind;
//! use rulesmith::source::{MultiSourceLoadResult, SourceLoadResult};
//!
//! let source = SourceLoadResult::in_memory("local")
//!     .with_document(DocumentKind::Rule, "rules/style.md", "---\nname: style\n---\nBe tidy.")
//!     .with_file("shared/footer.md", "Thanks!");
//! let sources = MultiSourceLoadResult::from(vec![source]);
//! assert_eq!(sources.document_count(), 1);
//! ```

pub mod local;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::{Diagnostic, DocumentKind, Provenance};

pub use local::{load_local_source, load_local_sources};

/// Identifies one source of documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique name, used in diagnostics and provenance.
    pub name: String,
    /// Root directory of the source.
    pub root: PathBuf,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}

/// A document as returned by a loader: kind, unparsed text and provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub kind: DocumentKind,
    pub text: String,
    pub provenance: Provenance,
}

/// Every includable file of a source, keyed by path relative to the source root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFiles(BTreeMap<PathBuf, String>);

impl SourceFiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.0.insert(path.into(), text.into());
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.0.keys().map(PathBuf::as_path)
    }
}

/// Everything a loader produced for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoadResult {
    pub source: SourceDescriptor,
    pub documents: Vec<RawDocument>,
    pub files: SourceFiles,
    /// Problems that prevented individual files from being loaded.
    pub errors: Vec<Diagnostic>,
}

impl SourceLoadResult {
    #[must_use]
    pub fn new(source: SourceDescriptor) -> Self {
        Self {
            source,
            documents: Vec::new(),
            files: SourceFiles::new(),
            errors: Vec::new(),
        }
    }

    /// An empty result for a source that has no backing directory.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::new(SourceDescriptor::new(name, PathBuf::new()))
    }

    /// Add a document, also registering its text as an includable file.
    #[must_use]
    pub fn with_document(mut self, kind: DocumentKind, path: impl AsRef<Path>, text: &str) -> Self {
        self.add_document(kind, path.as_ref(), text.to_string());
        self
    }

    /// Add an includable file that is not itself a document.
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>, text: &str) -> Self {
        self.files.insert(path.as_ref(), text);
        self
    }

    pub fn add_document(&mut self, kind: DocumentKind, path: &Path, text: String) {
        self.files.insert(path, text.clone());
        self.documents.push(RawDocument {
            kind,
            text,
            provenance: Provenance::new(self.source.name.clone(), path),
        });
    }
}

/// The loaded sources, in priority order (first source first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSourceLoadResult {
    pub sources: Vec<SourceLoadResult>,
}

impl MultiSourceLoadResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: SourceLoadResult) {
        self.sources.push(source);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceLoadResult> {
        self.sources.iter()
    }

    pub fn document_count(&self) -> usize {
        self.sources.iter().map(|s| s.documents.len()).sum()
    }

    /// Loader errors of every source, in source order.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.sources.iter().flat_map(|s| s.errors.iter())
    }
}

impl From<Vec<SourceLoadResult>> for MultiSourceLoadResult {
    fn from(sources: Vec<SourceLoadResult>) -> Self {
        Self {
            sources,
        }
    }
}
