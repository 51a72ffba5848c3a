//! Per-platform output generation.
//!
//! A [`TargetGenerator`] turns a [`ResolvedContent`] into the literal files a
//! consumer tool expects. Generators never touch the file system; they return an
//! [`ArtifactSet`] keyed by relative path, and writing (or diffing against what
//! is on disk) is the caller's job.
//!
//! Output is byte-deterministic: the resolved collections arrive sorted, JSON
//! objects are emitted with sorted keys, and frontmatter fields are emitted in a
//! fixed order with override blocks applied last.
//!
//! # Layouts
//!
//! | Kind     | claude                    | cursor                            | opencode                      |
//! |----------|---------------------------|-----------------------------------|-------------------------------|
//! | rules    | `.claude/rules/<n>.md`    | `.cursor/rules/<n>.mdc`           | inlined into `AGENTS.md`      |
//! | personas | `.claude/agents/<n>.md`   | `.cursor/rules/persona-<n>.mdc`   | `.opencode/agent/<n>.md`      |
//! | commands | `.claude/commands/<n>.md` | `.cursor/commands/<n>.md`         | `.opencode/command/<n>.md`    |
//! | hooks    | `.claude/settings.json`   | `.cursor/hooks.json`              | `.opencode/plugin/<n>.js`     |
//! | index    | `CLAUDE.md`               | none                              | `AGENTS.md`                   |

pub mod claude;
pub mod cursor;
pub mod emit;
pub mod opencode;
pub mod vocabulary;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::{Diagnostic, Diagnostics, Document, ErrorCategory, Platform};
use crate::resolver::ResolvedContent;
use crate::utils::{checksum_bytes, to_slash};

pub use claude::ClaudeGenerator;
pub use cursor::CursorGenerator;
pub use emit::FrontmatterBuilder;
pub use opencode::OpenCodeGenerator;

/// How an artifact's content is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Markdown, MDC or script text.
    Text,
    /// A JSON document.
    Json,
}

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Path relative to the project root.
    pub path: PathBuf,
    pub content: String,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn text(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            kind: ArtifactKind::Text,
        }
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn json<T: Serialize>(path: impl Into<PathBuf>, value: &T) -> Result<Self, serde_json::Error> {
        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');
        Ok(Self {
            path: path.into(),
            content,
            kind: ArtifactKind::Json,
        })
    }

    /// `sha256:<hex>` of the content.
    pub fn checksum(&self) -> String {
        checksum_bytes(self.content.as_bytes())
    }
}

/// Artifacts keyed and ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactSet(BTreeMap<PathBuf, Artifact>);

impl ArtifactSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an artifact unless its path is taken. Returns the rejected artifact.
    pub fn insert(&mut self, artifact: Artifact) -> Result<(), Artifact> {
        if self.0.contains_key(&artifact.path) {
            return Err(artifact);
        }
        self.0.insert(artifact.path.clone(), artifact);
        Ok(())
    }

    pub fn get(&self, path: &Path) -> Option<&Artifact> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.0.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.0.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `path -> sha256:<hex>` for every artifact.
    pub fn checksums(&self) -> BTreeMap<PathBuf, String> {
        self.0.iter().map(|(path, artifact)| (path.clone(), artifact.checksum())).collect()
    }
}

impl IntoIterator for ArtifactSet {
    type Item = Artifact;
    type IntoIter = std::collections::btree_map::IntoValues<PathBuf, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

/// What a generator produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutput {
    pub artifacts: ArtifactSet,
    pub diagnostics: Diagnostics,
}

impl GenerationOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the artifact rendered from `document`.
    ///
    /// A path already taken by an earlier document wins; the later one is
    /// skipped with a warning.
    pub fn add(&mut self, document: &Document, artifact: Artifact) {
        if let Err(rejected) = self.artifacts.insert(artifact) {
            self.diagnostics.push(
                Diagnostic::warning(
                    ErrorCategory::Generation,
                    format!(
                        "{} skipped: '{}' is already generated from an earlier document",
                        document.label(),
                        to_slash(&rejected.path)
                    ),
                )
                .with_provenance(&document.provenance),
            );
        }
    }

    /// Add an artifact that aggregates several documents.
    pub fn add_aggregate(&mut self, artifact: Artifact) {
        if let Err(rejected) = self.artifacts.insert(artifact) {
            self.diagnostics.push(Diagnostic::error(
                ErrorCategory::Generation,
                format!("'{}' was generated twice", to_slash(&rejected.path)),
            ));
        }
    }

    /// Record a failure to render `document`.
    pub fn fail(&mut self, document: &Document, error: impl std::fmt::Display) {
        self.diagnostics.push(
            Diagnostic::error(
                ErrorCategory::Generation,
                format!("failed to generate {}: {error}", document.label()),
            )
            .with_provenance(&document.provenance),
        );
    }

    pub fn warn(&mut self, document: &Document, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::warning(ErrorCategory::Generation, message).with_provenance(&document.provenance),
        );
    }
}

/// Turns resolved content into one platform's output files.
pub trait TargetGenerator: Send + Sync {
    fn platform(&self) -> Platform;

    fn generate(&self, content: &ResolvedContent) -> GenerationOutput;
}

/// The generator for `platform`.
pub fn generator_for(platform: Platform) -> Box<dyn TargetGenerator> {
    match platform {
        Platform::Claude => Box::new(ClaudeGenerator),
        Platform::Cursor => Box::new(CursorGenerator),
        Platform::OpenCode => Box::new(OpenCodeGenerator),
    }
}

/// Generate with the generator matching `content.target`.
pub fn generate(content: &ResolvedContent) -> GenerationOutput {
    generator_for(content.target).generate(content)
}
