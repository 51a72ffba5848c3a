//! The per-target result of resolution.

use serde::Serialize;
use std::path::PathBuf;

use crate::core::{Document, DocumentKind, Platform};

/// Fully resolved documents for one target, partitioned by kind.
///
/// Every collection is sorted deterministically: rules by priority then name,
/// personas and commands by name, hooks by event then name. Ties keep source
/// order, so two same-named documents from different sources stay in the order
/// their sources were given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedContent {
    pub target: Platform,
    pub project_name: String,
    pub project_root: PathBuf,
    pub rules: Vec<Document>,
    pub personas: Vec<Document>,
    pub commands: Vec<Document>,
    pub hooks: Vec<Document>,
}

impl ResolvedContent {
    /// An empty result for `target`.
    pub fn new(target: Platform, project_name: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            target,
            project_name: project_name.into(),
            project_root: project_root.into(),
            rules: Vec::new(),
            personas: Vec::new(),
            commands: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Partition `documents` by kind and sort each collection.
    #[must_use]
    pub fn with_documents(mut self, documents: impl IntoIterator<Item = Document>) -> Self {
        for document in documents {
            match document.kind() {
                DocumentKind::Rule => self.rules.push(document),
                DocumentKind::Persona => self.personas.push(document),
                DocumentKind::Command => self.commands.push(document),
                DocumentKind::Hook => self.hooks.push(document),
            }
        }
        self.sort();
        self
    }

    fn sort(&mut self) {
        self.rules.sort_by(|a, b| {
            let priority = |d: &Document| d.as_rule().map(|r| r.priority).unwrap_or_default();
            priority(a).cmp(&priority(b)).then_with(|| a.name.cmp(&b.name))
        });
        self.personas.sort_by(|a, b| a.name.cmp(&b.name));
        self.commands.sort_by(|a, b| a.name.cmp(&b.name));
        self.hooks.sort_by(|a, b| {
            let event = |d: &Document| d.as_hook().map(|h| h.event);
            event(a).cmp(&event(b)).then_with(|| a.name.cmp(&b.name))
        });
    }

    pub fn documents(&self, kind: DocumentKind) -> &[Document] {
        match kind {
            DocumentKind::Rule => &self.rules,
            DocumentKind::Persona => &self.personas,
            DocumentKind::Command => &self.commands,
            DocumentKind::Hook => &self.hooks,
        }
    }

    /// All documents, rules first, then personas, commands and hooks.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.rules.iter().chain(&self.personas).chain(&self.commands).chain(&self.hooks)
    }

    /// The first document of `kind` named `name`.
    pub fn find(&self, kind: DocumentKind, name: &str) -> Option<&Document> {
        self.documents(kind).iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len() + self.personas.len() + self.commands.len() + self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
