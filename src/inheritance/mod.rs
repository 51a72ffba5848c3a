//! Persona inheritance (`extends:`).
//!
//! A persona may name a parent persona with `extends`. Resolution walks the
//! chain root→…→self over an explicit [`InheritanceGraph`], shallow-merges the
//! raw metadata records left to right, concatenates the bodies and re-derives
//! the typed document from the merged record.
//!
//! Problems are scoped to the persona:
//! - a cycle is an error for every persona that reaches it; those personas are
//!   dropped
//! - a chain longer than [`MAX_INHERITANCE_DEPTH`] links is an error; the
//!   persona is dropped
//! - a missing parent is a warning; the persona keeps its own fields
//!
//! Inheritance does not depend on the target platform, so it runs once per
//! resolution pass.
//!
//! [`MAX_INHERITANCE_DEPTH`]: crate::constants::MAX_INHERITANCE_DEPTH

pub mod graph;
pub mod merge;

use thiserror::Error;
use tracing::debug;

use crate::core::{Diagnostic, Diagnostics, Document, DocumentKind, ErrorCategory};
use crate::metadata::build_document;

pub use graph::InheritanceGraph;
pub use merge::{merge_bodies, merge_metadata};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InheritanceError {
    #[error("persona '{persona}' is part of an inheritance cycle: {}", cycle.join(" -> "))]
    Cycle {
        persona: String,
        cycle: Vec<String>,
    },

    #[error("persona '{persona}' exceeds the maximum inheritance depth of {limit} ({links} links)")]
    DepthExceeded {
        persona: String,
        limit: usize,
        links: usize,
    },

    #[error("persona '{persona}' extends '{parent}', which was not found; inheritance skipped")]
    MissingParent {
        persona: String,
        parent: String,
    },

    #[error("persona '{persona}' is invalid after inheritance: {message}")]
    Merge {
        persona: String,
        message: String,
    },
}

/// Resolve inheritance across `documents`.
///
/// Returns the documents in input order with personas replaced by their
/// resolved form and failed personas removed. Other kinds pass through.
pub fn resolve_inheritance(documents: &[Document]) -> (Vec<Document>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();

    let persona_positions: Vec<usize> = documents
        .iter()
        .enumerate()
        .filter(|(_, doc)| doc.kind() == DocumentKind::Persona)
        .map(|(position, _)| position)
        .collect();
    let graph = InheritanceGraph::build(persona_positions.iter().map(|&p| &documents[p]).collect());

    for (index, parent) in graph.missing_parents() {
        let persona = graph.persona(*index);
        let error = InheritanceError::MissingParent {
            persona: persona.name.clone(),
            parent: parent.clone(),
        };
        diagnostics.push(
            Diagnostic::warning(ErrorCategory::Resolution, error.to_string())
                .with_provenance(&persona.provenance),
        );
    }

    let mut resolved: Vec<Option<Document>> = documents.iter().cloned().map(Some).collect();
    for (index, &position) in persona_positions.iter().enumerate() {
        let persona = graph.persona(index);
        if persona.as_persona().and_then(|spec| spec.extends.as_ref()).is_none() {
            continue;
        }

        match resolve_persona(&graph, index) {
            Ok(Some(document)) => resolved[position] = Some(document),
            Ok(None) => {}
            Err(error) => {
                diagnostics.push(
                    Diagnostic::error(ErrorCategory::Resolution, error.to_string())
                        .with_provenance(&persona.provenance),
                );
                resolved[position] = None;
            }
        }
    }

    (resolved.into_iter().flatten().collect(), diagnostics)
}

/// Fold one persona's chain. `Ok(None)` means there is nothing to inherit.
fn resolve_persona(graph: &InheritanceGraph<'_>, index: usize) -> Result<Option<Document>, InheritanceError> {
    let chain = graph.chain(index)?;
    if chain.len() < 2 {
        return Ok(None);
    }

    let persona = graph.persona(index);
    let mut members = chain.iter().map(|&i| graph.persona(i));
    let Some(root) = members.next() else {
        return Ok(None);
    };
    let metadata = members.fold(root.metadata.clone(), |merged, member| {
        merge_metadata(&merged, &member.metadata)
    });
    let body = merge_bodies(chain.iter().map(|&i| graph.persona(i).body.as_str()));

    debug!(
        "Resolved inheritance for persona '{}' through {} ancestor(s)",
        persona.name,
        chain.len() - 1
    );

    build_document(DocumentKind::Persona, metadata, body, persona.provenance.clone())
        .map(Some)
        .map_err(|e| InheritanceError::Merge {
            persona: persona.name.clone(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Metadata, Provenance, Severity};

    fn doc(kind: DocumentKind, yaml: &str, body: &str) -> Document {
        let metadata: Metadata = serde_yaml::from_str(yaml).unwrap();
        let name = metadata["name"].as_str().unwrap().to_string();
        build_document(kind, metadata, body.to_string(), Provenance::new("local", format!("{name}.md")))
            .unwrap()
    }

    fn persona(yaml: &str, body: &str) -> Document {
        doc(DocumentKind::Persona, yaml, body)
    }

    #[test]
    fn test_child_overrides_tools_and_inherits_model() {
        let docs = vec![
            persona("name: base\ntools: [read]\nmodel: opus", "Base text."),
            persona("name: child\nextends: base\ntools: [write]", "Child text."),
        ];
        let (resolved, diagnostics) = resolve_inheritance(&docs);
        assert!(diagnostics.is_empty());

        let child = resolved.iter().find(|d| d.name == "child").unwrap();
        let spec = child.as_persona().unwrap();
        assert_eq!(spec.tools, vec!["write"]);
        assert_eq!(spec.model.as_deref(), Some("opus"));
        assert_eq!(child.body, "Base text.\n\n---\n\nChild text.");

        // Originals are untouched.
        assert_eq!(docs[1].body, "Child text.");
        assert_eq!(docs[1].as_persona().unwrap().model, None);
    }

    #[test]
    fn test_cycle_reports_every_member() {
        let docs = vec![
            persona("name: a\nextends: b", ""),
            persona("name: b\nextends: a", ""),
            persona("name: standalone", ""),
        ];
        let (resolved, diagnostics) = resolve_inheritance(&docs);

        let names: Vec<_> = resolved.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["standalone"]);
        assert_eq!(diagnostics.error_count(), 2);
        assert!(diagnostics.iter().all(|d| d.message.contains("inheritance cycle")));
    }

    #[test]
    fn test_missing_parent_is_warning() {
        let docs = vec![persona("name: orphan\nextends: ghost\nmodel: haiku", "Own.")];
        let (resolved, diagnostics) = resolve_inheritance(&docs);

        assert_eq!(resolved, docs);
        assert_eq!(diagnostics.len(), 1);
        let warning = diagnostics.iter().next().unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert!(warning.message.contains("'ghost'"));
    }

    fn linear_chain(links: usize) -> Vec<Document> {
        let mut docs = vec![persona("name: p0\nmodel: sonnet", "p0")];
        for i in 1..=links {
            docs.push(persona(&format!("name: p{i}\nextends: p{}", i - 1), &format!("p{i}")));
        }
        docs
    }

    #[test]
    fn test_ten_links_resolve() {
        let docs = linear_chain(10);
        let (resolved, diagnostics) = resolve_inheritance(&docs);
        assert!(!diagnostics.has_errors());
        let leaf = resolved.iter().find(|d| d.name == "p10").unwrap();
        assert_eq!(leaf.as_persona().unwrap().model.as_deref(), Some("sonnet"));
        assert!(leaf.body.starts_with("p0\n\n---\n\np1"));
    }

    #[test]
    fn test_eleven_links_rejected() {
        let docs = linear_chain(11);
        let (resolved, diagnostics) = resolve_inheritance(&docs);
        assert!(resolved.iter().all(|d| d.name != "p11"));
        assert!(resolved.iter().any(|d| d.name == "p10"));
        let errors: Vec<_> = diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("maximum inheritance depth of 10"));
    }

    #[test]
    fn test_other_kinds_pass_through() {
        let docs = vec![
            doc(DocumentKind::Rule, "name: base\nextends: nothing", "Rule."),
            persona("name: p", "Persona."),
        ];
        let (resolved, diagnostics) = resolve_inheritance(&docs);
        assert_eq!(resolved, docs);
        assert!(diagnostics.is_empty());
    }
}
