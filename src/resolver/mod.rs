//! Resolution orchestration: from loaded sources to per-target content.
//!
//! The resolver takes the raw documents of every loaded source and produces,
//! for one target platform, a [`ResolvedContent`] value plus every diagnostic
//! raised on the way. Problems are scoped to documents: the offending document
//! is excluded (or degraded, for a missing inheritance parent) and the rest
//! proceed.
//!
//! # Pipeline
//!
//! Target independent, run once by [`Resolver::prepare`]:
//!
//! 1. **Parse** every raw document, sources flattened in order. Documents with
//!    the same name in several sources are all kept.
//! 2. **Conditions**: drop documents whose `when:` is false or fails to
//!    evaluate.
//! 3. **Includes**: expand `@include` directives against the document's own
//!    file and source.
//! 4. **Inheritance**: resolve persona `extends` chains. Bodies are already
//!    expanded, so a parent's includes never resolve against its child.
//!
//! Per target, run by [`Resolver::resolve_for`]:
//!
//! 5. **Targets**: keep documents whose `targets` contain the platform.
//! 6. **Templates**: prune platform blocks and substitute variables.
//! 7. **Partition** into [`ResolvedContent`], sorted.
//!
//! Two checks run on the final content: rules whose `requires` names a rule
//! absent for the target, and same-kind documents sharing a name (their output
//! paths collide). Both are warnings.
//!
//! # Example
//!
//! ```rust
//! use rulesmith::condition::StaticFacts;
//! use rulesmith::core::{DocumentKind, Platform};
//! use rulesmith::resolver::{ResolveOptions, resolve};
//! use rulesmith::source::{MultiSourceLoadResult, SourceLoadResult};
//!
//! let source = SourceLoadResult::in_memory("local").with_document(
//!     DocumentKind::Rule,
//!     "rules/react.md",
//!     "---\nname: react\nwhen: npm:react\n---\nPrefer function components.",
//! );
//! let sources = MultiSourceLoadResult::from(vec![source]);
//! let facts = StaticFacts::new().with_present("npm", "react");
//!
//! let resolution = resolve(&sources, Platform::Claude, &facts, &ResolveOptions::default());
//! assert_eq!(resolution.content.rules.len(), 1);
//! assert!(resolution.diagnostics.is_empty());
//! ```

pub mod content;

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::condition::{Condition, FactContext};
use crate::core::{Diagnostic, Diagnostics, Document, DocumentKind, ErrorCategory, Platform};
use crate::include::IncludeResolver;
use crate::inheritance::resolve_inheritance;
use crate::metadata::{ParseOptions, parse_document};
use crate::source::{MultiSourceLoadResult, SourceFiles};
use crate::template::{TemplateContext, render};
use crate::utils::to_slash;

pub use content::ResolvedContent;

/// Options for one resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub parse: ParseOptions,
    /// Recorded on the result; warnings fail the run when set.
    pub strict: bool,
    /// Value of `{{project.name}}`.
    pub project_name: String,
    /// Value of `{{project.root}}`.
    pub project_root: PathBuf,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            strict: false,
            project_name: String::new(),
            project_root: PathBuf::from("."),
        }
    }
}

/// The outcome of resolving for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub content: ResolvedContent,
    pub diagnostics: Diagnostics,
    /// Every successfully parsed document, before any resolution stage.
    pub parsed: Vec<Document>,
    pub strict: bool,
}

impl Resolution {
    /// Whether the caller should treat this run as failed.
    pub fn is_failure(&self) -> bool {
        self.diagnostics.is_failure(self.strict)
    }
}

/// Output of the target-independent stages.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDocuments {
    /// Parsed documents, before conditions, includes and inheritance.
    pub parsed: Vec<Document>,
    /// Documents that survived every target-independent stage.
    pub documents: Vec<Document>,
    pub diagnostics: Diagnostics,
}

/// Resolves a set of loaded sources, possibly for several targets.
pub struct Resolver<'a> {
    sources: &'a MultiSourceLoadResult,
    options: ResolveOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(sources: &'a MultiSourceLoadResult, options: ResolveOptions) -> Self {
        Self {
            sources,
            options,
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Run the target-independent stages.
    pub fn prepare(&self, facts: &dyn FactContext) -> PreparedDocuments {
        let mut diagnostics: Diagnostics = self.sources.errors().cloned().collect();

        let parsed = self.parse_all(&mut diagnostics);
        let active = filter_conditions(&parsed, facts, &mut diagnostics);

        let expanded = self.expand_includes(active, &mut diagnostics);

        let (documents, inheritance_diagnostics) = resolve_inheritance(&expanded);
        diagnostics.append(inheritance_diagnostics);

        debug!(
            "Prepared {} of {} parsed document(s) ({} diagnostic(s))",
            documents.len(),
            parsed.len(),
            diagnostics.len()
        );

        PreparedDocuments {
            parsed,
            documents,
            diagnostics,
        }
    }

    /// Run the per-target stages over prepared documents.
    pub fn resolve_for(&self, prepared: &PreparedDocuments, target: Platform) -> Resolution {
        let mut diagnostics = prepared.diagnostics.clone();
        let root = to_slash(&self.options.project_root);
        let context = TemplateContext::new(target, &self.options.project_name, &root);

        let mut documents = Vec::new();
        for document in prepared.documents.iter().filter(|d| d.is_eligible_for(target)) {
            match render(&document.body, &context) {
                Ok(body) => documents.push(document.with_body(body)),
                Err(e) => {
                    let (line, column) = e.position();
                    diagnostics.push(
                        Diagnostic::error(ErrorCategory::Template, format!("{} (target {target})", e))
                            .with_provenance(&document.provenance)
                            .at(line, column),
                    );
                }
            }
        }

        let content = ResolvedContent::new(target, &self.options.project_name, &self.options.project_root)
            .with_documents(documents);
        check_requires(&content, &mut diagnostics);
        check_duplicates(&content, &mut diagnostics);

        info!(
            "Resolved {} document(s) for {target}: {} rule(s), {} persona(s), {} command(s), {} hook(s)",
            content.len(),
            content.rules.len(),
            content.personas.len(),
            content.commands.len(),
            content.hooks.len()
        );

        Resolution {
            content,
            diagnostics,
            parsed: prepared.parsed.clone(),
            strict: self.options.strict,
        }
    }

    /// Prepare once and resolve for each target, in the order given.
    pub fn resolve_all(&self, facts: &dyn FactContext, targets: &[Platform]) -> Vec<Resolution> {
        let prepared = self.prepare(facts);
        targets.iter().map(|&target| self.resolve_for(&prepared, target)).collect()
    }

    fn parse_all(&self, diagnostics: &mut Diagnostics) -> Vec<Document> {
        let mut documents = Vec::with_capacity(self.sources.document_count());
        for raw in self.sources.iter().flat_map(|s| s.documents.iter()) {
            match parse_document(raw, &self.options.parse) {
                Ok(parsed) => {
                    diagnostics.extend(parsed.warnings);
                    documents.push(parsed.document);
                }
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }
        documents
    }

    fn expand_includes(&self, documents: Vec<Document>, diagnostics: &mut Diagnostics) -> Vec<Document> {
        let mut files_by_source: HashMap<&str, &SourceFiles> = HashMap::new();
        for source in self.sources.iter() {
            files_by_source.entry(source.source.name.as_str()).or_insert(&source.files);
        }
        let empty = SourceFiles::new();

        let mut expanded = Vec::with_capacity(documents.len());
        for document in documents {
            if !IncludeResolver::<SourceFiles>::has_directives(&document.body) {
                expanded.push(document);
                continue;
            }
            let files = files_by_source.get(document.provenance.source.as_str()).copied().unwrap_or(&empty);
            match IncludeResolver::new(files).resolve(&document.provenance.path, &document.body) {
                Ok(body) => expanded.push(document.with_body(body)),
                Err(e) => diagnostics.push(
                    Diagnostic::error(ErrorCategory::Resolution, e.to_string())
                        .with_provenance(&document.provenance),
                ),
            }
        }
        expanded
    }
}

/// Resolve `sources` for a single target.
pub fn resolve(
    sources: &MultiSourceLoadResult,
    target: Platform,
    facts: &dyn FactContext,
    options: &ResolveOptions,
) -> Resolution {
    let resolver = Resolver::new(sources, options.clone());
    let prepared = resolver.prepare(facts);
    resolver.resolve_for(&prepared, target)
}

/// Keep documents whose condition holds. Failures exclude the document.
fn filter_conditions(
    documents: &[Document],
    facts: &dyn FactContext,
    diagnostics: &mut Diagnostics,
) -> Vec<Document> {
    let mut active = Vec::with_capacity(documents.len());
    for document in documents {
        let Some(source) = document.condition.as_deref() else {
            active.push(document.clone());
            continue;
        };
        match Condition::parse(source).and_then(|condition| condition.evaluate(facts)) {
            Ok(true) => active.push(document.clone()),
            Ok(false) => debug!("Excluding {}: condition '{source}' is false", document.label()),
            Err(e) => diagnostics.push(
                Diagnostic::error(ErrorCategory::Condition, format!("condition '{source}': {e}"))
                    .with_provenance(&document.provenance),
            ),
        }
    }
    active
}

fn check_requires(content: &ResolvedContent, diagnostics: &mut Diagnostics) {
    let available: BTreeSet<&str> = content.rules.iter().map(|r| r.name.as_str()).collect();
    for rule in &content.rules {
        let Some(spec) = rule.as_rule() else {
            continue;
        };
        for required in spec.requires.iter().filter(|name| !available.contains(name.as_str())) {
            diagnostics.push(
                Diagnostic::warning(
                    ErrorCategory::Validation,
                    format!(
                        "rule '{}' requires rule '{required}', which is not available for {}",
                        rule.name, content.target
                    ),
                )
                .with_provenance(&rule.provenance),
            );
        }
    }
}

fn check_duplicates(content: &ResolvedContent, diagnostics: &mut Diagnostics) {
    for kind in DocumentKind::ALL {
        let mut first: HashMap<&str, &Document> = HashMap::new();
        for document in content.documents(kind) {
            match first.get(document.name.as_str()) {
                Some(original) => diagnostics.push(
                    Diagnostic::warning(
                        ErrorCategory::Validation,
                        format!(
                            "duplicate {kind} '{}' for {}; also defined in {}",
                            document.name, content.target, original.provenance
                        ),
                    )
                    .with_provenance(&document.provenance),
                ),
                None => {
                    first.insert(&document.name, document);
                }
            }
        }
    }
}
