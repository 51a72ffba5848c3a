//! rulesmith - guidance documents for coding assistants, compiled per platform
//!
//! rulesmith turns one set of Markdown documents (rules, personas, commands and
//! hooks, each with a YAML metadata block) into the native configuration files
//! of several coding assistants. Documents are written once; conditions,
//! inheritance, includes and platform blocks decide what each platform sees.
//!
//! # Architecture Overview
//!
//! The engine is a pipeline of pure stages. Loading and writing live at the
//! edges, in the CLI and the loader; everything in between is synchronous and
//! deterministic: the same inputs give byte-identical artifacts.
//!
//! ```text
//! sources ─▶ parse ─▶ conditions ─▶ inheritance ─▶ includes
//!                                                     │
//!            artifacts ◀─ generate ◀─ templates ◀─ target filter   (per target)
//! ```
//!
//! Problems found along the way are [`core::Diagnostic`]s scoped to one
//! document. The offending document is dropped and the run continues; the
//! caller decides whether the diagnostics fail the run.
//!
//! # Modules
//!
//! ## Engine
//! - [`source`] - loaded documents and include files per source, plus the local directory loader
//! - [`markdown`] - metadata block splitting and rendering
//! - [`metadata`] - validation of metadata into typed [`core::Document`]s
//! - [`condition`] - the `when:` expression language
//! - [`inheritance`] - persona `extends` chains
//! - [`include`] - `@include` expansion
//! - [`template`] - platform blocks and variable substitution
//! - [`resolver`] - orchestration of the stages into [`resolver::ResolvedContent`]
//! - [`targets`] - Claude Code, Cursor and OpenCode generators
//!
//! ## Around the engine
//! - [`facts`] - project inspection answering condition facts
//! - [`config`] - the `rulesmith.toml` project configuration
//! - [`cli`] - the `rulesmith` command
//! - [`core`] - documents, platforms, diagnostics and errors
//! - [`utils`] - file system helpers, checksums and suggestions
//!
//! # Document Format
//!
//! ```markdown
//! ---
//! name: react-components
//! description: Conventions for React components
//! globs: ["src/**/*.tsx"]
//! when: npm:react && !npm:preact
//! targets: [claude, cursor]
//! ---
//! Prefer function components.
//!
//! {{#claude}}Run `npm test` after editing components.{{/claude}}
//!
//! @include shared/testing.md
//! ```
//!
//! # Example
//!
//! ```rust
//! use rulesmith::condition::StaticFacts;
//! use rulesmith::core::{DocumentKind, Platform};
//! use rulesmith::resolver::{ResolveOptions, resolve};
//! use rulesmith::source::{MultiSourceLoadResult, SourceLoadResult};
//! use rulesmith::targets::generate;
//!
//! let source = SourceLoadResult::in_memory("local").with_document(
//!     DocumentKind::Rule,
//!     "rules/style.md",
//!     "---\nname: style\nalwaysApply: true\n---\nKeep functions short.",
//! );
//! let sources = MultiSourceLoadResult::from(vec![source]);
//!
//! let resolution = resolve(&sources, Platform::Cursor, &StaticFacts::new(), &ResolveOptions::default());
//! let output = generate(&resolution.content);
//! assert!(output.artifacts.contains(std::path::Path::new(".cursor/rules/style.mdc")));
//! ```

pub mod cli;
pub mod condition;
pub mod config;
pub mod constants;
pub mod core;
pub mod facts;
pub mod include;
pub mod inheritance;
pub mod markdown;
pub mod metadata;
pub mod resolver;
pub mod source;
pub mod targets;
pub mod template;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
