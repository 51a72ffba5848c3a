//! Core types shared by every stage of the pipeline.
//!
//! - [`document`] - the typed [`Document`] model and its kind-specific metadata
//! - [`platform`] - target [`Platform`] identifiers and [`PlatformSet`]
//! - [`diagnostics`] - document-scoped [`Diagnostic`] accumulation
//! - [`error`] - tool-level [`RulesmithError`] and user-facing [`ErrorContext`]

pub mod diagnostics;
pub mod document;
pub mod error;
pub mod platform;

pub use diagnostics::{Diagnostic, Diagnostics, ErrorCategory, Severity};
pub use document::{
    CommandArg, CommandSpec, Document, DocumentKind, DocumentSpec, HookEvent, HookSpec, Metadata,
    PersonaSpec, PlatformOverrides, Priority, Provenance, RuleSpec,
};
pub use error::{ErrorContext, RulesmithError, user_friendly_error};
pub use platform::{Platform, PlatformSet};
