//! Global constants used throughout the rulesmith codebase.
//!
//! Limits, delimiters and well-known file names live here so the resolution
//! stages and the generators agree on them without importing each other.

/// Maximum number of `extends` links between a persona and its root ancestor.
///
/// A persona with exactly this many ancestors resolves; one more link is
/// rejected with a depth error.
pub const MAX_INHERITANCE_DEPTH: usize = 10;

/// Maximum nesting level of `@include` directives below a document body.
pub const MAX_INCLUDE_DEPTH: usize = 10;

/// Maximum nesting of parentheses and `!` in a `when:` expression.
pub const MAX_CONDITION_DEPTH: usize = 128;

/// Maximum number of tokens in a `when:` expression. Also bounds the depth of
/// `&&` and `||` chains, which nest one level per operator.
pub const MAX_CONDITION_TOKENS: usize = 1024;

/// Line that opens and closes a metadata block.
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Directive keyword recognised at the start of a body line.
pub const INCLUDE_DIRECTIVE: &str = "@include";

/// Separator placed between inherited persona bodies (parent text first).
pub const INHERITANCE_BODY_SEPARATOR: &str = "\n\n---\n\n";

/// Project configuration file searched for in the working directory and its parents.
pub const CONFIG_FILE_NAME: &str = "rulesmith.toml";

/// Source directory used when the configuration declares no sources.
pub const DEFAULT_SOURCE_DIR: &str = ".rulesmith";

/// Marker written at the top of generated index documents.
pub const GENERATED_MARKER: &str =
    "<!-- Generated by rulesmith. Edit the sources and rebuild instead of editing this file. -->";

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV_VAR: &str = "RULESMITH_LOG";

/// Environment variable that forces strict mode when set to `1` or `true`.
pub const STRICT_ENV_VAR: &str = "RULESMITH_STRICT";
