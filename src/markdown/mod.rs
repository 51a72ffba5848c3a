//! Markdown document handling.
//!
//! Source documents are Markdown files with an optional YAML metadata block
//! ([`frontmatter`]). Generated artifacts are written back in the same shape by
//! [`render_with_frontmatter`]. [`code`] locates fenced and inline code, whose
//! text is never interpreted.

pub mod code;
pub mod frontmatter;

use std::path::Path;

pub use code::{Fence, code_ranges};
pub use frontmatter::{FrontmatterError, FrontmatterParser, ParsedFrontmatter, Split};

/// Whether a path has a document extension (`.md`, `.mdc`, `.markdown`).
#[must_use]
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| {
        ext.eq_ignore_ascii_case("md")
            || ext.eq_ignore_ascii_case("mdc")
            || ext.eq_ignore_ascii_case("markdown")
    })
}

/// Assemble a Markdown document from already-serialized YAML and a body.
///
/// `yaml` is expected to end with a newline, as `serde_yaml::to_string` produces.
/// An empty `yaml` yields the body alone.
#[must_use]
pub fn render_with_frontmatter(yaml: &str, body: &str) -> String {
    let body = body.trim_end_matches(['\n', '\r']);
    if yaml.trim().is_empty() {
        return format!("{body}\n");
    }
    if body.is_empty() {
        return format!("---\n{yaml}---\n");
    }
    format!("---\n{yaml}---\n\n{body}\n")
}
