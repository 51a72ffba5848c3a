//! `@include` expansion.
//!
//! A body line of the form `@include <path>` (leading whitespace allowed, path
//! optionally quoted) is replaced by the body of the referenced file with its
//! metadata block stripped. Paths are relative to the including file and may not
//! leave the source root. Included text is scanned again, up to
//! [`MAX_INCLUDE_DEPTH`] levels. Directives inside fenced code blocks are left
//! alone.
//!
//! Expansion runs over an explicit stack of frames, one per file being spliced,
//! so the depth limit and cycle detection do not depend on the call stack.
//!
//! # Example
//!
//! ```rust
//! use rulesmith::include::IncludeResolver;
//! use rulesmith::source::SourceFiles;
//! use std::path::Path;
//!
//! let mut files = SourceFiles::new();
//! files.insert("shared/footer.md", "---\nname: footer\n---\nThanks!\n");
//!
//! let resolver = IncludeResolver::new(&files);
//! let body = resolver.resolve(Path::new("rules/a.md"), "Intro\n@include ../shared/footer.md\n").unwrap();
//! assert_eq!(body, "Intro\nThanks!\n");
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::{INCLUDE_DIRECTIVE, MAX_INCLUDE_DEPTH};
use crate::markdown::{Fence, FrontmatterError, FrontmatterParser};
use crate::source::SourceFiles;
use crate::utils::{normalize_within, to_slash};

/// Read access to the files an include may reference.
pub trait IncludeSource {
    /// Text of the file at `path`, relative to the source root.
    fn read(&self, path: &Path) -> Option<&str>;
}

impl IncludeSource for SourceFiles {
    fn read(&self, path: &Path) -> Option<&str> {
        self.get(path)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IncludeError {
    #[error("included file '{}' not found (referenced as '{directive}' from {}:{line})", to_slash(path), to_slash(from))]
    Missing {
        path: PathBuf,
        directive: String,
        from: PathBuf,
        line: usize,
    },

    #[error("include cycle: {}", format_chain(chain))]
    Cycle {
        chain: Vec<PathBuf>,
    },

    #[error("include depth exceeds {limit}: {}", format_chain(chain))]
    DepthExceeded {
        chain: Vec<PathBuf>,
        limit: usize,
    },

    #[error("include '{directive}' in {}:{line} points outside the source root", to_slash(from))]
    EscapesRoot {
        directive: String,
        from: PathBuf,
        line: usize,
    },

    #[error("'{INCLUDE_DIRECTIVE}' without a path in {}:{line}", to_slash(from))]
    EmptyDirective {
        from: PathBuf,
        line: usize,
    },

    #[error("included file '{}' has a malformed metadata block: {source}", to_slash(path))]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain.iter().map(|p| to_slash(p)).collect::<Vec<_>>().join(" -> ")
}

/// A file being spliced into the output.
struct Frame {
    path: PathBuf,
    text: String,
    offset: usize,
    line: usize,
    fence: Option<Fence>,
    /// Whether the directive that opened this frame ended with a newline.
    newline_after: bool,
}

impl Frame {
    fn new(path: PathBuf, text: String, newline_after: bool) -> Self {
        Self {
            path,
            text,
            offset: 0,
            line: 0,
            fence: None,
            newline_after,
        }
    }

    fn next_line(&mut self) -> Option<String> {
        if self.offset >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.offset..];
        let len = rest.find('\n').map_or(rest.len(), |idx| idx + 1);
        let line = rest[..len].to_string();
        self.offset += len;
        self.line += 1;
        Some(line)
    }
}

/// The path argument of an include directive line, if it is one.
fn parse_directive(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix(INCLUDE_DIRECTIVE)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let path = rest.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = path.strip_prefix(quote).and_then(|p| p.strip_suffix(quote)) {
            return Some(inner.trim());
        }
    }
    Some(path)
}

/// Expands `@include` directives against a set of source files.
pub struct IncludeResolver<'a, S: IncludeSource + ?Sized> {
    files: &'a S,
    parser: FrontmatterParser,
    max_depth: usize,
}

impl<'a, S: IncludeSource + ?Sized> IncludeResolver<'a, S> {
    pub fn new(files: &'a S) -> Self {
        Self {
            files,
            parser: FrontmatterParser::new(),
            max_depth: MAX_INCLUDE_DEPTH,
        }
    }

    /// Whether `body` contains anything that looks like a directive.
    pub fn has_directives(body: &str) -> bool {
        body.contains(INCLUDE_DIRECTIVE)
    }

    /// Expand every directive in `body`, which belongs to the document at
    /// `document_path` (relative to the source root).
    pub fn resolve(&self, document_path: &Path, body: &str) -> Result<String, IncludeError> {
        if !Self::has_directives(body) {
            return Ok(body.to_string());
        }

        let mut output = String::with_capacity(body.len());
        let mut stack = vec![Frame::new(document_path.to_path_buf(), body.to_string(), false)];

        while let Some(frame) = stack.last_mut() {
            let Some(line) = frame.next_line() else {
                let finished = stack.pop();
                if let Some(finished) = finished
                    && finished.newline_after
                    && !output.is_empty()
                    && !output.ends_with('\n')
                {
                    output.push('\n');
                }
                continue;
            };

            if let Some(fence) = frame.fence {
                if fence.is_closed_by(&line) {
                    frame.fence = None;
                }
                output.push_str(&line);
                continue;
            }
            if let Some(fence) = Fence::of(&line) {
                frame.fence = Some(fence);
                output.push_str(&line);
                continue;
            }

            let Some(directive) = parse_directive(&line) else {
                output.push_str(&line);
                continue;
            };

            let from = frame.path.clone();
            let line_number = frame.line;
            if directive.is_empty() {
                return Err(IncludeError::EmptyDirective {
                    from,
                    line: line_number,
                });
            }

            let base = from.parent().unwrap_or_else(|| Path::new(""));
            let Some(target) = normalize_within(&base.join(directive)) else {
                return Err(IncludeError::EscapesRoot {
                    directive: directive.to_string(),
                    from,
                    line: line_number,
                });
            };

            let chain = || {
                let mut chain: Vec<PathBuf> = stack.iter().map(|f| f.path.clone()).collect();
                chain.push(target.clone());
                chain
            };
            if stack.iter().any(|f| f.path == target) {
                return Err(IncludeError::Cycle {
                    chain: chain(),
                });
            }
            if stack.len() > self.max_depth {
                return Err(IncludeError::DepthExceeded {
                    chain: chain(),
                    limit: self.max_depth,
                });
            }

            let Some(text) = self.files.read(&target) else {
                return Err(IncludeError::Missing {
                    path: target,
                    directive: directive.to_string(),
                    from,
                    line: line_number,
                });
            };
            let fragment = self.parser.strip(text).map_err(|source| IncludeError::Frontmatter {
                path: target.clone(),
                source,
            })?;
            let fragment = fragment.trim_end_matches(['\n', '\r']).to_string();

            tracing::trace!("including {} into {}", to_slash(&target), to_slash(&from));
            let newline_after = line.ends_with('\n');
            stack.push(Frame::new(target, fragment, newline_after));
        }

        Ok(output)
    }
}
