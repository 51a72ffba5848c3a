//! YAML frontmatter extraction.
//!
//! A document may start with a metadata block delimited by `---` lines:
//!
//! ```text
//! ---
//! name: rust-style
//! globs: ["**/*.rs"]
//! ---
//! Prefer `?` over `unwrap()`.
//! ```
//!
//! The split is done by hand rather than through a generic frontmatter crate so
//! that YAML errors can be reported in the coordinates of the original document
//! and an unclosed block is detected instead of being treated as body text.
//!
//! # Example
//!
//! ```rust
//! use rulesmith::markdown::frontmatter::FrontmatterParser;
//!
//! let parser = FrontmatterParser::new();
//! let parsed = parser.parse("---\nname: a\n---\nbody\n").unwrap();
//! assert!(parsed.has_frontmatter);
//! assert_eq!(parsed.body, "body\n");
//! assert_eq!(parsed.metadata["name"], serde_yaml::Value::from("a"));
//! ```

use thiserror::Error;

use crate::constants::FRONTMATTER_DELIMITER;
use crate::core::Metadata;

const BOM: char = '\u{feff}';

/// Failure to extract or parse a metadata block.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrontmatterError {
    /// The opening delimiter has no matching closing delimiter.
    #[error("metadata block opened on line {line} is never closed")]
    Unclosed {
        line: usize,
    },

    /// The block is not valid YAML.
    #[error("invalid YAML in metadata block: {message}")]
    Yaml {
        message: String,
        /// 1-based line in the original document.
        line: Option<usize>,
        /// 1-based column in the original document.
        column: Option<usize>,
    },

    /// The block parsed, but its top level is not a mapping.
    #[error("metadata block must be a mapping of keys to values, found {found}")]
    NotMapping {
        found: &'static str,
    },
}

impl FrontmatterError {
    /// Line and column of the failure in the original document, when known.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            FrontmatterError::Unclosed {
                line,
            } => Some((*line, 1)),
            FrontmatterError::Yaml {
                line: Some(line),
                column,
                ..
            } => Some((*line, column.unwrap_or(1))),
            FrontmatterError::Yaml {
                ..
            } => None,
            FrontmatterError::NotMapping {
                ..
            } => Some((2, 1)),
        }
    }
}

/// The raw pieces of a document, borrowed from the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// The text between the delimiters, if the document has a metadata block.
    pub frontmatter: Option<&'a str>,
    /// Everything after the closing delimiter, with leading blank lines removed.
    pub body: &'a str,
}

/// A document with its metadata block parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrontmatter<'a> {
    pub metadata: Metadata,
    pub body: &'a str,
    pub has_frontmatter: bool,
}

/// Splits documents into metadata and body and parses the metadata as YAML.
///
/// Stateless; construct one per run and pass it where needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterParser;

impl FrontmatterParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Separate the metadata block from the body without parsing it.
    ///
    /// Text that does not start with a `---` line (after an optional BOM) is all
    /// body. Both `\n` and `\r\n` line endings are handled.
    pub fn split<'a>(&self, text: &'a str) -> Result<Split<'a>, FrontmatterError> {
        let text = text.strip_prefix(BOM).unwrap_or(text);

        let (first_line, rest) = match text.find('\n') {
            Some(idx) => (&text[..idx], &text[idx + 1..]),
            None => (text, ""),
        };
        if first_line.trim_end() != FRONTMATTER_DELIMITER {
            return Ok(Split {
                frontmatter: None,
                body: text,
            });
        }

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end() == FRONTMATTER_DELIMITER {
                let frontmatter = &rest[..offset];
                let body = &rest[offset + line.len()..];
                return Ok(Split {
                    frontmatter: Some(frontmatter),
                    body: strip_leading_blank_lines(body),
                });
            }
            offset += line.len();
        }

        Err(FrontmatterError::Unclosed {
            line: 1,
        })
    }

    /// Split and parse the metadata block into a [`Metadata`] record.
    ///
    /// An empty block yields an empty record. A top level that is not a mapping
    /// is an error.
    pub fn parse<'a>(&self, text: &'a str) -> Result<ParsedFrontmatter<'a>, FrontmatterError> {
        let split = self.split(text)?;
        let Some(frontmatter) = split.frontmatter else {
            return Ok(ParsedFrontmatter {
                metadata: Metadata::new(),
                body: split.body,
                has_frontmatter: false,
            });
        };

        let metadata = parse_yaml(frontmatter)?;
        Ok(ParsedFrontmatter {
            metadata,
            body: split.body,
            has_frontmatter: true,
        })
    }

    /// The body of `text` with any metadata block removed.
    pub fn strip<'a>(&self, text: &'a str) -> Result<&'a str, FrontmatterError> {
        Ok(self.split(text)?.body)
    }
}

fn parse_yaml(frontmatter: &str) -> Result<Metadata, FrontmatterError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(frontmatter).map_err(|e| yaml_error(&e))?;

    match value {
        serde_yaml::Value::Null => Ok(Metadata::new()),
        serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value).map_err(|e| yaml_error(&e)),
        serde_yaml::Value::Sequence(_) => Err(FrontmatterError::NotMapping {
            found: "a list",
        }),
        serde_yaml::Value::Tagged(_) => Err(FrontmatterError::NotMapping {
            found: "a tagged value",
        }),
        _ => Err(FrontmatterError::NotMapping {
            found: "a scalar",
        }),
    }
}

/// Convert a YAML error, shifting its position past the opening delimiter.
fn yaml_error(error: &serde_yaml::Error) -> FrontmatterError {
    let message = error.to_string();
    match error.location() {
        Some(location) => {
            let suffix = format!(" at line {} column {}", location.line(), location.column());
            let message = message.strip_suffix(&suffix).unwrap_or(&message).to_string();
            FrontmatterError::Yaml {
                message,
                line: Some(location.line() + 1),
                column: Some(location.column()),
            }
        }
        None => FrontmatterError::Yaml {
            message,
            line: None,
            column: None,
        },
    }
}

fn strip_leading_blank_lines(mut text: &str) -> &str {
    loop {
        if let Some(rest) = text.strip_prefix("\r\n") {
            text = rest;
        } else if let Some(rest) = text.strip_prefix('\n') {
            text = rest;
        } else {
            return text;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frontmatter_is_all_body() {
        let parser = FrontmatterParser::new();
        let parsed = parser.parse("# Title\n\nText\n").unwrap();
        assert!(!parsed.has_frontmatter);
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, "# Title\n\nText\n");
    }

    #[test]
    fn test_crlf_and_bom() {
        let parser = FrontmatterParser::new();
        let parsed = parser.parse("\u{feff}---\r\nname: x\r\n---\r\n\r\nbody\r\n").unwrap();
        assert!(parsed.has_frontmatter);
        assert_eq!(parsed.metadata["name"], serde_yaml::Value::from("x"));
        assert_eq!(parsed.body, "body\r\n");
    }

    #[test]
    fn test_empty_block_is_empty_mapping() {
        let parser = FrontmatterParser::new();
        let parsed = parser.parse("---\n---\nbody").unwrap();
        assert!(parsed.has_frontmatter);
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn test_unclosed_block() {
        let parser = FrontmatterParser::new();
        let err = parser.parse("---\nname: x\nbody without end\n").unwrap_err();
        assert_eq!(
            err,
            FrontmatterError::Unclosed {
                line: 1
            }
        );
    }

    #[test]
    fn test_yaml_error_position_is_in_document_coordinates() {
        let parser = FrontmatterParser::new();
        let err = parser.parse("---\nname: ok\ntools: [read\n---\nbody").unwrap_err();
        let (line, _column) = err.position().unwrap();
        // Block line 2 or later, shifted past the opening delimiter.
        assert!(line >= 3, "line was {line}");
        assert!(matches!(err, FrontmatterError::Yaml { .. }));
    }

    #[test]
    fn test_list_top_level_is_rejected() {
        let parser = FrontmatterParser::new();
        let err = parser.parse("---\n- a\n- b\n---\n").unwrap_err();
        assert_eq!(
            err,
            FrontmatterError::NotMapping {
                found: "a list"
            }
        );
    }

    #[test]
    fn test_delimiter_must_be_first_line() {
        let parser = FrontmatterParser::new();
        let split = parser.split("intro\n---\nname: x\n---\n").unwrap();
        assert!(split.frontmatter.is_none());
    }

    #[test]
    fn test_strip() {
        let parser = FrontmatterParser::new();
        assert_eq!(parser.strip("---\na: 1\n---\n\nFragment\n").unwrap(), "Fragment\n");
        assert_eq!(parser.strip("Plain").unwrap(), "Plain");
    }
}
