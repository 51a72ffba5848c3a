//! Block tag scanner.
//!
//! Finds every `{{#expr}} ... {{/expr}}` pair in a body. Blocks do not nest:
//! while a block is open, any other tag is literal text, and only a closing tag
//! whose expression matches the opening one (ignoring whitespace) ends it.
//!
//! Tags inside fenced or inline code are never read, and neither are tags whose
//! head is not a platform expression, such as Handlebars `{{#each items}}`.

use std::ops::Range;

use super::TemplateError;
use super::expr::PlatformExpr;
use crate::markdown::code_ranges;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// One block with the byte ranges of its tags.
///
/// A tag that stands alone on its line has its range widened to the whole
/// line, newline included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub expr: PlatformExpr,
    pub open: Range<usize>,
    pub close: Range<usize>,
}

impl Block {
    /// The text between the two tags.
    pub fn content<'a>(&self, body: &'a str) -> &'a str {
        &body[self.open.end..self.close.start]
    }
}

/// A `{{...}}` occurrence.
struct Tag<'a> {
    inner: &'a str,
    span: Range<usize>,
}

/// The next tag at or after `from` that does not start inside `code`.
fn next_tag<'a>(body: &'a str, mut from: usize, code: &[Range<usize>]) -> Option<Tag<'a>> {
    loop {
        let start = from + body[from..].find(OPEN)?;
        if let Some(range) = code.iter().find(|r| r.contains(&start)) {
            from = range.end;
            continue;
        }
        let inner_start = start + OPEN.len();
        let inner_len = body[inner_start..].find(CLOSE)?;
        let end = inner_start + inner_len + CLOSE.len();
        return Some(Tag {
            inner: body[inner_start..inner_start + inner_len].trim(),
            span: start..end,
        });
    }
}

pub(crate) fn normalize(expr: &str) -> String {
    expr.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 1-based line and column of a byte offset.
pub(crate) fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}

/// Widen `span` to its full line when nothing else shares the line.
fn standalone(body: &str, span: Range<usize>) -> Range<usize> {
    let line_start = body[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = body[span.end..].find('\n').map_or(body.len(), |i| span.end + i);
    let alone = body[line_start..span.start].trim().is_empty()
        && body[span.end..line_end].trim().is_empty();
    if !alone {
        return span;
    }
    let end = if line_end < body.len() {
        line_end + 1
    } else {
        line_end
    };
    line_start..end
}

/// Scan `body` for blocks, in order of appearance.
pub fn parse_blocks(body: &str) -> Result<Vec<Block>, TemplateError> {
    let code = code_ranges(body);
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(tag) = next_tag(body, cursor, &code) {
        let head = tag.inner.strip_prefix(['#', '/']);
        if !head.is_some_and(PlatformExpr::is_platform_shaped) {
            cursor = tag.span.start + OPEN.len();
            continue;
        }

        if let Some(expr_text) = tag.inner.strip_prefix('#') {
            let expr = PlatformExpr::parse(expr_text).map_err(|e| {
                let (line, column) = line_column(body, tag.span.start);
                TemplateError::InvalidExpression {
                    expr: expr_text.trim().to_string(),
                    message: e.message,
                    line,
                    column,
                }
            })?;
            let wanted = normalize(expr_text);

            let mut search = tag.span.end;
            let close = loop {
                let Some(candidate) = next_tag(body, search, &code) else {
                    let (line, column) = line_column(body, tag.span.start);
                    return Err(TemplateError::Unclosed {
                        expr: expr_text.trim().to_string(),
                        line,
                        column,
                    });
                };
                if candidate.inner.strip_prefix('/').is_some_and(|c| normalize(c) == wanted) {
                    break candidate;
                }
                search = candidate.span.start + OPEN.len();
            };

            let open = standalone(body, tag.span);
            let close_span = standalone(body, close.span);
            cursor = close_span.end;
            blocks.push(Block {
                expr,
                open,
                close: close_span,
            });
        } else if let Some(expr_text) = tag.inner.strip_prefix('/') {
            let (line, column) = line_column(body, tag.span.start);
            return Err(TemplateError::StrayClose {
                expr: expr_text.trim().to_string(),
                line,
                column,
            });
        }
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_blocks() {
        let body = "a {{#claude}}X{{/claude}} b";
        let blocks = parse_blocks(body).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content(body), "X");
        assert_eq!(&body[blocks[0].open.clone()], "{{#claude}}");
    }

    #[test]
    fn test_standalone_tags_take_their_lines() {
        let body = "a\n  {{#cursor}}\nX\n{{/cursor}}\nb";
        let blocks = parse_blocks(body).unwrap();
        assert_eq!(&body[blocks[0].open.clone()], "  {{#cursor}}\n");
        assert_eq!(&body[blocks[0].close.clone()], "{{/cursor}}\n");
        assert_eq!(blocks[0].content(body), "X\n");
    }

    #[test]
    fn test_close_matches_ignoring_whitespace() {
        let body = "{{# claude | cursor }}X{{/claude|cursor}}";
        assert_eq!(parse_blocks(body).unwrap().len(), 1);
    }

    #[test]
    fn test_inner_tags_are_literal() {
        let body = "{{#claude}}a{{#cursor}}b{{/cursor}}c{{/claude}}";
        let blocks = parse_blocks(body).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content(body), "a{{#cursor}}b{{/cursor}}c");
    }

    #[test]
    fn test_errors_carry_positions() {
        let err = parse_blocks("line one\n  {{#claude}}never closed").unwrap_err();
        assert_eq!(err.position(), (2, 3));
        assert!(matches!(err, TemplateError::Unclosed { .. }));

        let err = parse_blocks("x {{/cursor}}").unwrap_err();
        assert!(matches!(err, TemplateError::StrayClose { .. }));
        assert_eq!(err.position(), (1, 3));

        let err = parse_blocks("{{#cursr}}x{{/cursr}}").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidExpression { .. }));
    }

    #[test]
    fn test_foreign_template_tags_are_literal() {
        let body = "Use {{#each items}}{{this}}{{/each}} or {{#if ok}}x{{else}}y{{/if}}.\n";
        assert!(parse_blocks(body).unwrap().is_empty());

        // A stray close is only an error when it names platforms.
        assert!(parse_blocks("done {{/each}}").unwrap().is_empty());
    }

    #[test]
    fn test_tags_in_code_are_literal() {
        let body = "`{{#claude}}` opens a block.\n```\n{{#cursor}}\n{{/claude}}\n```\n{{#claude}}X{{/claude}}\n";
        let blocks = parse_blocks(body).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content(body), "X");
    }

    #[test]
    fn test_other_tags_ignored() {
        assert!(parse_blocks("{{platform}} and {{ unknown }} and {{").unwrap().is_empty());
    }
}
