//! Platform-conditional body text.
//!
//! A body may wrap platform-specific text in blocks:
//!
//! ```text
//! Shared guidance.
//! {{#claude}}
//! Use the Task tool for long searches.
//! {{/claude}}
//! {{#cursor|opencode}}
//! Ask before running shell commands.
//! {{/cursor|opencode}}
//! ```
//!
//! For a given target, blocks whose expression matches keep their content and
//! lose their tags; the rest disappear entirely. A tag alone on its line takes
//! the line with it. After pruning, the variables `{{platform}}`,
//! `{{project.name}}` and `{{project.root}}` are substituted; any other
//! `{{...}}` text is left as is. Block tags inside code, and tags of other
//! template languages such as `{{#each items}}`, are body text.

pub mod expr;
pub mod parser;

use thiserror::Error;

use crate::core::Platform;

pub use expr::PlatformExpr;
pub use parser::{Block, parse_blocks};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("invalid block expression '{expr}' at line {line}, column {column}: {message}")]
    InvalidExpression {
        expr: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("unclosed block '{{{{#{expr}}}}}' at line {line}, column {column}")]
    Unclosed {
        expr: String,
        line: usize,
        column: usize,
    },

    #[error("closing tag '{{{{/{expr}}}}}' at line {line}, column {column} has no opening tag")]
    StrayClose {
        expr: String,
        line: usize,
        column: usize,
    },
}

impl TemplateError {
    /// 1-based line and column of the offending tag.
    pub fn position(&self) -> (usize, usize) {
        match self {
            TemplateError::InvalidExpression {
                line,
                column,
                ..
            }
            | TemplateError::Unclosed {
                line,
                column,
                ..
            }
            | TemplateError::StrayClose {
                line,
                column,
                ..
            } => (*line, *column),
        }
    }
}

/// Values available to `{{...}}` variables.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub platform: Platform,
    pub project_name: &'a str,
    pub project_root: &'a str,
}

impl<'a> TemplateContext<'a> {
    pub fn new(platform: Platform, project_name: &'a str, project_root: &'a str) -> Self {
        Self {
            platform,
            project_name,
            project_root,
        }
    }

    fn lookup(&self, variable: &str) -> Option<&str> {
        match variable {
            "platform" => Some(self.platform.id()),
            "project.name" => Some(self.project_name),
            "project.root" => Some(self.project_root),
            _ => None,
        }
    }
}

/// Prune blocks for `context.platform`, then substitute variables.
pub fn render(body: &str, context: &TemplateContext<'_>) -> Result<String, TemplateError> {
    let pruned = prune_blocks(body, context.platform)?;
    Ok(substitute_variables(&pruned, context))
}

/// Keep or drop every block for `platform`.
pub fn prune_blocks(body: &str, platform: Platform) -> Result<String, TemplateError> {
    let blocks = parse_blocks(body)?;
    if blocks.is_empty() {
        return Ok(body.to_string());
    }

    let mut output = String::with_capacity(body.len());
    let mut cursor = 0;
    for block in &blocks {
        output.push_str(&body[cursor..block.open.start]);
        if block.expr.matches(platform) {
            output.push_str(block.content(body));
        }
        cursor = block.close.end;
    }
    output.push_str(&body[cursor..]);
    Ok(output)
}

/// Replace the known `{{variable}}` tags.
pub fn substitute_variables(text: &str, context: &TemplateContext<'_>) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(len) = after.find("}}") else {
            break;
        };
        match context.lookup(after[..len].trim()) {
            Some(value) => {
                output.push_str(&rest[..start]);
                output.push_str(value);
                rest = &after[len + 2..];
            }
            None => {
                output.push_str(&rest[..start + 2]);
                rest = after;
            }
        }
    }
    output.push_str(rest);
    output
}

/// Whether `body` contains anything this module would change.
pub fn has_template_syntax(body: &str) -> bool {
    body.contains("{{")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(platform: Platform) -> TemplateContext<'static> {
        TemplateContext::new(platform, "demo", "/work/demo")
    }

    #[test]
    fn test_inline_pruning() {
        let body = "before {{#claude}}X{{/claude}}{{#!claude}}Y{{/!claude}} after";
        assert_eq!(render(body, &ctx(Platform::Claude)).unwrap(), "before X after");
        assert_eq!(render(body, &ctx(Platform::Cursor)).unwrap(), "before Y after");
    }

    #[test]
    fn test_line_blocks_leave_no_blank_lines() {
        let body = "Shared.\n{{#claude}}\nClaude only.\n{{/claude}}\n{{#cursor|opencode}}\nOthers.\n{{/cursor|opencode}}\nEnd.\n";
        assert_eq!(
            render(body, &ctx(Platform::Claude)).unwrap(),
            "Shared.\nClaude only.\nEnd.\n"
        );
        assert_eq!(render(body, &ctx(Platform::OpenCode)).unwrap(), "Shared.\nOthers.\nEnd.\n");
    }

    #[test]
    fn test_and_expression() {
        let body = "{{#!claude&!cursor}}only opencode{{/!claude&!cursor}}";
        assert_eq!(render(body, &ctx(Platform::OpenCode)).unwrap(), "only opencode");
        assert_eq!(render(body, &ctx(Platform::Claude)).unwrap(), "");
    }

    #[test]
    fn test_nested_blocks_are_literal() {
        let body = "{{#claude}}a{{#cursor}}b{{/cursor}}c{{/claude}}";
        assert_eq!(
            render(body, &ctx(Platform::Claude)).unwrap(),
            "a{{#cursor}}b{{/cursor}}c"
        );
        assert_eq!(render(body, &ctx(Platform::Cursor)).unwrap(), "");
    }

    #[test]
    fn test_variables() {
        let body = "Target {{platform}} for {{ project.name }} at {{project.root}}; keep {{other}}.";
        assert_eq!(
            render(body, &ctx(Platform::Cursor)).unwrap(),
            "Target cursor for demo at /work/demo; keep {{other}}."
        );
    }

    #[test]
    fn test_variables_only_in_kept_text() {
        let body = "{{#cursor}}{{platform}}{{/cursor}}{{#claude}}on {{platform}}{{/claude}}";
        assert_eq!(render(body, &ctx(Platform::Claude)).unwrap(), "on claude");
    }

    #[test]
    fn test_documented_handlebars_survives() {
        let body = "Use `{{#each items}}{{this}}{{/each}}` in templates.\n\n```hbs\n{{#each items}}\n  {{#claude}}\n{{/each}}\n```\n{{#claude}}Claude only.{{/claude}}\n";
        assert_eq!(
            render(body, &ctx(Platform::Claude)).unwrap(),
            "Use `{{#each items}}{{this}}{{/each}}` in templates.\n\n```hbs\n{{#each items}}\n  {{#claude}}\n{{/each}}\n```\nClaude only.\n"
        );
        assert_eq!(
            render("Loop with {{#each rows}}...{{/each}}.", &ctx(Platform::Cursor)).unwrap(),
            "Loop with {{#each rows}}...{{/each}}."
        );
    }

    #[test]
    fn test_unterminated_is_error() {
        let err = render("{{#claude}}\ntext", &ctx(Platform::Claude)).unwrap_err();
        assert_eq!(err.to_string(), "unclosed block '{{#claude}}' at line 1, column 1");
    }

    #[test]
    fn test_plain_body_unchanged() {
        let body = "No templates here.\n";
        assert_eq!(render(body, &ctx(Platform::Claude)).unwrap(), body);
        assert!(!has_template_syntax(body));
    }
}
