//! Sample documents for tests.
//!
//! Paths are relative to a source root (`rules/…`, `personas/…`).

use crate::core::DocumentKind;
use crate::source::SourceLoadResult;

/// A document file: where it lives in a source and its text.
#[derive(Clone, Debug)]
pub struct DocumentFixture {
    pub kind: DocumentKind,
    pub path: String,
    pub content: String,
}

impl DocumentFixture {
    pub fn new(kind: DocumentKind, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            content: content.into(),
        }
    }

    /// An always-applied rule named `style`.
    pub fn rule_always() -> Self {
        Self::new(
            DocumentKind::Rule,
            "rules/style.md",
            "---\nname: style\ndescription: House style\nalwaysApply: true\npriority: high\n---\nKeep functions short.\n",
        )
    }

    /// A rule scoped to TypeScript files and conditional on `npm:typescript`.
    pub fn rule_typescript() -> Self {
        Self::new(
            DocumentKind::Rule,
            "rules/typescript.md",
            "---\nname: typescript\ndescription: TypeScript conventions\nglobs: [\"src/main.ts\"]\nwhen: npm:typescript\n---\nUse strict mode.\n",
        )
    }

    /// The root persona of the inheritance examples.
    pub fn persona_base() -> Self {
        Self::new(
            DocumentKind::Persona,
            "personas/base.md",
            "---\nname: base\ndescription: Base reviewer\ntools: [read]\n---\nBe careful.\n",
        )
    }

    /// Extends [`persona_base`](Self::persona_base), adding a model.
    pub fn persona_child() -> Self {
        Self::new(
            DocumentKind::Persona,
            "personas/child.md",
            "---\nname: child\nextends: base\nmodel: opus\n---\nBe thorough.\n",
        )
    }

    /// A command with an `execute` line.
    pub fn command_test() -> Self {
        Self::new(
            DocumentKind::Command,
            "commands/test.md",
            "---\nname: test\ndescription: Run the tests\nexecute: cargo test\n---\nRun the whole suite.\n",
        )
    }

    /// A `PreToolUse` hook on shell tools.
    pub fn hook_guard() -> Self {
        Self::new(
            DocumentKind::Hook,
            "hooks/guard.md",
            "---\nname: guard\nevent: PreToolUse\ntoolMatch: Bash\nexecute: ./scripts/guard.sh\n---\n",
        )
    }

    /// One of every kind.
    pub fn full_set() -> Vec<Self> {
        vec![
            Self::rule_always(),
            Self::rule_typescript(),
            Self::persona_base(),
            Self::persona_child(),
            Self::command_test(),
            Self::hook_guard(),
        ]
    }

    /// An in-memory source holding `fixtures`.
    pub fn source(name: &str, fixtures: &[Self]) -> SourceLoadResult {
        fixtures.iter().fold(SourceLoadResult::in_memory(name), |source, fixture| {
            source.with_document(fixture.kind, &fixture.path, &fixture.content)
        })
    }
}
