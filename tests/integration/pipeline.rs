use std::path::Path;

use rulesmith::condition::StaticFacts;
use rulesmith::core::{DocumentKind, ErrorCategory, Platform};
use rulesmith::source::SourceLoadResult;
use rulesmith::test_utils::DocumentFixture;

use crate::common::{build, resolve_sources, resolve_with};

fn rule(name: &str, extra: &str, body: &str) -> DocumentFixture {
    DocumentFixture::new(
        DocumentKind::Rule,
        format!("rules/{name}.md"),
        format!("---\nname: {name}\n{extra}---\n{body}"),
    )
}

fn persona(name: &str, extra: &str) -> DocumentFixture {
    DocumentFixture::new(
        DocumentKind::Persona,
        format!("personas/{name}.md"),
        format!("---\nname: {name}\n{extra}---\n{name} body\n"),
    )
}

#[test]
fn test_resolution_is_idempotent() {
    let fixtures = DocumentFixture::full_set();
    for platform in Platform::ALL {
        let first = build(vec![DocumentFixture::source("local", &fixtures)], platform);
        let second = build(vec![DocumentFixture::source("local", &fixtures)], platform);
        assert!(!first.artifacts.is_empty(), "{platform} produced nothing");
        assert_eq!(first.artifacts.checksums(), second.artifacts.checksums(), "{platform} output differs");
    }
}

#[test]
fn test_inheritance_cycle_is_reported_for_both() {
    let source = DocumentFixture::source("local", &[persona("a", "extends: b\n"), persona("b", "extends: a\n")]);
    let resolution = resolve_sources(vec![source], Platform::Claude);

    let cycle_errors: Vec<_> = resolution.diagnostics.in_category(ErrorCategory::Resolution).collect();
    assert_eq!(cycle_errors.len(), 2);
    assert!(cycle_errors.iter().all(|d| d.is_error() && d.message.contains("cycle")));
    assert!(resolution.content.personas.is_empty());
}

#[test]
fn test_inheritance_depth_limit() {
    // p11 is 11 links away from p0; p10 is exactly 10.
    let mut fixtures = vec![persona("p0", "")];
    for i in 1..=11 {
        fixtures.push(persona(&format!("p{i}"), &format!("extends: p{}\n", i - 1)));
    }
    let resolution = resolve_sources(vec![DocumentFixture::source("local", &fixtures)], Platform::Claude);

    assert!(resolution.content.find(DocumentKind::Persona, "p10").is_some());
    assert!(resolution.content.find(DocumentKind::Persona, "p11").is_none());
    assert_eq!(resolution.diagnostics.error_count(), 1);
    let error = resolution.diagnostics.errors().next().unwrap();
    assert!(error.message.contains("p11"));
}

#[test]
fn test_conditions_against_facts() {
    let fixtures = [
        rule("react", "when: \"npm:react && !npm:vue\"\n", "React rule"),
        rule("esm", "when: 'pkg:type == \"module\"'\n", "ESM rule"),
    ];
    let source = || DocumentFixture::source("local", &fixtures);

    let facts = StaticFacts::new().with_present("npm", "react").with("pkg", "type", "module");
    let resolution = resolve_with(vec![source()], Platform::Claude, &facts);
    assert_eq!(resolution.content.rules.len(), 2);

    let facts = StaticFacts::new()
        .with_present("npm", "react")
        .with_present("npm", "vue")
        .with("pkg", "type", "modules");
    let resolution = resolve_with(vec![source()], Platform::Claude, &facts);
    assert!(resolution.content.rules.is_empty());
    assert!(resolution.diagnostics.is_empty());
}

#[test]
fn test_malformed_condition_is_an_error() {
    let source = DocumentFixture::source("local", &[rule("broken", "when: \"npm:react &&\"\n", "Body")]);
    let facts = StaticFacts::new().with_present("npm", "react");
    let resolution = resolve_with(vec![source], Platform::Claude, &facts);

    assert!(resolution.content.rules.is_empty());
    let errors: Vec<_> = resolution.diagnostics.in_category(ErrorCategory::Condition).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_error());
    assert!(resolution.is_failure());
}

#[test]
fn test_includes_splice_in_order() {
    let source = SourceLoadResult::in_memory("local")
        .with_document(
            DocumentKind::Rule,
            "rules/combined.md",
            "---\nname: combined\n---\nIntro\n@include ../shared/a.md\n@include ../shared/b.md\nOutro\n",
        )
        .with_file("shared/a.md", "---\nname: a\n---\nFragment A\n")
        .with_file("shared/b.md", "Fragment B\n");
    let resolution = resolve_sources(vec![source], Platform::Cursor);

    let body = &resolution.content.rules[0].body;
    assert_eq!(body.trim_end(), "Intro\nFragment A\nFragment B\nOutro");
    assert!(!body.contains("name: a"));
}

#[test]
fn test_inherited_parent_keeps_its_own_includes() {
    // Parent one directory deeper than the child.
    let local = SourceLoadResult::in_memory("local")
        .with_document(
            DocumentKind::Persona,
            "personas/team/base.md",
            "---\nname: base\n---\nBase\n@include ../../shared/x.md\n",
        )
        .with_document(DocumentKind::Persona, "personas/child.md", "---\nname: child\nextends: base\n---\nChild\n")
        .with_file("shared/x.md", "Shared X\n");
    let resolution = resolve_sources(vec![local], Platform::Claude);

    assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
    let child = resolution.content.find(DocumentKind::Persona, "child").unwrap();
    assert!(child.body.starts_with("Base\nShared X"));
    assert!(child.body.ends_with("Child"));

    // Parent in another source, including a fragment only that source has.
    let team = SourceLoadResult::in_memory("team")
        .with_document(
            DocumentKind::Persona,
            "personas/reviewer.md",
            "---\nname: reviewer\n---\n@include ../shared/checklist.md\n",
        )
        .with_file("shared/checklist.md", "Check tests.\n");
    let local = SourceLoadResult::in_memory("local").with_document(
        DocumentKind::Persona,
        "personas/strict.md",
        "---\nname: strict\nextends: reviewer\n---\nBe strict.\n",
    );
    let resolution = resolve_sources(vec![team, local], Platform::OpenCode);

    assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
    let strict = resolution.content.find(DocumentKind::Persona, "strict").unwrap();
    assert_eq!(strict.body, "Check tests.\n\n---\n\nBe strict.");
}

#[test]
fn test_template_blocks_are_pruned_per_target() {
    let fixtures = [rule("blocks", "", "before {{#claude}}X{{/claude}}{{#!claude}}Y{{/!claude}} after")];

    let claude = resolve_sources(vec![DocumentFixture::source("local", &fixtures)], Platform::Claude);
    assert_eq!(claude.content.rules[0].body.trim_end(), "before X after");

    let cursor = resolve_sources(vec![DocumentFixture::source("local", &fixtures)], Platform::Cursor);
    assert_eq!(cursor.content.rules[0].body.trim_end(), "before Y after");
}

#[test]
fn test_documented_template_syntax_is_kept() {
    let body = "Use `{{#each items}}{{this}}{{/each}}` in templates.\n\n```handlebars\n{{#each users}}\n  {{name}}\n{{/each}}\n```\n";
    let fixtures = [rule("handlebars", "", body)];

    for platform in Platform::ALL {
        let resolution = resolve_sources(vec![DocumentFixture::source("local", &fixtures)], platform);
        assert!(resolution.diagnostics.is_empty(), "{platform}: {:?}", resolution.diagnostics);
        assert_eq!(resolution.content.rules.len(), 1);
        assert_eq!(resolution.content.rules[0].body, body);
    }
}

#[test]
fn test_target_filtering() {
    let fixtures = [rule("claude-only", "targets: [claude]\n", "Only for Claude")];

    let claude = resolve_sources(vec![DocumentFixture::source("local", &fixtures)], Platform::Claude);
    assert_eq!(claude.content.rules.len(), 1);

    let cursor = resolve_sources(vec![DocumentFixture::source("local", &fixtures)], Platform::Cursor);
    assert!(cursor.content.is_empty());
    let output = build(vec![DocumentFixture::source("local", &fixtures)], Platform::Cursor);
    assert!(!output.artifacts.contains(Path::new(".cursor/rules/claude-only.mdc")));
}

#[test]
fn test_duplicates_across_sources_are_retained() {
    let team = DocumentFixture::source("team", &[rule("style", "", "Team style")]);
    let local = DocumentFixture::source("local", &[rule("style", "", "Local style")]);
    let resolution = resolve_sources(vec![team.clone(), local.clone()], Platform::Claude);

    assert_eq!(resolution.parsed.iter().filter(|d| d.name == "style").count(), 2);
    assert_eq!(resolution.content.rules.len(), 2);
    assert!(resolution.diagnostics.warnings().any(|d| d.message.contains("style")));

    // The first source wins the output path.
    let output = build(vec![team, local], Platform::Claude);
    let artifact = output.artifacts.get(Path::new(".claude/rules/style.md")).unwrap();
    assert!(artifact.content.contains("Team style"));
    assert!(output.diagnostics.warning_count() >= 1);
}

#[test]
fn test_child_persona_overrides_lists_and_inherits_scalars() {
    let source = DocumentFixture::source(
        "local",
        &[
            persona("base", "tools: [read]\nmodel: sonnet\ndescription: Base\n"),
            persona("child", "extends: base\ntools: [write]\n"),
        ],
    );
    let resolution = resolve_sources(vec![source], Platform::Claude);
    assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);

    let child = resolution.content.find(DocumentKind::Persona, "child").unwrap();
    let spec = child.as_persona().unwrap();
    assert_eq!(spec.tools, vec!["write".to_string()]);
    assert_eq!(spec.model.as_deref(), Some("sonnet"));
    assert_eq!(child.description.as_deref(), Some("Base"));
    assert!(child.body.find("base body").unwrap() < child.body.find("child body").unwrap());

    let output = rulesmith::targets::generate(&resolution.content);
    let agent = &output.artifacts.get(Path::new(".claude/agents/child.md")).unwrap().content;
    assert!(agent.contains("tools: Write\n"));
    assert!(agent.contains("model: sonnet\n"));
}

#[test]
fn test_every_target_gets_its_entry_point() {
    let fixtures = DocumentFixture::full_set();
    let facts = StaticFacts::new().with_present("npm", "typescript");

    let expected = [
        (Platform::Claude, ["CLAUDE.md", ".claude/settings.json", ".claude/commands/test.md"]),
        (Platform::Cursor, [".cursor/rules/typescript.mdc", ".cursor/hooks.json", ".cursor/commands/test.md"]),
        (Platform::OpenCode, ["AGENTS.md", ".opencode/plugin/guard.js", ".opencode/agent/child.md"]),
    ];
    for (platform, paths) in expected {
        let resolution = resolve_with(vec![DocumentFixture::source("local", &fixtures)], platform, &facts);
        let output = rulesmith::targets::generate(&resolution.content);
        for path in paths {
            assert!(output.artifacts.contains(Path::new(path)), "{platform} is missing {path}");
        }
    }
}
