use std::path::Path;

use rulesmith::condition::{Ecosystem, FactContext, FactValue};
use rulesmith::core::{DocumentKind, Platform};
use rulesmith::facts::ProjectFacts;
use rulesmith::resolver::{ResolveOptions, Resolver};
use rulesmith::source::{SourceDescriptor, load_local_sources};
use rulesmith::targets::generate;
use rulesmith::test_utils::TestProjectBuilder;

#[tokio::test]
async fn test_loaded_project_resolves_against_its_manifests() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_files(vec![
            (
                ".rulesmith/rules/react.md",
                "---\nname: react\nwhen: npm:react\nalwaysApply: true\n---\nHooks first.\n@include ../shared/footer.md\n",
            ),
            (".rulesmith/rules/vue.md", "---\nname: vue\nwhen: npm:vue\n---\nComposition API.\n"),
            (".rulesmith/rules/_draft.md", "---\nname: draft\n---\nNot a document.\n"),
            (".rulesmith/agents/reviewer.md", "---\nname: reviewer\ntools: [read]\n---\nReview.\n"),
            (".rulesmith/shared/footer.md", "Questions go to #frontend.\n"),
            ("package.json", r#"{"name": "web", "type": "module", "dependencies": {"react": "^18"}}"#),
        ])
        .build()
        .unwrap();

    let sources = load_local_sources(vec![SourceDescriptor::new("local", project.path().join(".rulesmith"))])
        .await
        .unwrap();
    assert_eq!(sources.document_count(), 3);
    assert_eq!(sources.errors().count(), 0);

    let facts = ProjectFacts::collect(project.path());
    assert!(facts.has_dependency(Ecosystem::Npm, "react"));
    assert_eq!(facts.resolve("pkg", "type"), Some(FactValue::from("module")));

    let resolver = Resolver::new(&sources, ResolveOptions::default());
    let resolutions = resolver.resolve_all(&facts, &[Platform::Claude, Platform::OpenCode]);
    assert_eq!(resolutions.len(), 2);

    let claude = &resolutions[0];
    assert!(claude.diagnostics.is_empty(), "{:?}", claude.diagnostics);
    let react = claude.content.find(DocumentKind::Rule, "react").unwrap();
    assert!(react.body.contains("Questions go to #frontend."));
    assert!(claude.content.find(DocumentKind::Rule, "vue").is_none());
    assert!(claude.content.find(DocumentKind::Rule, "draft").is_none());
    assert!(claude.content.find(DocumentKind::Persona, "reviewer").is_some());

    let output = generate(&claude.content);
    assert!(output.artifacts.contains(Path::new(".claude/rules/react.md")));
    assert!(output.artifacts.contains(Path::new(".claude/agents/reviewer.md")));

    let opencode = generate(&resolutions[1].content);
    let agents = &opencode.artifacts.get(Path::new("AGENTS.md")).unwrap().content;
    assert!(agents.contains("Hooks first."));
}

#[tokio::test]
async fn test_sources_keep_configured_order() {
    let project = TestProjectBuilder::new()
        .unwrap()
        .with_files(vec![
            ("team/rules/style.md", "---\nname: style\n---\nTeam.\n"),
            ("mine/rules/style.md", "---\nname: style\n---\nMine.\n"),
        ])
        .build()
        .unwrap();

    let sources = load_local_sources(vec![
        SourceDescriptor::new("team", project.path().join("team")),
        SourceDescriptor::new("mine", project.path().join("mine")),
    ])
    .await
    .unwrap();

    let resolver = Resolver::new(&sources, ResolveOptions::default());
    let facts = ProjectFacts::collect(project.path());
    let resolution = &resolver.resolve_all(&facts, &[Platform::Cursor])[0];

    let sources: Vec<&str> = resolution
        .content
        .rules
        .iter()
        .map(|d| d.provenance.source.as_str())
        .collect();
    assert_eq!(sources, vec!["team", "mine"]);
    assert_eq!(resolution.diagnostics.warning_count(), 1);
}

#[tokio::test]
async fn test_missing_source_directory_fails_the_load() {
    let project = TestProjectBuilder::new().unwrap().build().unwrap();
    let err = load_local_sources(vec![SourceDescriptor::new("local", project.path().join(".rulesmith"))])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Source 'local' not found"));
}
