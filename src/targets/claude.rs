//! Claude Code output.
//!
//! - rules: `.claude/rules/<name>.md` with `description` and `paths`
//! - personas: `.claude/agents/<name>.md`
//! - commands: `.claude/commands/<name>.md`
//! - hooks: one `.claude/settings.json` holding every hook, grouped by event
//!   and matcher
//! - `CLAUDE.md`: imports always-apply rules and indexes everything else

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::emit::{FrontmatterBuilder, apply_json_overrides};
use super::vocabulary::{map_model, map_tools};
use super::{Artifact, GenerationOutput, TargetGenerator};
use crate::constants::GENERATED_MARKER;
use crate::core::{Document, Platform};
use crate::resolver::ResolvedContent;

const RULES_DIR: &str = ".claude/rules";
const AGENTS_DIR: &str = ".claude/agents";
const COMMANDS_DIR: &str = ".claude/commands";
const SETTINGS_FILE: &str = ".claude/settings.json";
const ENTRY_POINT: &str = "CLAUDE.md";

pub struct ClaudeGenerator;

/// Hooks sharing one tool matcher. Each hook is a JSON object so override
/// blocks can replace its typed fields.
#[derive(Debug, Clone, Serialize)]
struct MatcherGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    matcher: Option<String>,
    hooks: Vec<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
struct Settings {
    hooks: BTreeMap<&'static str, Vec<MatcherGroup>>,
}

impl TargetGenerator for ClaudeGenerator {
    fn platform(&self) -> Platform {
        Platform::Claude
    }

    fn generate(&self, content: &ResolvedContent) -> GenerationOutput {
        let mut output = GenerationOutput::new();

        for rule in &content.rules {
            match render_rule(rule) {
                Ok(text) => output.add(rule, Artifact::text(format!("{RULES_DIR}/{}.md", rule.name), text)),
                Err(e) => output.fail(rule, e),
            }
        }
        for persona in &content.personas {
            match render_persona(persona, &mut output) {
                Ok(text) => output.add(persona, Artifact::text(format!("{AGENTS_DIR}/{}.md", persona.name), text)),
                Err(e) => output.fail(persona, e),
            }
        }
        for command in &content.commands {
            match render_command(command, &mut output) {
                Ok(text) => {
                    output.add(command, Artifact::text(format!("{COMMANDS_DIR}/{}.md", command.name), text));
                }
                Err(e) => output.fail(command, e),
            }
        }

        if !content.hooks.is_empty() {
            let settings = build_settings(&content.hooks);
            match Artifact::json(SETTINGS_FILE, &settings) {
                Ok(artifact) => output.add_aggregate(artifact),
                Err(e) => {
                    for hook in &content.hooks {
                        output.fail(hook, &e);
                    }
                }
            }
        }

        if !(content.rules.is_empty() && content.personas.is_empty() && content.commands.is_empty()) {
            output.add_aggregate(Artifact::text(ENTRY_POINT, render_entry_point(content)));
        }

        output
    }
}

fn render_rule(rule: &Document) -> Result<String, serde_yaml::Error> {
    let spec = rule.as_rule().cloned().unwrap_or_default();
    FrontmatterBuilder::new()
        .optional("description", rule.description.as_deref())
        .list("paths", &spec.globs)
        .merge_overrides(rule.overrides.get(Platform::Claude))?
        .render(&rule.body)
}

fn render_persona(persona: &Document, output: &mut GenerationOutput) -> Result<String, serde_yaml::Error> {
    let spec = persona.as_persona().cloned().unwrap_or_default();
    let tools = map_tools(Platform::Claude, &spec.tools);
    if !tools.unknown.is_empty() {
        output.warn(
            persona,
            format!("{} uses unknown tool(s) {}; passed through as-is", persona.label(), tools.unknown.join(", ")),
        );
    }

    FrontmatterBuilder::new()
        .field("name", persona.name.as_str())
        .optional("description", persona.description.as_deref())
        .comma_list("tools", &tools.tools)
        .optional("model", spec.model.as_deref().and_then(|m| map_model(Platform::Claude, m)))
        .optional("color", spec.color.as_deref())
        .merge_overrides(persona.overrides.get(Platform::Claude))?
        .render(&persona.body)
}

fn render_command(command: &Document, output: &mut GenerationOutput) -> Result<String, serde_yaml::Error> {
    let spec = command.as_command().cloned().unwrap_or_default();
    let tools = map_tools(Platform::Claude, &spec.tools);
    if !tools.unknown.is_empty() {
        output.warn(
            command,
            format!("{} uses unknown tool(s) {}; passed through as-is", command.label(), tools.unknown.join(", ")),
        );
    }

    let mut body = command.body.trim_end().to_string();
    if let Some(execute) = spec.execute.as_deref().filter(|e| !e.trim().is_empty()) {
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        let _ = write!(body, "!`{}`", execute.trim());
    }

    FrontmatterBuilder::new()
        .optional("description", command.description.as_deref())
        .optional("argument-hint", spec.effective_argument_hint())
        .comma_list("allowed-tools", &tools.tools)
        .optional("model", spec.model.as_deref().and_then(|m| map_model(Platform::Claude, m)))
        .merge_overrides(command.overrides.get(Platform::Claude))?
        .render(&body)
}

/// Group hooks by event, then by matcher in first-seen order.
fn build_settings(hooks: &[Document]) -> Settings {
    let mut settings = Settings {
        hooks: BTreeMap::new(),
    };
    for hook in hooks {
        let Some(spec) = hook.as_hook() else {
            continue;
        };
        let mut command = Map::new();
        command.insert("type".to_string(), Value::from("command"));
        command.insert("command".to_string(), Value::from(spec.execute.as_str()));
        if let Some(timeout) = spec.timeout {
            command.insert("timeout".to_string(), Value::from(timeout));
        }
        apply_json_overrides(&mut command, hook.overrides.get(Platform::Claude));
        let groups = settings.hooks.entry(spec.event.as_str()).or_default();
        match groups.iter_mut().find(|g| g.matcher == spec.tool_match) {
            Some(group) => group.hooks.push(command),
            None => groups.push(MatcherGroup {
                matcher: spec.tool_match.clone(),
                hooks: vec![command],
            }),
        }
    }
    settings
}

fn render_entry_point(content: &ResolvedContent) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "{GENERATED_MARKER}\n");
    if content.project_name.is_empty() {
        text.push_str("# Project Guidance\n");
    } else {
        let _ = writeln!(text, "# {}", content.project_name);
    }

    let (always, scoped): (Vec<&Document>, Vec<&Document>) =
        content.rules.iter().partition(|r| r.as_rule().is_some_and(|s| s.always_apply));

    if !always.is_empty() {
        text.push_str("\n## Rules\n\n");
        for rule in &always {
            let _ = writeln!(text, "@{RULES_DIR}/{}.md", rule.name);
        }
    }
    if !scoped.is_empty() {
        text.push_str("\n## Scoped Rules\n\n");
        for rule in &scoped {
            let _ = write!(text, "- `{RULES_DIR}/{}.md`", rule.name);
            if let Some(description) = &rule.description {
                let _ = write!(text, ": {description}");
            }
            let globs = rule.as_rule().map(|s| s.globs.as_slice()).unwrap_or_default();
            if !globs.is_empty() {
                let _ = write!(text, " (applies to {})", globs.join(", "));
            }
            text.push('\n');
        }
    }
    if !content.personas.is_empty() {
        text.push_str("\n## Agents\n\n");
        for persona in &content.personas {
            push_index_line(&mut text, &persona.name, persona.description.as_deref());
        }
    }
    if !content.commands.is_empty() {
        text.push_str("\n## Commands\n\n");
        for command in &content.commands {
            push_index_line(&mut text, &format!("/{}", command.name), command.description.as_deref());
        }
    }
    text
}

fn push_index_line(text: &mut String, name: &str, description: Option<&str>) {
    match description {
        Some(description) => {
            let _ = writeln!(text, "- `{name}`: {description}");
        }
        None => {
            let _ = writeln!(text, "- `{name}`");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DocumentKind, Metadata, Provenance};
    use crate::metadata::build_document;
    use std::path::Path;

    fn doc(kind: DocumentKind, yaml: &str, body: &str) -> Document {
        let metadata: Metadata = serde_yaml::from_str(yaml).unwrap();
        build_document(kind, metadata, body.to_string(), Provenance::new("local", "x.md")).unwrap()
    }

    fn content(documents: Vec<Document>) -> ResolvedContent {
        ResolvedContent::new(Platform::Claude, "demo", "/demo").with_documents(documents)
    }

    fn text<'a>(output: &'a GenerationOutput, path: &str) -> &'a str {
        &output.artifacts.get(Path::new(path)).unwrap().content
    }

    #[test]
    fn test_rule_and_entry_point() {
        let output = ClaudeGenerator.generate(&content(vec![
            doc(DocumentKind::Rule, "name: style\ndescription: Style\nalwaysApply: true", "Be tidy."),
            doc(DocumentKind::Rule, "name: rust\nglobs: [\"src/main.rs\"]", "Use clippy."),
        ]));

        assert_eq!(text(&output, ".claude/rules/style.md"), "---\ndescription: Style\n---\n\nBe tidy.\n");
        assert_eq!(text(&output, ".claude/rules/rust.md"), "---\npaths:\n- src/main.rs\n---\n\nUse clippy.\n");

        let entry = text(&output, "CLAUDE.md");
        assert!(entry.starts_with(GENERATED_MARKER));
        assert!(entry.contains("# demo\n"));
        assert!(entry.contains("@.claude/rules/style.md\n"));
        assert!(entry.contains("- `.claude/rules/rust.md` (applies to src/main.rs)\n"));
    }

    #[test]
    fn test_persona_vocabulary() {
        let output = ClaudeGenerator.generate(&content(vec![doc(
            DocumentKind::Persona,
            "name: reviewer\ndescription: Reviews\ntools: [read, grep, mcp__jira]\nmodel: opus\nclaude:\n  color: red",
            "Review carefully.",
        )]));
        assert_eq!(
            text(&output, ".claude/agents/reviewer.md"),
            "---\nname: reviewer\ndescription: Reviews\ntools: Read, Grep, mcp__jira\nmodel: opus\ncolor: red\n---\n\nReview carefully.\n"
        );
        assert_eq!(output.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_command_execute_line() {
        let output = ClaudeGenerator.generate(&content(vec![doc(
            DocumentKind::Command,
            "name: test\ndescription: Run tests\nexecute: cargo test\ntools: [bash]",
            "Run the suite.",
        )]));
        assert_eq!(
            text(&output, ".claude/commands/test.md"),
            "---\ndescription: Run tests\nallowed-tools: Bash\n---\n\nRun the suite.\n\n!`cargo test`\n"
        );
    }

    #[test]
    fn test_hooks_grouped_by_event_and_matcher() {
        let output = ClaudeGenerator.generate(&content(vec![
            doc(DocumentKind::Hook, "name: fmt\nevent: PostToolUse\ntoolMatch: Edit|Write\nexecute: cargo fmt", ""),
            doc(DocumentKind::Hook, "name: lint\nevent: post_tool_use\ntoolMatch: Edit|Write\nexecute: cargo clippy\ntimeout: 30", ""),
            doc(DocumentKind::Hook, "name: hello\nevent: SessionStart\nexecute: echo hi", ""),
        ]));
        let settings: serde_json::Value =
            serde_json::from_str(text(&output, ".claude/settings.json")).unwrap();

        let post = &settings["hooks"]["PostToolUse"];
        assert_eq!(post.as_array().unwrap().len(), 1);
        assert_eq!(post[0]["matcher"], "Edit|Write");
        assert_eq!(post[0]["hooks"][0]["command"], "cargo fmt");
        assert_eq!(post[0]["hooks"][1]["timeout"], 30);
        assert_eq!(settings["hooks"]["SessionStart"][0]["hooks"][0]["type"], "command");
        assert!(settings["hooks"]["SessionStart"][0].get("matcher").is_none());
        // Hooks alone produce no entry point.
        assert!(!output.artifacts.contains(Path::new("CLAUDE.md")));
    }

    #[test]
    fn test_hook_overrides_replace_typed_fields() {
        let output = ClaudeGenerator.generate(&content(vec![doc(
            DocumentKind::Hook,
            "name: lint\nevent: PreToolUse\nexecute: cargo clippy\ntimeout: 30\nclaude:\n  timeout: 90\n  command: cargo clippy -q",
            "",
        )]));
        let raw = text(&output, ".claude/settings.json");
        assert_eq!(raw.matches("\"timeout\"").count(), 1);
        assert_eq!(raw.matches("\"command\":").count(), 1);

        let settings: serde_json::Value = serde_json::from_str(raw).unwrap();
        let hook = &settings["hooks"]["PreToolUse"][0]["hooks"][0];
        assert_eq!(hook["timeout"], 90);
        assert_eq!(hook["command"], "cargo clippy -q");
        assert_eq!(hook["type"], "command");
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let first = doc(DocumentKind::Command, "name: dup", "First");
        let mut second = doc(DocumentKind::Command, "name: dup", "Second");
        second.provenance = Provenance::new("other", "commands/dup.md");
        let output = ClaudeGenerator.generate(&content(vec![first, second]));

        assert!(text(&output, ".claude/commands/dup.md").contains("First"));
        let warning = output.diagnostics.warnings().next().unwrap();
        assert_eq!(warning.source.as_deref(), Some("other"));
    }
}
