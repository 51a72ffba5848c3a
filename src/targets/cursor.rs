//! Cursor output.
//!
//! Cursor has no agents, so personas become agent-requested rules that the
//! model pulls in by description. Hooks are collected into `.cursor/hooks.json`
//! under Cursor's own event names; events Cursor has no counterpart for are
//! skipped with a warning.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::emit::{FrontmatterBuilder, apply_json_overrides};
use super::{Artifact, GenerationOutput, TargetGenerator};
use crate::core::{Document, HookEvent, HookSpec, Platform};
use crate::resolver::ResolvedContent;

const RULES_DIR: &str = ".cursor/rules";
const COMMANDS_DIR: &str = ".cursor/commands";
const HOOKS_FILE: &str = ".cursor/hooks.json";
const HOOKS_VERSION: u32 = 1;

pub struct CursorGenerator;

#[derive(Debug, Serialize)]
struct HooksFile {
    version: u32,
    hooks: BTreeMap<&'static str, Vec<Map<String, Value>>>,
}

/// Cursor's event for a hook, if it has one.
///
/// Tool events are routed by matcher: shell tools to
/// `beforeShellExecution`, reads to `beforeReadFile`, MCP tools to
/// `beforeMCPExecution`. Post-tool hooks only exist for file edits.
fn cursor_event(spec: &HookSpec) -> Option<&'static str> {
    let matcher = spec.tool_match.as_deref().unwrap_or_default().to_ascii_lowercase();
    match spec.event {
        HookEvent::PreToolUse if matcher.contains("mcp") => Some("beforeMCPExecution"),
        HookEvent::PreToolUse if matcher.contains("read") => Some("beforeReadFile"),
        HookEvent::PreToolUse => Some("beforeShellExecution"),
        HookEvent::PostToolUse => Some("afterFileEdit"),
        HookEvent::UserPromptSubmit => Some("beforeSubmitPrompt"),
        HookEvent::Stop => Some("stop"),
        HookEvent::Notification
        | HookEvent::SubagentStop
        | HookEvent::PreCompact
        | HookEvent::SessionStart
        | HookEvent::SessionEnd => None,
    }
}

impl TargetGenerator for CursorGenerator {
    fn platform(&self) -> Platform {
        Platform::Cursor
    }

    fn generate(&self, content: &ResolvedContent) -> GenerationOutput {
        let mut output = GenerationOutput::new();

        for rule in &content.rules {
            match render_rule(rule) {
                Ok(text) => output.add(rule, Artifact::text(format!("{RULES_DIR}/{}.mdc", rule.name), text)),
                Err(e) => output.fail(rule, e),
            }
        }
        for persona in &content.personas {
            match render_persona(persona) {
                Ok(text) => output.add(
                    persona,
                    Artifact::text(format!("{RULES_DIR}/persona-{}.mdc", persona.name), text),
                ),
                Err(e) => output.fail(persona, e),
            }
        }
        for command in &content.commands {
            match render_command(command) {
                Ok(text) => {
                    output.add(command, Artifact::text(format!("{COMMANDS_DIR}/{}.md", command.name), text));
                }
                Err(e) => output.fail(command, e),
            }
        }

        let mut hooks = HooksFile {
            version: HOOKS_VERSION,
            hooks: BTreeMap::new(),
        };
        for hook in &content.hooks {
            let Some(spec) = hook.as_hook() else {
                continue;
            };
            let Some(event) = cursor_event(spec) else {
                output.warn(
                    hook,
                    format!("{} skipped: Cursor has no equivalent of the {} event", hook.label(), spec.event),
                );
                continue;
            };
            let mut entry = Map::new();
            entry.insert("command".to_string(), Value::from(spec.execute.as_str()));
            apply_json_overrides(&mut entry, hook.overrides.get(Platform::Cursor));
            hooks.hooks.entry(event).or_default().push(entry);
        }
        if !hooks.hooks.is_empty() {
            match Artifact::json(HOOKS_FILE, &hooks) {
                Ok(artifact) => output.add_aggregate(artifact),
                Err(e) => {
                    for hook in &content.hooks {
                        output.fail(hook, &e);
                    }
                }
            }
        }

        output
    }
}

fn render_rule(rule: &Document) -> Result<String, serde_yaml::Error> {
    let spec = rule.as_rule().cloned().unwrap_or_default();
    FrontmatterBuilder::new()
        .field("description", rule.description.clone().unwrap_or_default())
        .comma_list("globs", &spec.globs)
        .field("alwaysApply", spec.always_apply)
        .merge_overrides(rule.overrides.get(Platform::Cursor))?
        .render(&rule.body)
}

fn render_persona(persona: &Document) -> Result<String, serde_yaml::Error> {
    let description = match &persona.description {
        Some(description) => format!("Persona {}: {description}", persona.name),
        None => format!("Persona {}", persona.name),
    };
    FrontmatterBuilder::new()
        .field("description", description)
        .field("alwaysApply", false)
        .merge_overrides(persona.overrides.get(Platform::Cursor))?
        .render(&persona.body)
}

/// Cursor commands are plain Markdown; frontmatter appears only through overrides.
fn render_command(command: &Document) -> Result<String, serde_yaml::Error> {
    let spec = command.as_command().cloned().unwrap_or_default();
    let mut body = String::new();
    if let Some(description) = &command.description {
        let _ = writeln!(body, "{description}\n");
    }
    body.push_str(command.body.trim_end());
    if let Some(execute) = spec.execute.as_deref().filter(|e| !e.trim().is_empty()) {
        let _ = write!(body, "\n\nRun:\n\n```sh\n{}\n```", execute.trim());
    }

    FrontmatterBuilder::new()
        .merge_overrides(command.overrides.get(Platform::Cursor))?
        .render(body.trim_start())
}
