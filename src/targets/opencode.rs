//! OpenCode output.
//!
//! Rules are inlined into `AGENTS.md`: always-apply rules first, then scoped
//! rules with the files they apply to. Personas become subagents, commands
//! keep their frontmatter, and every hook becomes its own JavaScript plugin.

use std::fmt::Write as _;

use super::emit::FrontmatterBuilder;
use super::vocabulary::{map_model, map_tools};
use super::{Artifact, GenerationOutput, TargetGenerator};
use crate::constants::GENERATED_MARKER;
use crate::core::{Document, HookEvent, HookSpec, Platform};
use crate::resolver::ResolvedContent;

const ENTRY_POINT: &str = "AGENTS.md";
const AGENT_DIR: &str = ".opencode/agent";
const COMMAND_DIR: &str = ".opencode/command";
const PLUGIN_DIR: &str = ".opencode/plugin";

pub struct OpenCodeGenerator;

/// Where a hook attaches in an OpenCode plugin.
enum PluginHook {
    /// A named plugin hook receiving `(input, output)`.
    Tool(&'static str),
    /// A bus event, matched on `event.type` inside the generic `event` hook.
    Event(&'static str),
}

fn plugin_hook(event: HookEvent) -> Option<PluginHook> {
    match event {
        HookEvent::PreToolUse => Some(PluginHook::Tool("tool.execute.before")),
        HookEvent::PostToolUse => Some(PluginHook::Tool("tool.execute.after")),
        HookEvent::SessionStart => Some(PluginHook::Event("session.created")),
        HookEvent::Stop => Some(PluginHook::Event("session.idle")),
        HookEvent::PreCompact => Some(PluginHook::Event("session.compacted")),
        HookEvent::UserPromptSubmit
        | HookEvent::Notification
        | HookEvent::SubagentStop
        | HookEvent::SessionEnd => None,
    }
}

impl TargetGenerator for OpenCodeGenerator {
    fn platform(&self) -> Platform {
        Platform::OpenCode
    }

    fn generate(&self, content: &ResolvedContent) -> GenerationOutput {
        let mut output = GenerationOutput::new();

        if !content.rules.is_empty() {
            output.add_aggregate(Artifact::text(ENTRY_POINT, render_entry_point(content)));
        }
        for persona in &content.personas {
            match render_persona(persona, &mut output) {
                Ok(text) => output.add(persona, Artifact::text(format!("{AGENT_DIR}/{}.md", persona.name), text)),
                Err(e) => output.fail(persona, e),
            }
        }
        for command in &content.commands {
            match render_command(command) {
                Ok(text) => {
                    output.add(command, Artifact::text(format!("{COMMAND_DIR}/{}.md", command.name), text));
                }
                Err(e) => output.fail(command, e),
            }
        }
        for hook in &content.hooks {
            let Some(spec) = hook.as_hook() else {
                continue;
            };
            let Some(target) = plugin_hook(spec.event) else {
                output.warn(
                    hook,
                    format!("{} skipped: OpenCode has no equivalent of the {} event", hook.label(), spec.event),
                );
                continue;
            };
            match render_plugin(hook, spec, &target) {
                Ok(text) => output.add(hook, Artifact::text(format!("{PLUGIN_DIR}/{}.js", hook.name), text)),
                Err(e) => output.fail(hook, e),
            }
        }

        output
    }
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

    for rule in always.iter().chain(&scoped) {
        let _ = write!(text, "\n## {}\n\n", rule.name);
        if let Some(description) = &rule.description {
            let _ = writeln!(text, "{description}\n");
        }
        let globs = rule.as_rule().map(|s| s.globs.as_slice()).unwrap_or_default();
        if !globs.is_empty() {
            let listed: Vec<String> = globs.iter().map(|g| format!("`{g}`")).collect();
            let _ = writeln!(text, "_Applies to: {}_\n", listed.join(", "));
        }
        let body = rule.body.trim();
        if !body.is_empty() {
            let _ = writeln!(text, "{body}");
        }
    }
    text
}

fn render_persona(persona: &Document, output: &mut GenerationOutput) -> Result<String, serde_yaml::Error> {
    let spec = persona.as_persona().cloned().unwrap_or_default();
    let tools = map_tools(Platform::OpenCode, &spec.tools);
    if !tools.unknown.is_empty() || !tools.unsupported.is_empty() {
        let mut problems = Vec::new();
        if !tools.unknown.is_empty() {
            problems.push(format!("unknown tool(s) {} passed through", tools.unknown.join(", ")));
        }
        if !tools.unsupported.is_empty() {
            problems.push(format!("tool(s) {} not available in OpenCode", tools.unsupported.join(", ")));
        }
        output.warn(persona, format!("{}: {}", persona.label(), problems.join("; ")));
    }

    let mut builder = FrontmatterBuilder::new()
        .field("description", persona.description.clone().unwrap_or_else(|| persona.name.clone()))
        .field("mode", "subagent")
        .optional("model", spec.model.as_deref().and_then(|m| map_model(Platform::OpenCode, m)));
    if !tools.tools.is_empty() {
        let mut map = serde_yaml::Mapping::new();
        for tool in &tools.tools {
            map.insert(tool.as_str().into(), true.into());
        }
        builder = builder.field("tools", serde_yaml::Value::Mapping(map));
    }
    builder.merge_overrides(persona.overrides.get(Platform::OpenCode))?.render(&persona.body)
}

fn render_command(command: &Document) -> Result<String, serde_yaml::Error> {
    let spec = command.as_command().cloned().unwrap_or_default();
    let agent = command.metadata.get("agent").and_then(|v| v.as_str());

    let mut body = command.body.trim_end().to_string();
    if let Some(execute) = spec.execute.as_deref().filter(|e| !e.trim().is_empty()) {
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        let _ = write!(body, "!`{}`", execute.trim());
    }

    FrontmatterBuilder::new()
        .optional("description", command.description.as_deref())
        .optional("agent", agent)
        .optional("model", spec.model.as_deref().and_then(|m| map_model(Platform::OpenCode, m)))
        .merge_overrides(command.overrides.get(Platform::OpenCode))?
        .render(&body)
}

fn js_string(value: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

fn render_plugin(hook: &Document, spec: &HookSpec, target: &PluginHook) -> Result<String, serde_json::Error> {
    let command = js_string(&spec.execute)?;
    let export = plugin_export_name(&hook.name);

    let mut text = String::new();
    let _ = writeln!(text, "// Generated by rulesmith from {}. Edit the source and rebuild.", hook.provenance);
    let _ = writeln!(text, "export const {export} = async ({{ $ }}) => {{");
    text.push_str("  return {\n");
    match target {
        PluginHook::Tool(name) => {
            let _ = writeln!(text, "    \"{name}\": async (input) => {{");
            if let Some(matcher) = spec.tool_match.as_deref().filter(|m| !m.trim().is_empty()) {
                let _ = writeln!(text, "      if (!new RegExp({}, \"i\").test(input.tool)) return;", js_string(matcher)?);
            }
        }
        PluginHook::Event(name) => {
            text.push_str("    event: async ({ event }) => {\n");
            let _ = writeln!(text, "      if (event.type !== \"{name}\") return;");
        }
    }
    let _ = writeln!(text, "      await $`sh -c ${{{command}}}`;");
    text.push_str("    },\n  };\n};\n");
    Ok(text)
}

/// `format-on-save` -> `FormatOnSavePlugin`.
fn plugin_export_name(name: &str) -> String {
    let mut export = String::new();
    for part in name.split(|c: char| !c.is_ascii_alphanumeric()).filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            export.push(first.to_ascii_uppercase());
            export.push_str(chars.as_str());
        }
    }
    if export.is_empty() || export.starts_with(|c: char| c.is_ascii_digit()) {
        export.insert_str(0, "Hook");
    }
    export.push_str("Plugin");
    export
}
