//! Tool and model vocabulary per platform.
//!
//! Documents name tools canonically (`read`, `web_fetch`, ...) but the Claude
//! spellings (`Read`, `WebFetch`) are accepted too; matching ignores case,
//! `_` and `-`. Model aliases are `opus`, `sonnet`, `haiku` and `inherit`;
//! anything else is treated as a literal model id.

use crate::core::Platform;

/// A tool every platform understands in some form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tool {
    Read,
    Write,
    Edit,
    MultiEdit,
    Bash,
    Grep,
    Glob,
    Ls,
    WebFetch,
    WebSearch,
    Task,
    Todo,
    NotebookEdit,
}

impl Tool {
    pub const ALL: [Tool; 13] = [
        Tool::Read,
        Tool::Write,
        Tool::Edit,
        Tool::MultiEdit,
        Tool::Bash,
        Tool::Grep,
        Tool::Glob,
        Tool::Ls,
        Tool::WebFetch,
        Tool::WebSearch,
        Tool::Task,
        Tool::Todo,
        Tool::NotebookEdit,
    ];

    /// The canonical document spelling.
    #[must_use]
    pub const fn canonical(self) -> &'static str {
        match self {
            Tool::Read => "read",
            Tool::Write => "write",
            Tool::Edit => "edit",
            Tool::MultiEdit => "multi_edit",
            Tool::Bash => "bash",
            Tool::Grep => "grep",
            Tool::Glob => "glob",
            Tool::Ls => "ls",
            Tool::WebFetch => "web_fetch",
            Tool::WebSearch => "web_search",
            Tool::Task => "task",
            Tool::Todo => "todo",
            Tool::NotebookEdit => "notebook_edit",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let key = squash(name);
        Tool::ALL.into_iter().find(|tool| {
            squash(tool.canonical()) == key || squash(tool.claude_name()) == key
        })
    }

    const fn claude_name(self) -> &'static str {
        match self {
            Tool::Read => "Read",
            Tool::Write => "Write",
            Tool::Edit => "Edit",
            Tool::MultiEdit => "MultiEdit",
            Tool::Bash => "Bash",
            Tool::Grep => "Grep",
            Tool::Glob => "Glob",
            Tool::Ls => "LS",
            Tool::WebFetch => "WebFetch",
            Tool::WebSearch => "WebSearch",
            Tool::Task => "Task",
            Tool::Todo => "TodoWrite",
            Tool::NotebookEdit => "NotebookEdit",
        }
    }

    const fn opencode_name(self) -> Option<&'static str> {
        match self {
            Tool::Read => Some("read"),
            Tool::Write => Some("write"),
            Tool::Edit => Some("edit"),
            Tool::MultiEdit => Some("patch"),
            Tool::Bash => Some("bash"),
            Tool::Grep => Some("grep"),
            Tool::Glob => Some("glob"),
            Tool::Ls => Some("list"),
            Tool::WebFetch => Some("webfetch"),
            Tool::Task => Some("task"),
            Tool::Todo => Some("todowrite"),
            Tool::WebSearch | Tool::NotebookEdit => None,
        }
    }

    /// The platform's spelling, or `None` when the platform has no equivalent.
    pub const fn name_for(self, platform: Platform) -> Option<&'static str> {
        match platform {
            Platform::Claude => Some(self.claude_name()),
            Platform::OpenCode => self.opencode_name(),
            Platform::Cursor => None,
        }
    }
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Result of translating a tool list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolMapping {
    /// Platform tool names, in input order, without duplicates.
    pub tools: Vec<String>,
    /// Names that are not known tools. They are passed through verbatim.
    pub unknown: Vec<String>,
    /// Known tools the platform has no equivalent for. They are dropped.
    pub unsupported: Vec<String>,
}

pub fn map_tools(platform: Platform, tools: &[String]) -> ToolMapping {
    let mut mapping = ToolMapping::default();
    for name in tools {
        let mapped = match Tool::parse(name) {
            Some(tool) => match tool.name_for(platform) {
                Some(mapped) => mapped.to_string(),
                None => {
                    mapping.unsupported.push(name.clone());
                    continue;
                }
            },
            None => {
                mapping.unknown.push(name.clone());
                name.clone()
            }
        };
        if !mapping.tools.contains(&mapped) {
            mapping.tools.push(mapped);
        }
    }
    mapping
}

/// Translate a model alias. `None` means the field should be omitted.
pub fn map_model(platform: Platform, model: &str) -> Option<String> {
    let model = model.trim();
    if model.is_empty() {
        return None;
    }
    match platform {
        Platform::Claude => Some(model.to_string()),
        Platform::OpenCode => {
            let id = match model.to_ascii_lowercase().as_str() {
                "inherit" => return None,
                "opus" => "claude-opus-4-1",
                "sonnet" => "claude-sonnet-4-5",
                "haiku" => "claude-haiku-4-5",
                _ if model.contains('/') => return Some(model.to_string()),
                _ => model,
            };
            Some(format!("anthropic/{id}"))
        }
        Platform::Cursor => None,
    }
}
