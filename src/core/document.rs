//! The typed document model.
//!
//! A [`Document`] is one parsed rule, persona, command or hook. The common
//! envelope (name, description, targets, condition, provenance, body) is shared
//! by every kind; kind-specific metadata lives in the [`DocumentSpec`] tagged
//! union so generic orchestration code works on the envelope while validation
//! and generation match exhaustively on the kind.
//!
//! The raw metadata record a document was built from is kept alongside the typed
//! view. Persona inheritance merges raw records and re-derives the typed view,
//! which keeps "field absent" distinguishable from "field set to its default".

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::platform::{Platform, PlatformSet};
use crate::utils::suggest;

/// Raw metadata record as written in a document's metadata block.
///
/// Keys are kept sorted so that merged records serialize deterministically.
pub type Metadata = BTreeMap<String, serde_yaml::Value>;

/// The four kinds of guidance document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Rule,
    Persona,
    Command,
    Hook,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] =
        [DocumentKind::Rule, DocumentKind::Persona, DocumentKind::Command, DocumentKind::Hook];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Rule => "rule",
            DocumentKind::Persona => "persona",
            DocumentKind::Command => "command",
            DocumentKind::Hook => "hook",
        }
    }

    /// Plural form, used for source directory names and listings.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            DocumentKind::Rule => "rules",
            DocumentKind::Persona => "personas",
            DocumentKind::Command => "commands",
            DocumentKind::Hook => "hooks",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the singular or plural form, case-insensitively.
impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        DocumentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized || k.plural() == normalized)
            .ok_or_else(|| choice_error("document kind", s, DocumentKind::ALL.iter().map(|k| k.as_str())))
    }
}

/// Where a document came from. Used only for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Provenance {
    /// Name of the source the document was loaded from.
    pub source: String,
    /// Path of the document relative to the source root.
    pub path: PathBuf,
}

impl Provenance {
    pub fn new(source: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            source: source.into(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.path.display())
    }
}

/// Rule importance. Generators order rules by priority, most important first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Critical, Priority::High, Priority::Medium, Priority::Low];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Priority::ALL.into_iter().find(|p| p.as_str() == normalized).ok_or_else(|| {
            choice_error("priority", s, Priority::ALL.iter().map(|p| p.as_str()))
        })
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

/// Lifecycle events a hook can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    Notification,
    Stop,
    SubagentStop,
    PreCompact,
    SessionStart,
    SessionEnd,
}

impl HookEvent {
    pub const ALL: [HookEvent; 9] = [
        HookEvent::PreToolUse,
        HookEvent::PostToolUse,
        HookEvent::UserPromptSubmit,
        HookEvent::Notification,
        HookEvent::Stop,
        HookEvent::SubagentStop,
        HookEvent::PreCompact,
        HookEvent::SessionStart,
        HookEvent::SessionEnd,
    ];

    /// The PascalCase event name, as Claude Code spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::UserPromptSubmit => "UserPromptSubmit",
            HookEvent::Notification => "Notification",
            HookEvent::Stop => "Stop",
            HookEvent::SubagentStop => "SubagentStop",
            HookEvent::PreCompact => "PreCompact",
            HookEvent::SessionStart => "SessionStart",
            HookEvent::SessionEnd => "SessionEnd",
        }
    }

    /// The snake_case spelling used in generic documents.
    #[must_use]
    pub const fn snake_name(self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "pre_tool_use",
            HookEvent::PostToolUse => "post_tool_use",
            HookEvent::UserPromptSubmit => "user_prompt_submit",
            HookEvent::Notification => "notification",
            HookEvent::Stop => "stop",
            HookEvent::SubagentStop => "subagent_stop",
            HookEvent::PreCompact => "pre_compact",
            HookEvent::SessionStart => "session_start",
            HookEvent::SessionEnd => "session_end",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = String;

    /// Accepts `pre_tool_use`, `pre-tool-use` and `PreToolUse` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        HookEvent::ALL
            .into_iter()
            .find(|event| event.as_str().to_ascii_lowercase() == key)
            .ok_or_else(|| choice_error("event", s, HookEvent::ALL.iter().map(|e| e.snake_name())))
    }
}

impl Serialize for HookEvent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HookEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

fn choice_error<'a>(field: &str, value: &str, choices: impl Iterator<Item = &'a str> + Clone) -> String {
    let listed: Vec<&str> = choices.clone().collect();
    let mut message = format!(
        "invalid {field} '{}', expected one of: {}",
        value.trim(),
        listed.join(", ")
    );
    if let Some(suggestion) = suggest(&value.trim().to_ascii_lowercase(), choices) {
        message.push_str(&format!(" (did you mean '{suggestion}'?)"));
    }
    message
}

/// Accept either a single string or a list of strings.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Repr>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Repr::One(value)) => vec![value],
        Some(Repr::Many(values)) => values,
    })
}

/// Accept a list of strings or a single comma-separated string.
fn comma_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = one_or_many(deserializer)?;
    Ok(values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect())
}

/// Metadata specific to rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// File globs the rule applies to. Empty means "not file-scoped".
    #[serde(default, deserialize_with = "one_or_many")]
    pub globs: Vec<String>,
    /// Whether the rule is always loaded regardless of the files in play.
    #[serde(default, alias = "alwaysApply")]
    pub always_apply: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Names of other rules this rule expects to be present.
    #[serde(default, deserialize_with = "comma_list")]
    pub requires: Vec<String>,
}

/// Metadata specific to personas (sub-agents).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaSpec {
    /// Canonical tool names the persona may use.
    #[serde(default, deserialize_with = "comma_list")]
    pub tools: Vec<String>,
    /// Model alias (`opus`, `sonnet`, `haiku`, `inherit`) or a literal model id.
    #[serde(default)]
    pub model: Option<String>,
    /// Name of the parent persona.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// One declared argument of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandArg {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl<'de> Deserialize<'de> for CommandArg {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Full {
                name: String,
                #[serde(default)]
                description: Option<String>,
                #[serde(default)]
                required: bool,
                #[serde(default)]
                default: Option<String>,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Name(name) => CommandArg {
                name,
                description: None,
                required: false,
                default: None,
            },
            Repr::Full {
                name,
                description,
                required,
                default,
            } => CommandArg {
                name,
                description,
                required,
                default,
            },
        })
    }
}

/// Metadata specific to commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Opaque shell command passed through to the generated output. Never run.
    #[serde(default)]
    pub execute: Option<String>,
    #[serde(default)]
    pub args: Vec<CommandArg>,
    /// Canonical tool names the command may use.
    #[serde(default, deserialize_with = "comma_list")]
    pub tools: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, alias = "argumentHint", alias = "argument-hint")]
    pub argument_hint: Option<String>,
}

impl CommandSpec {
    /// The explicit argument hint, or one derived from the declared arguments.
    pub fn effective_argument_hint(&self) -> Option<String> {
        if let Some(hint) = &self.argument_hint {
            return Some(hint.clone());
        }
        if self.args.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.required {
                    format!("<{}>", arg.name)
                } else {
                    format!("[{}]", arg.name)
                }
            })
            .collect();
        Some(parts.join(" "))
    }
}

/// Metadata specific to hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSpec {
    pub event: HookEvent,
    /// Tool-name pattern the hook is restricted to.
    #[serde(default, alias = "toolMatch", alias = "matcher")]
    pub tool_match: Option<String>,
    /// Opaque shell command passed through to the generated output. Never run.
    #[serde(alias = "command")]
    pub execute: String,
    /// Timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u32>,
}

/// Kind-specific metadata, one variant per [`DocumentKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocumentSpec {
    Rule(RuleSpec),
    Persona(PersonaSpec),
    Command(CommandSpec),
    Hook(HookSpec),
}

impl DocumentSpec {
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        match self {
            DocumentSpec::Rule(_) => DocumentKind::Rule,
            DocumentSpec::Persona(_) => DocumentKind::Persona,
            DocumentSpec::Command(_) => DocumentKind::Command,
            DocumentSpec::Hook(_) => DocumentKind::Hook,
        }
    }

    /// Derive the typed view of `kind` from a raw metadata record.
    ///
    /// Unknown keys are ignored; defaults apply to absent optional fields.
    pub fn from_metadata(kind: DocumentKind, metadata: &Metadata) -> Result<Self, serde_yaml::Error> {
        let value = serde_yaml::to_value(metadata)?;
        Ok(match kind {
            DocumentKind::Rule => DocumentSpec::Rule(serde_yaml::from_value(value)?),
            DocumentKind::Persona => DocumentSpec::Persona(serde_yaml::from_value(value)?),
            DocumentKind::Command => DocumentSpec::Command(serde_yaml::from_value(value)?),
            DocumentKind::Hook => DocumentSpec::Hook(serde_yaml::from_value(value)?),
        })
    }
}

/// Per-platform extension blocks (`claude:`, `cursor:`, `opencode:` keys).
///
/// Each block is merged into that platform's generated output last, so it can
/// add platform-only fields or override generated ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlatformOverrides(BTreeMap<Platform, serde_json::Map<String, serde_json::Value>>);

impl PlatformOverrides {
    pub fn get(&self, platform: Platform) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.0.get(&platform)
    }

    pub fn insert(&mut self, platform: Platform, block: serde_json::Map<String, serde_json::Value>) {
        self.0.insert(platform, block);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.0.keys().copied()
    }
}

/// One parsed rule, persona, command or hook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Unique within kind and source. Join key for `extends`, `requires` and
    /// output file names.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub spec: DocumentSpec,
    /// Source text of the `when:` expression, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub targets: PlatformSet,
    #[serde(skip_serializing_if = "PlatformOverrides::is_empty")]
    pub overrides: PlatformOverrides,
    /// The raw record the typed fields were derived from.
    #[serde(skip)]
    pub metadata: Metadata,
    pub body: String,
    pub provenance: Provenance,
}

impl Document {
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        self.spec.kind()
    }

    /// A copy of this document with a different body.
    ///
    /// Resolution stages never modify a document in place; each returns new values.
    #[must_use]
    pub fn with_body(&self, body: String) -> Self {
        Self {
            body,
            ..self.clone()
        }
    }

    pub fn is_eligible_for(&self, platform: Platform) -> bool {
        self.targets.contains(platform)
    }

    pub fn as_rule(&self) -> Option<&RuleSpec> {
        match &self.spec {
            DocumentSpec::Rule(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_persona(&self) -> Option<&PersonaSpec> {
        match &self.spec {
            DocumentSpec::Persona(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_command(&self) -> Option<&CommandSpec> {
        match &self.spec {
            DocumentSpec::Command(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_hook(&self) -> Option<&HookSpec> {
        match &self.spec {
            DocumentSpec::Hook(spec) => Some(spec),
            _ => None,
        }
    }

    /// `kind 'name' (source:path)`, for messages.
    pub fn label(&self) -> String {
        format!("{} '{}' ({})", self.kind(), self.name, self.provenance)
    }
}
