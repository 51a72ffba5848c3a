//! Project configuration (`rulesmith.toml`).
//!
//! The configuration file marks the project root. It is found by walking up
//! from the working directory, and every relative path in it is resolved
//! against the directory that contains it.
//!
//! ```toml
//! [project]
//! name = "storefront"            # default: the project directory name
//! targets = ["claude", "cursor"] # default: every platform
//! strict = false                 # warnings fail the build when true
//! infer_names = true             # a document without `name` uses its file stem
//! output = "."                   # where artifacts are written
//!
//! [[sources]]
//! name = "team"
//! path = "~/shared/rules"        # `~` and `$VAR` are expanded
//!
//! [[sources]]
//! name = "local"
//! path = ".rulesmith"
//!
//! [vars]
//! strict_types = true            # available to conditions as `var:strict_types`
//! ```
//!
//! Without `[[sources]]`, a single source named `local` at `.rulesmith` is used.
//! Source order matters: documents are processed in that order.
//!
//! The `RULESMITH_STRICT` environment variable overrides `project.strict`.

mod parser;

pub use parser::{parse_config, parse_config_str};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::condition::FactValue;
use crate::constants::{CONFIG_FILE_NAME, DEFAULT_SOURCE_DIR, STRICT_ENV_VAR};
use crate::core::{PlatformSet, RulesmithError};
use crate::metadata::ParseOptions;
use crate::resolver::ResolveOptions;
use crate::source::SourceDescriptor;
use crate::utils::{find_upwards, resolve_path};

const DEFAULT_SOURCE_NAME: &str = "local";

/// The `[project]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_true")]
    pub infer_names: bool,
    #[serde(default)]
    pub output: Option<String>,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: None,
            targets: Vec::new(),
            strict: false,
            infer_names: true,
            output: None,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// One `[[sources]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub name: String,
    pub path: String,
}

/// The file as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
    #[serde(default)]
    pub vars: toml::Table,
}

/// A loaded configuration anchored at its project root.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory containing the configuration file.
    pub root: PathBuf,
    pub file: ConfigFile,
}

impl Config {
    /// Find `rulesmith.toml` in `start` or a parent and load it.
    pub fn discover(start: &Path) -> Result<Self> {
        let path = find_upwards(start, CONFIG_FILE_NAME).ok_or_else(|| RulesmithError::ConfigNotFound {
            searched_from: start.display().to_string(),
        })?;
        Self::load(&path)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let file: ConfigFile = parse_config(path)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        debug!("Loaded configuration from {}", path.display());
        Self::from_file(file, root, path)
    }

    /// Parse configuration text as if it were a file in `root`.
    pub fn parse(content: &str, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let path = root.join(CONFIG_FILE_NAME);
        let file: ConfigFile = parse_config_str(content, &path)?;
        Self::from_file(file, root, &path)
    }

    /// Configuration for a project that has no file: defaults rooted at `root`.
    pub fn default_for(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file: ConfigFile::default(),
        }
    }

    fn from_file(file: ConfigFile, root: PathBuf, path: &Path) -> Result<Self> {
        let config = Self {
            root,
            file,
        };
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| RulesmithError::ConfigParseError {
            file: path.display().to_string(),
            reason,
        };

        let mut seen = HashSet::new();
        for source in &self.file.sources {
            if source.name.trim().is_empty() {
                return Err(invalid("source name must not be empty".to_string()).into());
            }
            if !seen.insert(source.name.as_str()) {
                return Err(invalid(format!("source '{}' is declared more than once", source.name)).into());
            }
        }
        self.targets()?;
        Ok(())
    }

    /// `project.name`, else the name of the project directory.
    pub fn project_name(&self) -> String {
        self.file.project.name.clone().unwrap_or_else(|| {
            self.root.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
        })
    }

    /// Configured targets; an empty list means every platform.
    pub fn targets(&self) -> Result<PlatformSet, RulesmithError> {
        if self.file.project.targets.is_empty() {
            return Ok(PlatformSet::all());
        }
        PlatformSet::parse_ids(self.file.project.targets.iter().map(String::as_str))
    }

    /// Strict mode, with `RULESMITH_STRICT` taking precedence.
    pub fn strict(&self) -> bool {
        match std::env::var(STRICT_ENV_VAR) {
            Ok(value) => match parse_flag(&value) {
                Some(flag) => flag,
                None => {
                    warn!("Ignoring {STRICT_ENV_VAR}={value}: expected true/false or 1/0");
                    self.file.project.strict
                }
            },
            Err(_) => self.file.project.strict,
        }
    }

    /// Where artifacts are written.
    pub fn output_dir(&self) -> Result<PathBuf> {
        match &self.file.project.output {
            Some(output) => self.resolve(output),
            None => Ok(self.root.clone()),
        }
    }

    /// Source directories in declaration order, with paths resolved.
    pub fn source_descriptors(&self) -> Result<Vec<SourceDescriptor>> {
        if self.file.sources.is_empty() {
            return Ok(vec![SourceDescriptor::new(DEFAULT_SOURCE_NAME, self.root.join(DEFAULT_SOURCE_DIR))]);
        }
        self.file
            .sources
            .iter()
            .map(|source| Ok(SourceDescriptor::new(source.name.clone(), self.resolve(&source.path)?)))
            .collect()
    }

    /// `[vars]` as fact values. Tables and arrays cannot be facts and are skipped.
    pub fn fact_vars(&self) -> BTreeMap<String, FactValue> {
        let mut vars = BTreeMap::new();
        for (key, value) in &self.file.vars {
            match FactValue::from_toml(value) {
                Some(fact) => {
                    vars.insert(key.clone(), fact);
                }
                None => warn!("Ignoring [vars] entry '{key}': only strings, numbers and booleans are supported"),
            }
        }
        vars
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            parse: ParseOptions {
                infer_names: self.file.project.infer_names,
            },
            strict: self.strict(),
            project_name: self.project_name(),
            project_root: self.root.clone(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let expanded = resolve_path(path)?;
        Ok(if expanded.is_absolute() {
            expanded
        } else {
            self.root.join(expanded)
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
