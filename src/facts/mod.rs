//! Project inspection for condition facts.
//!
//! [`ProjectFacts`] reads the package manifests at a project root once and
//! answers `when:` queries from that snapshot. `file:` and `dir:` queries go to
//! disk at evaluation time, relative to the project root, and may use glob
//! patterns. `var:` values come from configuration.
//!
//! Missing manifests are normal. Unreadable or malformed ones are logged and
//! treated as absent so a broken `package.json` never stops a build.

pub mod manifests;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::condition::{Ecosystem, FactContext, FactValue, Namespace};
use crate::utils::normalize_within;

/// Snapshot of a project's manifests plus configured variables.
#[derive(Debug, Clone, Default)]
pub struct ProjectFacts {
    root: PathBuf,
    dependencies: BTreeMap<Ecosystem, BTreeSet<String>>,
    /// Package descriptors in lookup order for `pkg:`.
    packages: Vec<serde_json::Value>,
    vars: BTreeMap<String, FactValue>,
}

impl ProjectFacts {
    /// Inspect `root`. Never fails; unreadable manifests are skipped.
    pub fn collect(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut facts = Self {
            root,
            ..Self::default()
        };

        if let Some(manifest) = facts.read_json("package.json") {
            facts.add(Ecosystem::Npm, manifests::npm(&manifest));
            facts.packages.push(manifest);
        }
        if let Some(manifest) = facts.read_toml("Cargo.toml") {
            facts.add(Ecosystem::Cargo, manifests::cargo(&manifest));
            if let Some(package) = manifest.get("package") {
                facts.push_package(package);
            }
        }
        if let Some(text) = facts.read_text("requirements.txt") {
            facts.add(Ecosystem::Pip, manifests::requirements(&text));
        }
        if let Some(manifest) = facts.read_toml("pyproject.toml") {
            facts.add(Ecosystem::Pip, manifests::pyproject(&manifest));
            if let Some(project) = manifest.get("project") {
                facts.push_package(project);
            }
        }
        if let Some(text) = facts.read_text("go.mod") {
            facts.add(Ecosystem::Go, manifests::go_mod(&text));
        }
        if let Some(manifest) = facts.read_json("composer.json") {
            facts.add(Ecosystem::Composer, manifests::composer(&manifest));
        }
        if let Some(text) = facts.read_text("Gemfile") {
            facts.add(Ecosystem::Gem, manifests::gemfile(&text));
        }
        if let Some(text) = facts.read_text("pubspec.yaml") {
            match serde_yaml::from_str::<serde_yaml::Value>(&text) {
                Ok(manifest) => facts.add(Ecosystem::Pub, manifests::pubspec(&manifest)),
                Err(e) => warn!("Ignoring malformed pubspec.yaml: {e}"),
            }
        }
        if let Some(text) = facts.read_text("pom.xml") {
            facts.add(Ecosystem::Maven, manifests::maven(&text));
        }
        for name in ["build.gradle", "build.gradle.kts"] {
            if let Some(text) = facts.read_text(name) {
                facts.add(Ecosystem::Gradle, manifests::gradle(&text));
            }
        }
        for project in facts.csproj_files() {
            if let Ok(text) = fs::read_to_string(&project) {
                facts.add(Ecosystem::Nuget, manifests::csproj(&text));
            }
        }

        debug!(
            "Collected project facts from {}: {}",
            facts.root.display(),
            facts
                .dependencies
                .iter()
                .map(|(ecosystem, names)| format!("{} {}", names.len(), ecosystem.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        facts
    }

    /// Attach configured `var:` values.
    #[must_use]
    pub fn with_vars(mut self, vars: BTreeMap<String, FactValue>) -> Self {
        self.vars = vars;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Dependency names found for an ecosystem.
    pub fn dependencies(&self, ecosystem: Ecosystem) -> impl Iterator<Item = &str> {
        self.dependencies.get(&ecosystem).into_iter().flat_map(|names| names.iter().map(String::as_str))
    }

    pub fn has_dependency(&self, ecosystem: Ecosystem, name: &str) -> bool {
        let key = match ecosystem {
            Ecosystem::Pip => manifests::normalize_python_name(name),
            Ecosystem::Nuget => name.to_ascii_lowercase(),
            _ => name.to_string(),
        };
        self.dependencies.get(&ecosystem).is_some_and(|names| names.contains(&key))
    }

    fn add(&mut self, ecosystem: Ecosystem, names: BTreeSet<String>) {
        if !names.is_empty() {
            self.dependencies.entry(ecosystem).or_default().extend(names);
        }
    }

    fn push_package(&mut self, table: &toml::Value) {
        match serde_json::to_value(table) {
            Ok(value) => self.packages.push(value),
            Err(e) => debug!("Skipping package table: {e}"),
        }
    }

    fn read_text(&self, name: &str) -> Option<String> {
        let path = self.root.join(name);
        if !path.is_file() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                None
            }
        }
    }

    fn read_json(&self, name: &str) -> Option<serde_json::Value> {
        let text = self.read_text(name)?;
        serde_json::from_str(&text).map_err(|e| warn!("Ignoring malformed {name}: {e}")).ok()
    }

    fn read_toml(&self, name: &str) -> Option<toml::Table> {
        let text = self.read_text(name)?;
        toml::from_str(&text).map_err(|e| warn!("Ignoring malformed {name}: {e}")).ok()
    }

    fn csproj_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "csproj"))
            .collect();
        files.sort();
        files
    }

    /// Dotted-path lookup across package descriptors, first hit wins.
    fn package_field(&self, key: &str) -> Option<FactValue> {
        self.packages.iter().find_map(|package| {
            let value = key.split('.').try_fold(package, |value, part| value.get(part))?;
            FactValue::from_json(value)
        })
    }

    fn path_exists(&self, key: &str, want_dir: bool) -> bool {
        let Some(relative) = normalize_within(Path::new(key)) else {
            debug!("Refusing path fact outside the project: {key}");
            return false;
        };
        let matches_kind = |path: &Path| if want_dir { path.is_dir() } else { path.is_file() };

        if !key.contains(['*', '?', '[']) {
            return matches_kind(&self.root.join(relative));
        }

        let pattern = self.root.join(relative);
        match glob::glob(&pattern.to_string_lossy()) {
            Ok(paths) => paths.filter_map(Result::ok).any(|path| matches_kind(&path)),
            Err(e) => {
                warn!("Invalid glob pattern '{key}': {e}");
                false
            }
        }
    }
}

impl FactContext for ProjectFacts {
    fn resolve(&self, namespace: &str, key: &str) -> Option<FactValue> {
        match Namespace::parse(namespace) {
            Namespace::Dependency(ecosystem) => {
                self.has_dependency(ecosystem, key).then_some(FactValue::Bool(true))
            }
            Namespace::File => self.path_exists(key, false).then_some(FactValue::Bool(true)),
            Namespace::Dir => self.path_exists(key, true).then_some(FactValue::Bool(true)),
            Namespace::Pkg => self.package_field(key),
            Namespace::Var => self.vars.get(key).cloned(),
            Namespace::Unknown(_) => None,
        }
    }
}
