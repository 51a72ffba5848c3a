//! Fact lookup for condition evaluation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar fact value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl FactValue {
    /// Absent facts are false; strings are true when non-empty; numbers when non-zero.
    pub fn is_truthy(&self) -> bool {
        match self {
            FactValue::Bool(value) => *value,
            FactValue::Number(value) => *value != 0.0,
            FactValue::String(value) => !value.is_empty(),
        }
    }

    /// The value as text, for string comparison.
    pub fn as_text(&self) -> String {
        match self {
            FactValue::Bool(value) => value.to_string(),
            FactValue::Number(value) => value.to_string(),
            FactValue::String(value) => value.clone(),
        }
    }

    /// Convert a TOML scalar (from configuration `[vars]`).
    pub fn from_toml(value: &toml::Value) -> Option<Self> {
        match value {
            toml::Value::Boolean(b) => Some(FactValue::Bool(*b)),
            toml::Value::Integer(i) => Some(FactValue::Number(*i as f64)),
            toml::Value::Float(f) => Some(FactValue::Number(*f)),
            toml::Value::String(s) => Some(FactValue::String(s.clone())),
            _ => None,
        }
    }

    /// Convert a JSON scalar (from `package.json`).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(FactValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(FactValue::Number),
            serde_json::Value::String(s) => Some(FactValue::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::String(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::String(value)
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Number(value)
    }
}

/// Source of project facts.
///
/// Implementations are queried only for namespaces the evaluator knows about;
/// returning `None` means the fact is absent.
pub trait FactContext {
    fn resolve(&self, namespace: &str, key: &str) -> Option<FactValue>;
}

impl<T: FactContext + ?Sized> FactContext for &T {
    fn resolve(&self, namespace: &str, key: &str) -> Option<FactValue> {
        (**self).resolve(namespace, key)
    }
}

/// An in-memory fact table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticFacts {
    facts: BTreeMap<(String, String), FactValue>,
}

impl StaticFacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, namespace: &str, key: &str, value: impl Into<FactValue>) {
        self.facts.insert((namespace.to_string(), key.to_string()), value.into());
    }

    #[must_use]
    pub fn with(mut self, namespace: &str, key: &str, value: impl Into<FactValue>) -> Self {
        self.insert(namespace, key, value);
        self
    }

    /// Mark a dependency (or file, or directory) as present.
    #[must_use]
    pub fn with_present(self, namespace: &str, key: &str) -> Self {
        self.with(namespace, key, true)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl FactContext for StaticFacts {
    fn resolve(&self, namespace: &str, key: &str) -> Option<FactValue> {
        self.facts.get(&(namespace.to_string(), key.to_string())).cloned()
    }
}
