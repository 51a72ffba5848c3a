//! Frontmatter emission.
//!
//! Fields are emitted in the order they were added. Override blocks are applied
//! last: a key already present keeps its position and takes the new value, a new
//! key is appended, and a `null` value removes the key. [`apply_json_overrides`]
//! gives JSON entries (hook commands) the same treatment.

use serde_json::Map;
use serde_yaml::{Mapping, Value};

use crate::markdown::render_with_frontmatter;

/// Apply a platform override block to a JSON object in place.
pub fn apply_json_overrides(
    entry: &mut Map<String, serde_json::Value>,
    overrides: Option<&Map<String, serde_json::Value>>,
) {
    for (key, value) in overrides.into_iter().flatten() {
        if value.is_null() {
            entry.remove(key);
        } else {
            entry.insert(key.clone(), value.clone());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontmatterBuilder {
    fields: Mapping,
}

impl FrontmatterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(Value::from(key), value.into());
        self
    }

    /// Add `key` only when `value` is present.
    #[must_use]
    pub fn optional(self, key: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    /// Add a YAML list, skipped when empty.
    #[must_use]
    pub fn list(self, key: &str, values: &[String]) -> Self {
        if values.is_empty() {
            return self;
        }
        let items: Vec<Value> = values.iter().map(|v| Value::from(v.as_str())).collect();
        self.field(key, Value::Sequence(items))
    }

    /// Add a comma-separated string, skipped when empty.
    #[must_use]
    pub fn comma_list(self, key: &str, values: &[String]) -> Self {
        if values.is_empty() {
            return self;
        }
        self.field(key, values.join(", "))
    }

    /// Apply a platform override block.
    pub fn merge_overrides(
        mut self,
        overrides: Option<&Map<String, serde_json::Value>>,
    ) -> Result<Self, serde_yaml::Error> {
        let Some(overrides) = overrides else {
            return Ok(self);
        };
        for (key, value) in overrides {
            if value.is_null() {
                let key = Value::from(key.as_str());
                self.fields = std::mem::take(&mut self.fields)
                    .into_iter()
                    .filter(|(k, _)| *k != key)
                    .collect();
            } else {
                self.fields.insert(Value::from(key.as_str()), serde_yaml::to_value(value)?);
            }
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The frontmatter YAML without delimiters; empty when there are no fields.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        if self.fields.is_empty() {
            return Ok(String::new());
        }
        serde_yaml::to_string(&self.fields)
    }

    /// A complete Markdown document.
    pub fn render(&self, body: &str) -> Result<String, serde_yaml::Error> {
        Ok(render_with_frontmatter(&self.to_yaml()?, body))
    }
}
