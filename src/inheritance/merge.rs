//! Field and body merging along an inheritance chain.

use serde_yaml::Value;

use crate::constants::INHERITANCE_BODY_SEPARATOR;
use crate::core::{Metadata, Platform};

/// Shallow-merge `child` over `parent`.
///
/// Child keys replace parent keys wholesale (lists are not concatenated) and
/// absent keys are inherited. Platform extension blocks are the exception:
/// both blocks are mappings, so they are merged key by key with the child
/// winning.
pub fn merge_metadata(parent: &Metadata, child: &Metadata) -> Metadata {
    let mut merged = parent.clone();
    for (key, value) in child {
        let is_platform_block = Platform::from_id(key).is_some();
        match (merged.get_mut(key), value) {
            (Some(Value::Mapping(base)), Value::Mapping(overlay)) if is_platform_block => {
                for (field, field_value) in overlay {
                    base.insert(field.clone(), field_value.clone());
                }
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Concatenate bodies parent first, skipping empty ones.
pub fn merge_bodies<'a>(bodies: impl IntoIterator<Item = &'a str>) -> String {
    bodies
        .into_iter()
        .map(str::trim_end)
        .filter(|body| !body.trim().is_empty())
        .collect::<Vec<_>>()
        .join(INHERITANCE_BODY_SEPARATOR)
}
