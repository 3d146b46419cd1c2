//! Layer merge logic
//!
//! Keys are flat and dot-namespaced, so merging is per key:
//! - A key present in a later layer overrides the same key from earlier ones
//! - Keys only present in earlier layers are kept
//! - Nothing is merged wholesale per layer or per namespace

use std::collections::BTreeMap;

use crate::model::{ConfigKey, ConfigLayer, ConfigValue};

/// A merged value and the layer that supplied it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEntry {
    pub value: ConfigValue,
    pub origin: String,
}

/// Merged key/value set, ordered by key
pub type Merged = BTreeMap<ConfigKey, MergedEntry>;

/// Apply one layer over an existing merged set (last write wins per key)
pub fn overlay(mut merged: Merged, layer: &ConfigLayer) -> Merged {
    for (key, value) in layer.iter() {
        merged.insert(
            key.clone(),
            MergedEntry {
                value: value.clone(),
                origin: layer.name().to_string(),
            },
        );
    }
    merged
}

/// Merge layers in order (first is lowest precedence, last is highest)
pub fn merge_layers<'a, I>(layers: I) -> Merged
where
    I: IntoIterator<Item = &'a ConfigLayer>,
{
    layers.into_iter().fold(Merged::new(), overlay)
}
