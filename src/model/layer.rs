//! Configuration layers
//!
//! A layer is one named source of key/value pairs (the base declaration,
//! a build-type overlay, CLI overrides). Layers are pure data.

use std::collections::HashSet;
use std::fmt;

use super::{ConfigKey, ConfigValue, SecretKeys, REDACTED};
use crate::error::{ResolveError, ResolveResult};

/// Ordered, immutable mapping from key to value
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    name: String,
    entries: Vec<(ConfigKey, ConfigValue)>,
}

impl ConfigLayer {
    /// Start building a layer
    pub fn builder(name: impl Into<String>) -> LayerBuilder {
        LayerBuilder {
            name: name.into(),
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Build a layer from raw `(key, value)` pairs, rejecting duplicates
    pub fn from_entries<K, V, I>(name: impl Into<String>, entries: I) -> ResolveResult<Self>
    where
        K: AsRef<str>,
        V: Into<ConfigValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        entries
            .into_iter()
            .try_fold(Self::builder(name), |builder, (k, v)| builder.set(k.as_ref(), v))
            .map(LayerBuilder::build)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&ConfigKey, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder enforcing per-layer key uniqueness
pub struct LayerBuilder {
    name: String,
    entries: Vec<(ConfigKey, ConfigValue)>,
    seen: HashSet<ConfigKey>,
}

impl LayerBuilder {
    /// Add a key; fails if the key is malformed or already declared
    pub fn set(self, key: &str, value: impl Into<ConfigValue>) -> ResolveResult<Self> {
        let key = ConfigKey::parse(key)?;
        self.insert(key, value.into())
    }

    /// Add an already-parsed key
    pub fn insert(mut self, key: ConfigKey, value: ConfigValue) -> ResolveResult<Self> {
        if !self.seen.insert(key.clone()) {
            return Err(ResolveError::DuplicateKeyInLayer {
                layer: self.name,
                key,
            });
        }
        self.entries.push((key, value));
        Ok(self)
    }

    pub fn build(self) -> ConfigLayer {
        ConfigLayer {
            name: self.name,
            entries: self.entries,
        }
    }
}

/// Debug view of entries; secret-named keys are redacted
struct Entries<'a>(&'a [(ConfigKey, ConfigValue)]);

impl fmt::Debug for Entries<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secrets = SecretKeys::default();
        f.debug_map()
            .entries(self.0.iter().map(|(key, value)| {
                let shown = if secrets.contains(key) {
                    REDACTED.to_string()
                } else {
                    format!("{:?}", value)
                };
                (key.as_str(), shown)
            }))
            .finish()
    }
}

impl fmt::Debug for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLayer")
            .field("name", &self.name)
            .field("entries", &Entries(&self.entries))
            .finish()
    }
}

impl fmt::Debug for LayerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerBuilder")
            .field("name", &self.name)
            .field("entries", &Entries(&self.entries))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_order() {
        let layer = ConfigLayer::builder("base")
            .set("applicationId", "com.example.app")
            .unwrap()
            .set("minSdk", 24)
            .unwrap()
            .set("multiDexEnabled", true)
            .unwrap()
            .build();

        let keys: Vec<&str> = layer.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["applicationId", "minSdk", "multiDexEnabled"]);
        assert_eq!(layer.get("minSdk"), Some(&ConfigValue::Integer(24)));
        assert_eq!(layer.name(), "base");
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = ConfigLayer::builder("base")
            .set("minSdk", 21)
            .unwrap()
            .set("minSdk", 24)
            .unwrap_err();

        assert_eq!(
            err,
            ResolveError::DuplicateKeyInLayer {
                layer: "base".to_string(),
                key: ConfigKey::parse("minSdk").unwrap(),
            }
        );
    }

    #[test]
    fn test_from_entries_duplicate() {
        let result = ConfigLayer::from_entries("debug", [("a", "1"), ("b", "2"), ("a", "3")]);
        assert!(matches!(
            result,
            Err(ResolveError::DuplicateKeyInLayer { ref layer, .. }) if layer == "debug"
        ));
    }

    #[test]
    fn test_debug_redacts_secret_names() {
        let layer = ConfigLayer::from_entries(
            "release",
            [("signing.storePassword", "hunter2"), ("signing.keyAlias", "upload")],
        )
        .unwrap();
        let debug = format!("{:?}", layer);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("upload"));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let result = ConfigLayer::builder("base").set("bad key", "x");
        assert!(matches!(result, Err(ResolveError::InvalidKey(_))));
    }
}
