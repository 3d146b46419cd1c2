//! Namespaced configuration keys

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{ResolveError, ResolveResult};

/// Dot-separated configuration key (e.g. `signing.storePath`).
///
/// Segments are non-empty and limited to ASCII alphanumerics, `_` and `-`,
/// which keeps `${key}` placeholder tokens unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Parse and validate a key
    pub fn parse(raw: &str) -> ResolveResult<Self> {
        if raw.is_empty() || !raw.split('.').all(is_valid_segment) {
            return Err(ResolveError::InvalidKey(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Join a namespace prefix and a field name (`signing` + `storePath`)
    pub fn join(prefix: &str, field: &str) -> ResolveResult<Self> {
        if prefix.is_empty() {
            Self::parse(field)
        } else {
            Self::parse(&format!("{}.{}", prefix, field))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the dot-separated segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Strip a namespace prefix, returning the remainder
    pub fn strip_namespace(&self, namespace: &str) -> Option<&str> {
        self.0
            .strip_prefix(namespace)
            .and_then(|rest| rest.strip_prefix('.'))
            .filter(|rest| !rest.is_empty())
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ConfigKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ConfigKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ConfigKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}
