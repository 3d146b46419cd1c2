//! Opaque credential handles
//!
//! Signing credentials are references into an external secret store
//! (`env:NAME`, `file:PATH`, `keychain:item`). The resolver never
//! dereferences them; the build tool does.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use super::ConfigKey;

/// Placeholder shown wherever a secret would otherwise be printed
pub const REDACTED: &str = "[REDACTED]";

/// Key fragments that mark a value as secret
const SECRET_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "private_key",
    "privatekey",
    "api_key",
    "apikey",
    "credential",
];

/// Keys whose values are credentials.
///
/// A key is secret when it is declared as a signing credential or when one
/// of its segments looks like a secret name (`storePassword`, `apiToken`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretKeys {
    declared: BTreeSet<ConfigKey>,
}

impl SecretKeys {
    pub fn new<I: IntoIterator<Item = ConfigKey>>(declared: I) -> Self {
        Self {
            declared: declared.into_iter().collect(),
        }
    }

    pub fn contains(&self, key: &ConfigKey) -> bool {
        self.declared.contains(key) || is_secret_name(key)
    }
}

fn is_secret_name(key: &ConfigKey) -> bool {
    key.segments().any(|segment| {
        let lower = segment.to_lowercase();
        SECRET_KEYS.iter().any(|s| lower.contains(s))
    })
}

/// Reference to a credential held outside the configuration.
///
/// Serializes as its handle text; literals serialize as [`REDACTED`].
#[derive(Clone, PartialEq, Eq)]
pub enum SecretRef {
    /// Environment variable holding the credential
    Env { name: String },
    /// File whose contents are the credential
    File { path: String },
    /// Named entry in some other store (keychain, vault, ...)
    Store { store: String, name: String },
    /// A literal credential embedded in configuration
    Literal { value: String },
}

impl SecretRef {
    /// Parse a handle. Anything without a `scheme:` prefix is a literal.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some(("env", name)) if !name.is_empty() => SecretRef::Env {
                name: name.to_string(),
            },
            Some(("file", path)) if !path.is_empty() => SecretRef::File {
                path: path.to_string(),
            },
            Some((store, name)) if is_scheme(store) && !name.is_empty() => SecretRef::Store {
                store: store.to_string(),
                name: name.to_string(),
            },
            _ => SecretRef::Literal {
                value: raw.to_string(),
            },
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, SecretRef::Literal { .. })
    }

    /// Handle text safe to print; literals are redacted
    pub fn display_handle(&self) -> String {
        match self {
            SecretRef::Env { name } => format!("env:{}", name),
            SecretRef::File { path } => format!("file:{}", path),
            SecretRef::Store { store, name } => format!("{}:{}", store, name),
            SecretRef::Literal { .. } => REDACTED.to_string(),
        }
    }
}

fn is_scheme(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && s.chars().next().is_some_and(|c| c.is_ascii_lowercase())
}

impl fmt::Debug for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretRef({})", self.display_handle())
    }
}

impl Serialize for SecretRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display_handle())
    }
}

impl<'de> Deserialize<'de> for SecretRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SecretRef::parse(&raw))
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_handle())
    }
}
