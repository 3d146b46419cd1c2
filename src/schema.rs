//! Resolution schema: required keys and signing identity groups

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ResolveResult;
use crate::model::{ConfigKey, SecretKeys};

/// Field names of a signing group, relative to its prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningFields {
    #[serde(default = "default_store_path")]
    pub store_path: String,
    #[serde(default = "default_store_credential")]
    pub store_credential: String,
    #[serde(default = "default_key_alias")]
    pub key_alias: String,
    #[serde(default = "default_key_credential")]
    pub key_credential: String,
}

fn default_store_path() -> String {
    "storePath".to_string()
}

fn default_store_credential() -> String {
    "storePassword".to_string()
}

fn default_key_alias() -> String {
    "keyAlias".to_string()
}

fn default_key_credential() -> String {
    "keyPassword".to_string()
}

impl Default for SigningFields {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            store_credential: default_store_credential(),
            key_alias: default_key_alias(),
            key_credential: default_key_credential(),
        }
    }
}

/// A group of four keys forming one signing identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningGroup {
    /// Namespace the four fields live under (e.g. `signing.release`)
    pub prefix: String,

    #[serde(flatten)]
    pub fields: SigningFields,
}

impl SigningGroup {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            fields: SigningFields::default(),
        }
    }

    /// Fully-qualified keys in fixed order:
    /// store path, store credential, key alias, key credential
    pub fn keys(&self) -> ResolveResult<[ConfigKey; 4]> {
        Ok([
            ConfigKey::join(&self.prefix, &self.fields.store_path)?,
            ConfigKey::join(&self.prefix, &self.fields.store_credential)?,
            ConfigKey::join(&self.prefix, &self.fields.key_alias)?,
            ConfigKey::join(&self.prefix, &self.fields.key_credential)?,
        ])
    }

    /// Store and key credential keys
    pub fn credential_keys(&self) -> ResolveResult<[ConfigKey; 2]> {
        Ok([
            ConfigKey::join(&self.prefix, &self.fields.store_credential)?,
            ConfigKey::join(&self.prefix, &self.fields.key_credential)?,
        ])
    }
}

/// Which keys must exist and which keys form signing identities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub required: Vec<ConfigKey>,

    /// Signing groups by name
    #[serde(default)]
    pub signing: BTreeMap<String, SigningGroup>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, key: &str) -> ResolveResult<Self> {
        self.required.push(ConfigKey::parse(key)?);
        Ok(self)
    }

    pub fn with_signing_group(mut self, name: impl Into<String>, group: SigningGroup) -> Self {
        self.signing.insert(name.into(), group);
        self
    }

    /// Every credential key declared by a signing group, plus secret-looking names
    pub fn secret_keys(&self) -> ResolveResult<SecretKeys> {
        let mut declared = Vec::new();
        for group in self.signing.values() {
            declared.extend(group.credential_keys()?);
        }
        Ok(SecretKeys::new(declared))
    }
}
