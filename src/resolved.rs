//! Resolved variant configuration
//!
//! A [`ResolvedConfig`] is the frozen output for exactly one variant: the
//! flat, fully-substituted key/value set plus where each value came from.
//! Consumers only read it; rendering helpers produce the forms handed to
//! the build tool (JSON report, environment variables, manifest placeholders).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::model::{ConfigKey, ConfigValue, SecretKeys, SecretRef, SigningIdentity, REDACTED};
use crate::resolver::Merged;

/// Schema version for the resolved_config report
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier for the resolved_config report
pub const SCHEMA_ID: &str = "rch-variants/resolved_config@1";

/// Namespace holding manifest placeholder values
pub const MANIFEST_PLACEHOLDERS: &str = "manifestPlaceholders";

/// Origin of the declarations a config was resolved from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    /// Layers built in code
    Inline,
    /// Layers loaded from a descriptor file
    Descriptor,
}

/// Provenance of the declarations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for inline declarations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Errors from rendering a resolved config
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JCS serialization error: {0}")]
    Canonical(String),
}

/// Fully-resolved configuration for one variant.
///
/// Debug output and every rendering redact literal credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    variant: String,
    layers: Vec<String>,
    values: BTreeMap<ConfigKey, ConfigValue>,
    provenance: BTreeMap<ConfigKey, String>,
    signing: BTreeMap<String, SigningIdentity>,
    secrets: SecretKeys,
    source: Option<ConfigSource>,
}

/// Hashed form of a resolved config; credentials appear only as handles
#[derive(Serialize)]
struct DigestBody<'a> {
    variant: &'a str,
    layers: &'a [String],
    values: &'a serde_json::Map<String, serde_json::Value>,
    signing: &'a BTreeMap<String, SigningIdentity>,
}

impl ResolvedConfig {
    pub(crate) fn freeze(
        variant: String,
        layers: Vec<String>,
        merged: Merged,
        signing: BTreeMap<String, SigningIdentity>,
        secrets: SecretKeys,
        source: Option<ConfigSource>,
    ) -> Self {
        let mut values = BTreeMap::new();
        let mut provenance = BTreeMap::new();
        for (key, entry) in merged {
            provenance.insert(key.clone(), entry.origin);
            values.insert(key, entry.value);
        }
        Self {
            variant,
            layers,
            values,
            provenance,
            signing,
            secrets,
            source,
        }
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Names of the applied layers, lowest precedence first
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn source(&self) -> Option<&ConfigSource> {
        self.source.as_ref()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        let key = ConfigKey::parse(key).ok()?;
        self.values.get(&key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ConfigValue::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ConfigValue::as_bool)
    }

    pub fn get_path(&self, key: &str) -> Option<&Path> {
        self.get(key).and_then(ConfigValue::as_path)
    }

    /// Name of the layer that supplied `key`
    pub fn origin_of(&self, key: &str) -> Option<&str> {
        let key = ConfigKey::parse(key).ok()?;
        self.provenance.get(&key).map(String::as_str)
    }

    /// All entries, ordered by key
    pub fn iter(&self) -> impl Iterator<Item = (&ConfigKey, &ConfigValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries under a namespace, with the namespace stripped
    pub fn namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ConfigValue)> + 'a {
        self.values
            .iter()
            .filter_map(move |(key, value)| key.strip_namespace(namespace).map(|rest| (rest, value)))
    }

    /// Manifest placeholder substitutions, rendered as text
    pub fn manifest_placeholders(&self) -> BTreeMap<String, String> {
        self.namespace(MANIFEST_PLACEHOLDERS)
            .map(|(name, value)| (name.to_string(), value.render()))
            .collect()
    }

    pub fn signing_identity(&self, group: &str) -> Option<&SigningIdentity> {
        self.signing.get(group)
    }

    pub fn signing_identities(&self) -> impl Iterator<Item = &SigningIdentity> {
        self.signing.values()
    }

    /// SHA-256 over the JCS (RFC 8785) form of the redacted values.
    ///
    /// Identical inputs always produce the same digest; the source path is
    /// not part of it. Literal credentials are hashed as [`REDACTED`], so the
    /// digest reveals nothing the report does not.
    pub fn digest(&self) -> Result<String, OutputError> {
        let (values, _) = self.redacted_values();
        let body = DigestBody {
            variant: &self.variant,
            layers: &self.layers,
            values: &values,
            signing: &self.signing,
        };
        let jcs_bytes = serde_json_canonicalizer::to_vec(&body)
            .map_err(|e| OutputError::Canonical(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&jcs_bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Rendered value, or `None` when it must be redacted
    fn printable(&self, key: &ConfigKey, value: &ConfigValue) -> Option<String> {
        if self.secrets.contains(key) {
            match value.as_str().map(SecretRef::parse) {
                Some(secret) if !secret.is_literal() => Some(secret.display_handle()),
                _ => None,
            }
        } else {
            Some(value.render())
        }
    }

    fn rendered(&self, key: &ConfigKey, value: &ConfigValue) -> String {
        self.printable(key, value).unwrap_or_else(|| REDACTED.to_string())
    }

    /// JSON values with secrets replaced, plus the redacted keys
    fn redacted_values(&self) -> (serde_json::Map<String, serde_json::Value>, Vec<String>) {
        let mut config = serde_json::Map::new();
        let mut redactions = Vec::new();
        for (key, value) in &self.values {
            let json = match self.printable(key, value) {
                Some(_) => value.to_json_value(),
                None => {
                    redactions.push(key.to_string());
                    serde_json::Value::String(REDACTED.to_string())
                }
            };
            config.insert(key.to_string(), json);
        }
        (config, redactions)
    }

    /// Build the redacted JSON report
    pub fn to_report(&self) -> Result<ResolvedReport, OutputError> {
        let (config, redactions) = self.redacted_values();

        Ok(ResolvedReport {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            variant: self.variant.clone(),
            layers: self.layers.clone(),
            config,
            provenance: self
                .provenance
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            signing: self.signing.clone(),
            sources: self.source.iter().cloned().collect(),
            redactions,
            digest: self.digest()?,
        })
    }

    /// Serialize the redacted report to pretty JSON
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(&self.to_report()?)?)
    }

    /// `NAME=value` pairs for handing to a build tool through the environment.
    ///
    /// Keys become SCREAMING_SNAKE (`manifestPlaceholders.appAuthRedirectScheme`
    /// → `MANIFEST_PLACEHOLDERS_APP_AUTH_REDIRECT_SCHEME`), optionally prefixed.
    pub fn env_vars(&self, prefix: &str) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(key, value)| {
                let name = if prefix.is_empty() {
                    env_name(key)
                } else {
                    format!("{}_{}", prefix, env_name(key))
                };
                (name, self.rendered(key, value))
            })
            .collect()
    }

    /// Environment variables as `NAME=value` lines
    pub fn to_env(&self, prefix: &str) -> String {
        self.env_vars(prefix)
            .into_iter()
            .map(|(name, value)| format!("{}={}\n", name, value))
            .collect()
    }

    /// Human-readable summary
    pub fn to_human(&self) -> String {
        let mut out = format!("Variant: {}\n", self.variant);
        out.push_str(&format!("  Layers: {}\n", self.layers.join(" -> ")));
        if let Some(path) = self.source.as_ref().and_then(|s| s.path.as_deref()) {
            out.push_str(&format!("  Source: {}\n", path));
        }
        out.push('\n');
        for (key, value) in &self.values {
            let rendered = self.rendered(key, value);
            let origin = self.provenance.get(key).map(String::as_str).unwrap_or("?");
            out.push_str(&format!("  {} = {}  [{}]\n", key, rendered, origin));
        }
        for identity in self.signing.values() {
            out.push_str(&format!(
                "\n  Signing ({}): {} alias={} store={} key={}\n",
                identity.group,
                identity.store_path.display(),
                identity.key_alias,
                identity.store_credential,
                identity.key_credential
            ));
        }
        out
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: BTreeMap<&str, String> = self
            .values
            .iter()
            .map(|(key, value)| (key.as_str(), self.rendered(key, value)))
            .collect();
        f.debug_struct("ResolvedConfig")
            .field("variant", &self.variant)
            .field("layers", &self.layers)
            .field("values", &values)
            .field("signing", &self.signing)
            .field("source", &self.source)
            .finish()
    }
}

/// Serialized form of a resolved config, safe to write to disk or logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedReport {
    pub schema_version: u32,
    pub schema_id: String,
    pub variant: String,
    pub layers: Vec<String>,
    pub config: serde_json::Map<String, serde_json::Value>,
    pub provenance: BTreeMap<String, String>,
    pub signing: BTreeMap<String, SigningIdentity>,
    pub sources: Vec<ConfigSource>,
    pub redactions: Vec<String>,
    pub digest: String,
}

fn env_name(key: &ConfigKey) -> String {
    let mut name = String::new();
    for (i, segment) in key.segments().enumerate() {
        if i > 0 {
            name.push('_');
        }
        let mut prev_lower = false;
        for c in segment.chars() {
            if c.is_ascii_uppercase() && prev_lower {
                name.push('_');
            }
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            name.push(if c == '-' { '_' } else { c.to_ascii_uppercase() });
        }
    }
    name
}
