//! Build descriptor files
//!
//! A descriptor declares the schema, the base layer, named overlay layers
//! and the variants built from them:
//!
//! ```toml
//! [schema]
//! required = ["applicationId"]
//!
//! [schema.signing.release]
//! prefix = "signing"
//!
//! [base]
//! applicationId = "com.example.app"
//! minSdk = 24
//!
//! [layers.debug]
//! manifestPlaceholders.appAuthRedirectScheme = "${applicationId}.debug"
//!
//! [layers.release]
//! signing.storePath = { path = "keystore/release.jks" }
//!
//! [variants.release]
//! layers = ["release"]
//! signing = "release"
//! ```
//!
//! Nested tables flatten to dotted keys. An inline table with a single
//! `path` entry is a path value.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ResolveError, ResolveResult};
use crate::model::{ConfigKey, ConfigLayer, ConfigValue, LayerBuilder};
use crate::resolved::{ConfigOrigin, ConfigSource, ResolvedConfig};
use crate::resolver::ConfigResolver;
use crate::schema::Schema;
use crate::variant::Variant;

/// Name of the base layer
pub const BASE_LAYER: &str = "base";

/// Name of the command-line override layer
pub const OVERRIDE_LAYER: &str = "cli";

/// Error types for descriptor operations
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Failed to read descriptor: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid UTF-8 in descriptor: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Invalid override '{0}': expected key=value")]
    InvalidOverride(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    #[serde(default)]
    schema: Schema,

    #[serde(default)]
    base: toml::Table,

    #[serde(default)]
    layers: BTreeMap<String, toml::Table>,

    #[serde(default)]
    variants: BTreeMap<String, RawVariant>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVariant {
    #[serde(default)]
    layers: Vec<String>,
    signing: Option<String>,
}

/// A loaded build descriptor, ready to resolve variants
#[derive(Debug, Clone)]
pub struct BuildDescriptor {
    base: ConfigLayer,
    variants: Vec<Variant>,
    resolver: ConfigResolver,
}

impl BuildDescriptor {
    /// Load a descriptor file, recording its path and SHA-256 digest
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let bytes = fs::read(path)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)?;
        info!(path = %path.display(), %digest, "loading build descriptor");

        Self::parse(
            &contents,
            ConfigSource {
                origin: ConfigOrigin::Descriptor,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            },
        )
    }

    /// Parse a descriptor from a TOML string
    pub fn from_str(s: &str) -> Result<Self, DescriptorError> {
        Self::parse(
            s,
            ConfigSource {
                origin: ConfigOrigin::Inline,
                path: None,
                digest: None,
            },
        )
    }

    fn parse(s: &str, source: ConfigSource) -> Result<Self, DescriptorError> {
        let raw: RawDescriptor = toml::from_str(s)?;

        let base = flatten_table(BASE_LAYER, &raw.base)?;
        let mut resolver = ConfigResolver::new(raw.schema).with_source(source);
        for (name, table) in &raw.layers {
            let layer = flatten_table(name, table)?;
            debug!(layer = %name, keys = layer.len(), "loaded overlay layer");
            resolver = resolver.with_overlay(layer);
        }

        let variants = raw
            .variants
            .into_iter()
            .map(|(name, v)| Variant {
                name,
                layers: v.layers,
                signing: v.signing,
            })
            .collect();

        Ok(Self {
            base,
            variants,
            resolver,
        })
    }

    pub fn base(&self) -> &ConfigLayer {
        &self.base
    }

    /// Declared variants, ordered by name
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    pub fn variant(&self, name: &str) -> ResolveResult<&Variant> {
        self.variants
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| ResolveError::UnknownVariant(name.to_string()))
    }

    /// Resolve a declared variant
    pub fn resolve(&self, name: &str) -> ResolveResult<ResolvedConfig> {
        self.resolve_with_overrides(name, &[])
    }

    /// Resolve a declared variant with extra highest-precedence layers
    pub fn resolve_with_overrides(
        &self,
        name: &str,
        overrides: &[ConfigLayer],
    ) -> ResolveResult<ResolvedConfig> {
        let variant = self.variant(name)?;
        self.resolver
            .resolve_with_overrides(&self.base, variant, overrides)
    }

    /// Resolve every declared variant independently
    pub fn resolve_all(&self) -> BTreeMap<String, ResolveResult<ResolvedConfig>> {
        self.resolver.resolve_all(&self.base, &self.variants)
    }
}

/// Flatten a TOML table into a layer with dotted keys
pub fn flatten_table(name: &str, table: &toml::Table) -> ResolveResult<ConfigLayer> {
    flatten_into(ConfigLayer::builder(name), "", table).map(LayerBuilder::build)
}

fn flatten_into(
    mut builder: LayerBuilder,
    prefix: &str,
    table: &toml::Table,
) -> ResolveResult<LayerBuilder> {
    for (name, value) in table {
        let full = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        builder = match value {
            toml::Value::Table(inner) => match path_value(inner) {
                Some(path) => builder.insert(ConfigKey::parse(&full)?, ConfigValue::Path(path))?,
                None => flatten_into(builder, &full, inner)?,
            },
            other => builder.insert(ConfigKey::parse(&full)?, scalar(&full, other)?)?,
        };
    }
    Ok(builder)
}

fn path_value(table: &toml::Table) -> Option<PathBuf> {
    if table.len() != 1 {
        return None;
    }
    table.get("path")?.as_str().map(PathBuf::from)
}

fn scalar(key: &str, value: &toml::Value) -> ResolveResult<ConfigValue> {
    match value {
        toml::Value::String(s) => Ok(ConfigValue::String(s.clone())),
        toml::Value::Integer(i) => Ok(ConfigValue::Integer(*i)),
        toml::Value::Boolean(b) => Ok(ConfigValue::Boolean(*b)),
        other => Err(ResolveError::UnsupportedValue {
            key: key.to_string(),
            kind: other.type_str().to_string(),
        }),
    }
}

/// Build the command-line override layer from `key=value` pairs.
///
/// Values are typed by shape: integers, `true`/`false`, otherwise strings.
pub fn override_layer<S: AsRef<str>>(pairs: &[S]) -> Result<ConfigLayer, DescriptorError> {
    let mut builder = ConfigLayer::builder(OVERRIDE_LAYER);
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| DescriptorError::InvalidOverride(pair.to_string()))?;
        let value = if let Ok(i) = raw.parse::<i64>() {
            ConfigValue::Integer(i)
        } else if let Ok(b) = raw.parse::<bool>() {
            ConfigValue::Boolean(b)
        } else {
            ConfigValue::String(raw.to_string())
        };
        builder = builder.set(key.trim(), value)?;
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DESCRIPTOR: &str = r#"
        [schema]
        required = ["applicationId", "minSdk"]

        [schema.signing.release]
        prefix = "signing"

        [base]
        applicationId = "com.example.app"
        minSdk = 24
        manifestPlaceholders.appAuthRedirectScheme = "${applicationId}"

        [layers.debug]
        manifestPlaceholders.appAuthRedirectScheme = "${applicationId}.debug"

        [layers.release]
        minifyEnabled = true
        signing.storePath = { path = "keystore/release.jks" }
        signing.storePassword = "env:RELEASE_STORE_PASSWORD"
        signing.keyAlias = "upload"
        signing.keyPassword = "env:RELEASE_KEY_PASSWORD"

        [variants.debug]
        layers = ["debug"]

        [variants.release]
        layers = ["release"]
        signing = "release"
    "#;

    #[test]
    fn test_parse_descriptor() {
        let descriptor = BuildDescriptor::from_str(DESCRIPTOR).unwrap();
        let names: Vec<&str> = descriptor.variants().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["debug", "release"]);
        assert_eq!(descriptor.base().len(), 3);
        assert!(descriptor.resolver().overlay("release").is_some());
    }

    #[test]
    fn test_resolve_variants() {
        let descriptor = BuildDescriptor::from_str(DESCRIPTOR).unwrap();

        let debug = descriptor.resolve("debug").unwrap();
        assert_eq!(
            debug.get_str("manifestPlaceholders.appAuthRedirectScheme"),
            Some("com.example.app.debug")
        );
        assert!(debug.signing_identity("release").is_none());

        let release = descriptor.resolve("release").unwrap();
        assert_eq!(
            release.get("signing.storePath"),
            Some(&ConfigValue::Path(PathBuf::from("keystore/release.jks")))
        );
        assert_eq!(release.get_bool("minifyEnabled"), Some(true));
        assert_eq!(
            release.get_str("manifestPlaceholders.appAuthRedirectScheme"),
            Some("com.example.app")
        );
    }

    #[test]
    fn test_unknown_variant() {
        let descriptor = BuildDescriptor::from_str(DESCRIPTOR).unwrap();
        assert_eq!(
            descriptor.resolve("staging").unwrap_err(),
            ResolveError::UnknownVariant("staging".to_string())
        );
    }

    #[test]
    fn test_dotted_and_nested_duplicate() {
        let err = BuildDescriptor::from_str(
            r#"
            [base]
            "signing.keyAlias" = "a"
            signing = { keyAlias = "b" }
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::Resolve(ResolveError::DuplicateKeyInLayer { .. })
        ));
    }

    #[test]
    fn test_unsupported_values() {
        let err = BuildDescriptor::from_str("[base]\nproguardFiles = [\"a.pro\"]\n").unwrap_err();
        assert!(err.to_string().contains("proguardFiles"));
        let err = BuildDescriptor::from_str("[base]\nratio = 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::Resolve(ResolveError::UnsupportedValue { .. })
        ));
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(matches!(
            BuildDescriptor::from_str("[flutter]\nsource = \"../..\"\n"),
            Err(DescriptorError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_file_records_source() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{}", DESCRIPTOR).unwrap();

        let descriptor = BuildDescriptor::from_file(temp.path()).unwrap();
        let resolved = descriptor.resolve("debug").unwrap();
        let source = resolved.source().unwrap();
        assert_eq!(source.origin, ConfigOrigin::Descriptor);
        assert_eq!(source.digest.as_ref().map(String::len), Some(64));
    }

    #[test]
    fn test_override_layer() {
        let layer = override_layer(&["minSdk=26", "minifyEnabled=false", "versionName=1.0"]).unwrap();
        assert_eq!(layer.name(), OVERRIDE_LAYER);
        assert_eq!(layer.get("minSdk"), Some(&ConfigValue::Integer(26)));
        assert_eq!(layer.get("minifyEnabled"), Some(&ConfigValue::Boolean(false)));
        assert_eq!(layer.get("versionName"), Some(&ConfigValue::from("1.0")));

        assert!(matches!(
            override_layer(&["novalue"]),
            Err(DescriptorError::InvalidOverride(_))
        ));
        assert!(matches!(
            override_layer(&["a=1", "a=2"]),
            Err(DescriptorError::Resolve(ResolveError::DuplicateKeyInLayer { .. }))
        ));
    }

    #[test]
    fn test_overrides_through_descriptor() {
        let descriptor = BuildDescriptor::from_str(DESCRIPTOR).unwrap();
        let cli = override_layer(&["minSdk=26"]).unwrap();
        let resolved = descriptor.resolve_with_overrides("debug", &[cli]).unwrap();
        assert_eq!(resolved.get_i64("minSdk"), Some(26));
        assert_eq!(resolved.origin_of("minSdk"), Some(OVERRIDE_LAYER));
    }
}
