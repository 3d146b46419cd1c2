//! Variant resolution
//!
//! Resolution of one variant:
//! 1. Merge the base layer, then each overlay the variant lists (last write wins per key)
//! 2. Substitute `${key}` placeholders (bounded passes)
//! 3. Validate required keys and signing identities
//! 4. Freeze into a [`ResolvedConfig`]
//!
//! The resolver performs no I/O and holds no mutable state, so variants can
//! be resolved from several threads at once.

mod merge;
mod placeholder;
mod validate;

pub use merge::{merge_layers, overlay, Merged, MergedEntry};
pub use placeholder::{first_token, substitute, MAX_PASSES};
pub use validate::validate;

use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::model::ConfigLayer;
use crate::resolved::{ConfigSource, ResolvedConfig};
use crate::schema::Schema;
use crate::variant::Variant;

/// Resolves variants against a schema and a set of named overlay layers
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    schema: Schema,
    overlays: BTreeMap<String, ConfigLayer>,
    source: Option<ConfigSource>,
}

impl ConfigResolver {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            overlays: BTreeMap::new(),
            source: None,
        }
    }

    /// Register an overlay layer under its own name
    pub fn with_overlay(mut self, layer: ConfigLayer) -> Self {
        self.overlays.insert(layer.name().to_string(), layer);
        self
    }

    /// Record where the declarations came from (copied into every result)
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn overlay(&self, name: &str) -> Option<&ConfigLayer> {
        self.overlays.get(name)
    }

    /// Resolve one variant over `base`
    pub fn resolve(&self, base: &ConfigLayer, variant: &Variant) -> ResolveResult<ResolvedConfig> {
        self.resolve_with_overrides(base, variant, &[])
    }

    /// Resolve one variant, then apply `overrides` above every declared layer
    pub fn resolve_with_overrides(
        &self,
        base: &ConfigLayer,
        variant: &Variant,
        overrides: &[ConfigLayer],
    ) -> ResolveResult<ResolvedConfig> {
        let mut chain: Vec<&ConfigLayer> = vec![base];
        for name in &variant.layers {
            let layer = self
                .overlays
                .get(name)
                .ok_or_else(|| ResolveError::UnknownLayer {
                    variant: variant.name.clone(),
                    layer: name.clone(),
                })?;
            chain.push(layer);
        }
        chain.extend(overrides.iter());

        let merged = merge_layers(chain.iter().copied());
        debug!(
            variant = %variant.name,
            layers = chain.len(),
            keys = merged.len(),
            "merged layers"
        );

        let secrets = self.schema.secret_keys()?;
        let substituted = substitute(merged, &secrets)?;
        let signing = validate(&substituted, &self.schema, variant)?;

        Ok(ResolvedConfig::freeze(
            variant.name.clone(),
            chain.iter().map(|layer| layer.name().to_string()).collect(),
            substituted,
            signing,
            secrets,
            self.source.clone(),
        ))
    }

    /// Resolve every variant independently; one failure never affects another
    pub fn resolve_all<'a, I>(
        &self,
        base: &ConfigLayer,
        variants: I,
    ) -> BTreeMap<String, ResolveResult<ResolvedConfig>>
    where
        I: IntoIterator<Item = &'a Variant>,
    {
        variants
            .into_iter()
            .map(|variant| (variant.name.clone(), self.resolve(base, variant)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfigKey, ConfigValue};
    use crate::schema::SigningGroup;

    fn base() -> ConfigLayer {
        ConfigLayer::builder("base")
            .set("applicationId", "com.example.app")
            .unwrap()
            .set("minSdk", 24)
            .unwrap()
            .set("k", 1)
            .unwrap()
            .build()
    }

    fn resolver() -> ConfigResolver {
        let debug = ConfigLayer::builder("debug")
            .set("scheme", "${applicationId}.debug")
            .unwrap()
            .set("k", 2)
            .unwrap()
            .build();
        let signing = ConfigLayer::builder("release-signing")
            .set("signing.storePath", "keystore/release.jks")
            .unwrap()
            .set("signing.storePassword", "env:STORE_PASSWORD")
            .unwrap()
            .set("signing.keyAlias", "upload")
            .unwrap()
            .set("signing.keyPassword", "env:KEY_PASSWORD")
            .unwrap()
            .build();

        let schema = Schema::new()
            .require("applicationId")
            .unwrap()
            .with_signing_group("release", SigningGroup::new("signing"));

        ConfigResolver::new(schema)
            .with_overlay(debug)
            .with_overlay(signing)
    }

    #[test]
    fn test_debug_scheme_example() {
        let resolved = resolver()
            .resolve(&base(), &Variant::new("debug").with_layer("debug"))
            .unwrap();
        assert_eq!(resolved.get_str("scheme"), Some("com.example.app.debug"));
        assert_eq!(resolved.get_i64("k"), Some(2));
        assert_eq!(resolved.origin_of("k"), Some("debug"));
        assert_eq!(resolved.layers(), ["base", "debug"]);
    }

    #[test]
    fn test_unknown_layer() {
        let err = resolver()
            .resolve(&base(), &Variant::new("qa").with_layer("qa"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownLayer {
                variant: "qa".to_string(),
                layer: "qa".to_string()
            }
        );
    }

    #[test]
    fn test_release_requires_signing() {
        let release = Variant::new("release").with_signing("release");
        let err = resolver().resolve(&base(), &release).unwrap_err();
        assert!(matches!(err, ResolveError::MissingRequiredKey(_)));

        let release = release.with_layer("release-signing");
        let resolved = resolver().resolve(&base(), &release).unwrap();
        assert_eq!(resolved.signing_identity("release").unwrap().key_alias, "upload");
    }

    #[test]
    fn test_overrides_take_precedence() {
        let cli = ConfigLayer::builder("cli").set("k", 9).unwrap().build();
        let resolved = resolver()
            .resolve_with_overrides(&base(), &Variant::new("debug").with_layer("debug"), &[cli])
            .unwrap();
        assert_eq!(resolved.get("k"), Some(&ConfigValue::Integer(9)));
        assert_eq!(resolved.origin_of("k"), Some("cli"));
    }

    #[test]
    fn test_resolve_all_isolates_failures() {
        let variants = vec![
            Variant::new("debug").with_layer("debug"),
            Variant::new("release").with_signing("release"),
        ];
        let results = resolver().resolve_all(&base(), &variants);
        assert!(results["debug"].is_ok());
        assert_eq!(
            results["release"].as_ref().unwrap_err(),
            &ResolveError::MissingRequiredKey(ConfigKey::parse("signing.storePath").unwrap())
        );
    }

    #[test]
    fn test_custom_credential_fields_redacted() {
        let mut group = SigningGroup::new("signingConfigs.release");
        group.fields.store_credential = "storePass".to_string();
        group.fields.key_credential = "keyPass".to_string();
        let signing = ConfigLayer::builder("release-signing")
            .set("signingConfigs.release.storePath", "keystore/release.jks")
            .unwrap()
            .set("signingConfigs.release.storePass", "hunter2")
            .unwrap()
            .set("signingConfigs.release.keyAlias", "upload")
            .unwrap()
            .set("signingConfigs.release.keyPass", "hunter3")
            .unwrap()
            .build();
        let resolver = ConfigResolver::new(Schema::new().with_signing_group("release", group))
            .with_overlay(signing);

        let release = Variant::new("release")
            .with_layer("release-signing")
            .with_signing("release");
        let resolved = resolver.resolve(&base(), &release).unwrap();

        let env = resolved.to_env("");
        assert!(env.contains("SIGNING_CONFIGS_RELEASE_STORE_PASS=[REDACTED]\n"));
        assert!(env.contains("SIGNING_CONFIGS_RELEASE_KEY_ALIAS=upload\n"));
        for rendered in [env, resolved.to_json().unwrap(), resolved.to_human()] {
            assert!(!rendered.contains("hunter"));
        }
    }

    #[test]
    fn test_deterministic() {
        let variant = Variant::new("debug").with_layer("debug");
        let a = resolver().resolve(&base(), &variant).unwrap();
        let b = resolver().resolve(&base(), &variant).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    }
}
