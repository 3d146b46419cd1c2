//! Post-substitution validation
//!
//! Rules:
//! - Every schema-required key is present
//! - Every signing group is all-or-nothing
//! - A signing group the variant requires is complete

use std::collections::BTreeMap;
use tracing::warn;

use super::merge::Merged;
use crate::error::{ResolveError, ResolveResult};
use crate::model::{ConfigKey, ConfigValue, SecretRef, SigningIdentity};
use crate::schema::{Schema, SigningGroup};
use crate::variant::Variant;

/// Check required keys and extract complete signing identities
pub fn validate(
    merged: &Merged,
    schema: &Schema,
    variant: &Variant,
) -> ResolveResult<BTreeMap<String, SigningIdentity>> {
    for key in &schema.required {
        if !merged.contains_key(key) {
            return Err(ResolveError::MissingRequiredKey(key.clone()));
        }
    }

    let mut identities = BTreeMap::new();
    for (name, group) in &schema.signing {
        if let Some(identity) = extract_identity(merged, name, group)? {
            identities.insert(name.clone(), identity);
        }
    }

    if let Some(required) = &variant.signing {
        let group = schema
            .signing
            .get(required)
            .ok_or_else(|| ResolveError::UnknownSigningGroup {
                variant: variant.name.clone(),
                group: required.clone(),
            })?;
        if !identities.contains_key(required) {
            let [first, ..] = group.keys()?;
            return Err(ResolveError::MissingRequiredKey(first));
        }
    }

    Ok(identities)
}

/// `Ok(None)` when no field of the group is set
fn extract_identity(
    merged: &Merged,
    name: &str,
    group: &SigningGroup,
) -> ResolveResult<Option<SigningIdentity>> {
    let keys = group.keys()?;
    let field_names = [
        &group.fields.store_path,
        &group.fields.store_credential,
        &group.fields.key_alias,
        &group.fields.key_credential,
    ];

    let values: Vec<Option<&ConfigValue>> = keys
        .iter()
        .map(|key| merged.get(key).map(|entry| &entry.value))
        .collect();
    let present: Vec<String> = field_names
        .iter()
        .zip(&values)
        .filter(|(_, v)| v.is_some())
        .map(|(field, _)| field.to_string())
        .collect();

    let (store_path, store_credential, key_alias, key_credential) =
        match (values[0], values[1], values[2], values[3]) {
            (None, None, None, None) => return Ok(None),
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => {
                return Err(ResolveError::IncompleteSigningIdentity {
                    group: name.to_string(),
                    present,
                })
            }
        };

    let identity = SigningIdentity {
        group: name.to_string(),
        store_path: store_path
            .as_path()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| unsupported(&keys[0], store_path))?,
        store_credential: secret(&keys[1], store_credential)?,
        key_alias: key_alias
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| unsupported(&keys[2], key_alias))?,
        key_credential: secret(&keys[3], key_credential)?,
    };

    if identity.has_literal_credentials() {
        warn!(
            group = name,
            "signing identity embeds literal credentials; prefer env:/file: handles"
        );
    }

    Ok(Some(identity))
}

fn secret(key: &ConfigKey, value: &ConfigValue) -> ResolveResult<SecretRef> {
    value
        .as_str()
        .map(SecretRef::parse)
        .ok_or_else(|| unsupported(key, value))
}

fn unsupported(key: &ConfigKey, value: &ConfigValue) -> ResolveError {
    ResolveError::UnsupportedValue {
        key: key.to_string(),
        kind: format!("expected string, found {}", value.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConfigLayer;
    use crate::resolver::merge::merge_layers;

    fn merged(entries: &[(&str, &str)]) -> Merged {
        let layer = ConfigLayer::from_entries("base", entries.iter().copied()).unwrap();
        merge_layers([&layer])
    }

    fn signing_schema() -> Schema {
        Schema::new().with_signing_group("release", SigningGroup::new("signing"))
    }

    const FULL: &[(&str, &str)] = &[
        ("signing.storePath", "keystore/release.jks"),
        ("signing.storePassword", "env:STORE_PASSWORD"),
        ("signing.keyAlias", "upload"),
        ("signing.keyPassword", "env:KEY_PASSWORD"),
    ];

    #[test]
    fn test_missing_required_key() {
        let schema = Schema::new().require("signing.storePassword").unwrap();
        let err = validate(&merged(&[("applicationId", "x")]), &schema, &Variant::new("debug"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingRequiredKey(ConfigKey::parse("signing.storePassword").unwrap())
        );
    }

    #[test]
    fn test_full_identity_extracted() {
        let ids = validate(&merged(FULL), &signing_schema(), &Variant::new("release")).unwrap();
        let id = &ids["release"];
        assert_eq!(id.key_alias, "upload");
        assert_eq!(id.store_path.to_str(), Some("keystore/release.jks"));
        assert_eq!(
            id.store_credential,
            SecretRef::Env {
                name: "STORE_PASSWORD".to_string()
            }
        );
        assert!(!id.has_literal_credentials());
    }

    #[test]
    fn test_three_of_four_fails() {
        let err = validate(&merged(&FULL[..3]), &signing_schema(), &Variant::new("release"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::IncompleteSigningIdentity {
                group: "release".to_string(),
                present: vec![
                    "storePath".to_string(),
                    "storePassword".to_string(),
                    "keyAlias".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_absent_identity_is_fine() {
        let ids = validate(&merged(&[("minSdk", "24")]), &signing_schema(), &Variant::new("debug"))
            .unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_variant_requiring_absent_identity() {
        let variant = Variant::new("release").with_signing("release");
        let err = validate(&merged(&[]), &signing_schema(), &variant).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingRequiredKey(ConfigKey::parse("signing.storePath").unwrap())
        );
    }

    #[test]
    fn test_variant_requiring_unknown_group() {
        let variant = Variant::new("release").with_signing("upload");
        let err = validate(&merged(FULL), &signing_schema(), &variant).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownSigningGroup { .. }));
    }

    #[test]
    fn test_literal_credentials_flagged() {
        let entries = [
            ("signing.storePath", "keystore/release.jks"),
            ("signing.storePassword", "hunter2"),
            ("signing.keyAlias", "upload"),
            ("signing.keyPassword", "hunter2"),
        ];
        let ids = validate(&merged(&entries), &signing_schema(), &Variant::new("release")).unwrap();
        assert!(ids["release"].has_literal_credentials());
    }
}
