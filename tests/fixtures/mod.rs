//! Shared fixtures for variant resolution tests
//!
//! - `app_module.toml`: app module descriptor with debug and release variants
//! - Layer helpers for building inline declarations

#![allow(dead_code)]

use rch_variant_config::{ConfigLayer, ConfigValue};
use std::path::{Path, PathBuf};

/// Path to the app module descriptor fixture
pub fn app_module_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/app_module.toml")
}

/// Build a layer from `(key, value)` pairs, panicking on invalid input
pub fn layer(name: &str, entries: &[(&str, ConfigValue)]) -> ConfigLayer {
    ConfigLayer::from_entries(name, entries.iter().cloned())
        .unwrap_or_else(|e| panic!("fixture layer '{}' is invalid: {}", name, e))
}

/// Signing fields under `prefix`, limited to the first `count` of the four
pub fn signing_entries(prefix: &str, count: usize) -> Vec<(String, ConfigValue)> {
    let all = [
        ("storePath", ConfigValue::Path(PathBuf::from("keystore/release.jks"))),
        ("storePassword", ConfigValue::from("env:RELEASE_STORE_PASSWORD")),
        ("keyAlias", ConfigValue::from("release-key")),
        ("keyPassword", ConfigValue::from("env:RELEASE_KEY_PASSWORD")),
    ];
    all.into_iter()
        .take(count)
        .map(|(field, value)| (format!("{}.{}", prefix, field), value))
        .collect()
}
