//! Typed view of well-known mobile build settings
//!
//! Reads the keys a Gradle-style app module declares (application id, SDK
//! levels, version, shrinking flags, manifest placeholders) out of a
//! [`ResolvedConfig`] and checks the cross-field rules the packaging tool
//! would otherwise reject late.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resolved::ResolvedConfig;

/// Errors from reading or checking build settings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("missing setting '{0}'")]
    Missing(&'static str),

    #[error("setting '{key}' must be {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Build settings of one resolved variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    pub application_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_sdk: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_sdk: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_sdk: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,
    pub multi_dex_enabled: bool,
    pub minify_enabled: bool,
    pub shrink_resources: bool,
    pub manifest_placeholders: BTreeMap<String, String>,
}

impl BuildSettings {
    /// Read and check settings from a resolved variant
    pub fn from_resolved(config: &ResolvedConfig) -> Result<Self, SettingsError> {
        let settings = Self {
            application_id: string(config, "applicationId")?
                .ok_or(SettingsError::Missing("applicationId"))?,
            namespace: string(config, "namespace")?,
            min_sdk: integer(config, "minSdk")?,
            target_sdk: integer(config, "targetSdk")?,
            compile_sdk: integer(config, "compileSdk")?,
            version_code: integer(config, "versionCode")?,
            version_name: version_name(config)?,
            multi_dex_enabled: flag(config, "multiDexEnabled")?,
            minify_enabled: flag(config, "minifyEnabled")?,
            shrink_resources: flag(config, "shrinkResources")?,
            manifest_placeholders: config.manifest_placeholders(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field rules
    pub fn validate(&self) -> Result<(), SettingsError> {
        // Rule: application id looks like a package name
        let segments: Vec<&str> = self.application_id.split('.').collect();
        if segments.len() < 2 || segments.iter().any(|s| !is_package_segment(s)) {
            return Err(SettingsError::ValidationError(format!(
                "applicationId '{}' is not a valid package name",
                self.application_id
            )));
        }

        // Rule: minSdk <= targetSdk <= compileSdk
        if let (Some(min), Some(target)) = (self.min_sdk, self.target_sdk) {
            if min > target {
                return Err(SettingsError::ValidationError(format!(
                    "minSdk ({}) must not exceed targetSdk ({})",
                    min, target
                )));
            }
        }
        if let (Some(target), Some(compile)) = (self.target_sdk, self.compile_sdk) {
            if target > compile {
                return Err(SettingsError::ValidationError(format!(
                    "targetSdk ({}) must not exceed compileSdk ({})",
                    target, compile
                )));
            }
        }
        for (name, level) in [("minSdk", self.min_sdk), ("targetSdk", self.target_sdk)] {
            if matches!(level, Some(l) if l < 1) {
                return Err(SettingsError::ValidationError(format!(
                    "{} must be positive",
                    name
                )));
            }
        }

        // Rule: versionCode must be positive
        if matches!(self.version_code, Some(code) if code <= 0) {
            return Err(SettingsError::ValidationError(
                "versionCode must be positive".to_string(),
            ));
        }

        // Rule: resource shrinking needs code shrinking
        if self.shrink_resources && !self.minify_enabled {
            return Err(SettingsError::ValidationError(
                "shrinkResources requires minifyEnabled".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_package_segment(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn string(config: &ResolvedConfig, key: &'static str) -> Result<Option<String>, SettingsError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or(SettingsError::WrongType {
                key,
                expected: "a string",
            }),
    }
}

fn integer(config: &ResolvedConfig, key: &'static str) -> Result<Option<i64>, SettingsError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or(SettingsError::WrongType {
            key,
            expected: "an integer",
        }),
    }
}

fn flag(config: &ResolvedConfig, key: &'static str) -> Result<bool, SettingsError> {
    match config.get(key) {
        None => Ok(false),
        Some(value) => value.as_bool().ok_or(SettingsError::WrongType {
            key,
            expected: "a boolean",
        }),
    }
}

// versionName is often written as a bare number
fn version_name(config: &ResolvedConfig) -> Result<Option<String>, SettingsError> {
    match config.get("versionName") {
        None => Ok(None),
        Some(value) if value.as_bool().is_some() => Err(SettingsError::WrongType {
            key: "versionName",
            expected: "a string",
        }),
        Some(value) => Ok(Some(value.render())),
    }
}
