//! Tagged configuration values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A single configuration value.
///
/// Values are immutable once placed in a layer; substitution produces new
/// values rather than editing existing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Path(PathBuf),
}

impl ConfigValue {
    /// Short type name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::String(_) => "string",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Boolean(_) => "boolean",
            ConfigValue::Path(_) => "path",
        }
    }

    /// Text form used when the value is spliced into another value
    pub fn render(&self) -> String {
        match self {
            ConfigValue::String(s) => s.clone(),
            ConfigValue::Integer(i) => i.to_string(),
            ConfigValue::Boolean(b) => b.to_string(),
            ConfigValue::Path(p) => p.to_string_lossy().into_owned(),
        }
    }

    /// Text that may carry `${key}` tokens (strings and paths only)
    pub fn template_text(&self) -> Option<String> {
        match self {
            ConfigValue::String(s) => Some(s.clone()),
            ConfigValue::Path(p) => Some(p.to_string_lossy().into_owned()),
            ConfigValue::Integer(_) | ConfigValue::Boolean(_) => None,
        }
    }

    /// Rebuild a value of the same kind from substituted text
    pub fn with_text(&self, text: String) -> ConfigValue {
        match self {
            ConfigValue::Path(_) => ConfigValue::Path(PathBuf::from(text)),
            _ => ConfigValue::String(text),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Path value; plain strings are accepted as paths too
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ConfigValue::Path(p) => Some(p),
            ConfigValue::String(s) => Some(Path::new(s)),
            _ => None,
        }
    }

    /// Untagged JSON form for rendered output
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
            ConfigValue::Integer(i) => serde_json::Value::from(*i),
            ConfigValue::Boolean(b) => serde_json::Value::Bool(*b),
            ConfigValue::Path(p) => serde_json::json!({ "path": p.to_string_lossy() }),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<i32> for ConfigValue {
    fn from(i: i32) -> Self {
        ConfigValue::Integer(i64::from(i))
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Boolean(b)
    }
}

impl From<PathBuf> for ConfigValue {
    fn from(p: PathBuf) -> Self {
        ConfigValue::Path(p)
    }
}
