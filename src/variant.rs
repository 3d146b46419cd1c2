//! Build variants

use serde::{Deserialize, Serialize};

/// A named build target composed from overlay layers.
///
/// `layers` are applied over the base in order, lowest precedence first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,

    #[serde(default)]
    pub layers: Vec<String>,

    /// Signing group that must be complete for this variant to be buildable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing: Option<String>,
}

impl Variant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: Vec::new(),
            signing: None,
        }
    }

    /// Append an overlay layer (higher precedence than those already listed)
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layers.push(layer.into());
        self
    }

    /// Require a complete signing identity from the named group
    pub fn with_signing(mut self, group: impl Into<String>) -> Self {
        self.signing = Some(group.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let variant = Variant::new("release")
            .with_layer("shrink")
            .with_layer("release")
            .with_signing("upload");
        assert_eq!(variant.layers, vec!["shrink", "release"]);
        assert_eq!(variant.signing.as_deref(), Some("upload"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let variant: Variant = toml::from_str("name = \"debug\"").unwrap();
        assert!(variant.layers.is_empty());
        assert!(variant.signing.is_none());
    }
}
