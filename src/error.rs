//! Resolution error taxonomy

use thiserror::Error;

use crate::model::ConfigKey;

/// Errors raised while building layers or resolving a variant.
///
/// Every failure is deterministic: resolving the same inputs again yields
/// the same error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A required key is absent after merge and substitution
    #[error("missing required key '{0}'")]
    MissingRequiredKey(ConfigKey),

    /// Some, but not all, fields of a signing identity are present
    #[error("incomplete signing identity '{group}': only [{}] present", .present.join(", "))]
    IncompleteSigningIdentity { group: String, present: Vec<String> },

    /// Substitution did not converge (cycle or reference to an undefined key)
    #[error("unresolved placeholder '{token}' in '{key}'")]
    UnresolvedPlaceholder { key: ConfigKey, token: String },

    /// A non-secret key takes its text from a credential key
    #[error("placeholder '{token}' in '{key}' references a credential")]
    SecretReference { key: ConfigKey, token: String },

    /// A single layer declares the same key twice
    #[error("duplicate key '{key}' in layer '{layer}'")]
    DuplicateKeyInLayer { layer: String, key: ConfigKey },

    #[error("invalid config key '{0}'")]
    InvalidKey(String),

    #[error("unsupported value for '{key}': {kind}")]
    UnsupportedValue { key: String, kind: String },

    #[error("variant '{variant}' references unknown layer '{layer}'")]
    UnknownLayer { variant: String, layer: String },

    #[error("unknown variant '{0}'")]
    UnknownVariant(String),

    #[error("variant '{variant}' requires unknown signing group '{group}'")]
    UnknownSigningGroup { variant: String, group: String },
}

/// Result type for layer construction and resolution
pub type ResolveResult<T> = Result<T, ResolveError>;
