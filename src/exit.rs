//! Stable exit codes for the `rch-variants` CLI

use serde::{Deserialize, Serialize};

use crate::descriptor::DescriptorError;
use crate::error::ResolveError;

/// Failure category of a resolution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Descriptor could not be read or parsed
    Descriptor,
    /// Layer construction failed (duplicate or malformed key, bad value)
    Layer,
    /// Required key or signing field missing
    MissingKey,
    /// Signing identity only partially declared
    Signing,
    /// Placeholder substitution did not converge or leaked a credential
    Placeholder,
    /// Unknown variant, layer or signing group
    Reference,
    /// Typed build settings rejected
    Settings,
}

impl FailureKind {
    pub fn from_resolve(err: &ResolveError) -> Self {
        match err {
            ResolveError::MissingRequiredKey(_) => FailureKind::MissingKey,
            ResolveError::IncompleteSigningIdentity { .. } => FailureKind::Signing,
            ResolveError::UnresolvedPlaceholder { .. } | ResolveError::SecretReference { .. } => {
                FailureKind::Placeholder
            }
            ResolveError::DuplicateKeyInLayer { .. }
            | ResolveError::InvalidKey(_)
            | ResolveError::UnsupportedValue { .. } => FailureKind::Layer,
            ResolveError::UnknownLayer { .. }
            | ResolveError::UnknownVariant(_)
            | ResolveError::UnknownSigningGroup { .. } => FailureKind::Reference,
        }
    }

    pub fn from_descriptor(err: &DescriptorError) -> Self {
        match err {
            DescriptorError::Resolve(inner) => Self::from_resolve(inner),
            _ => FailureKind::Descriptor,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            FailureKind::Descriptor => ExitCode::Descriptor,
            FailureKind::Layer => ExitCode::Layer,
            FailureKind::MissingKey | FailureKind::Signing => ExitCode::Incomplete,
            FailureKind::Placeholder => ExitCode::Placeholder,
            FailureKind::Reference => ExitCode::Reference,
            FailureKind::Settings => ExitCode::Settings,
        }
    }
}

/// Stable exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExitCode {
    /// Every requested variant resolved
    Success = 0,
    /// Descriptor unreadable or malformed
    Descriptor = 10,
    /// Invalid layer contents
    Layer = 20,
    /// Missing required key or incomplete signing identity
    Incomplete = 30,
    /// Unresolved placeholder
    Placeholder = 40,
    /// Unknown variant, layer or signing group
    Reference = 50,
    /// Build settings rejected
    Settings = 60,
    /// Resolved output could not be rendered or written
    Output = 70,
}

impl ExitCode {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}
