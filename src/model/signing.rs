//! Signing identities

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::SecretRef;

/// A complete signing identity extracted from a resolved variant.
///
/// Credentials are handles; the keystore itself is never opened here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningIdentity {
    /// Schema group this identity was read from
    pub group: String,
    pub store_path: PathBuf,
    pub store_credential: SecretRef,
    pub key_alias: String,
    pub key_credential: SecretRef,
}

impl SigningIdentity {
    /// True when either credential is embedded as a literal
    pub fn has_literal_credentials(&self) -> bool {
        self.store_credential.is_literal() || self.key_credential.is_literal()
    }
}
