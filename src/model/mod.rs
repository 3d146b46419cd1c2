//! Configuration data model
//!
//! Keys, values, layers and credential handles. All types are immutable
//! once built and safe to share across threads.

mod key;
mod layer;
mod secret;
mod signing;
mod value;

pub use key::ConfigKey;
pub use layer::{ConfigLayer, LayerBuilder};
pub use secret::{SecretKeys, SecretRef, REDACTED};
pub use signing::SigningIdentity;
pub use value::ConfigValue;
