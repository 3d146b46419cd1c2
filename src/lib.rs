//! RCH Variants - build-variant configuration resolver
//!
//! Resolves the effective configuration of each build variant (debug,
//! release, ...) of a mobile app module: a base layer plus ordered overlay
//! layers, merged last-write-wins per key, with `${key}` placeholder
//! substitution and validation of required keys and signing identities.
//! The output is handed to the external build/packaging tool.

pub mod commands;
pub mod descriptor;
pub mod error;
pub mod exit;
pub mod model;
pub mod resolved;
pub mod resolver;
pub mod schema;
pub mod settings;
pub mod variant;

pub use descriptor::{BuildDescriptor, DescriptorError};
pub use error::{ResolveError, ResolveResult};
pub use model::{ConfigKey, ConfigLayer, ConfigValue, SecretRef, SigningIdentity};
pub use resolved::{ConfigOrigin, ConfigSource, ResolvedConfig};
pub use resolver::ConfigResolver;
pub use schema::{Schema, SigningGroup};
pub use settings::{BuildSettings, SettingsError};
pub use variant::Variant;
