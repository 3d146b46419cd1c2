//! `${key}` placeholder substitution
//!
//! Substitution runs in passes. Each pass reads from a snapshot of the
//! previous pass, so the outcome does not depend on key order. Passes stop
//! when no token remains, when a pass changes nothing, or after
//! [`MAX_PASSES`].
//!
//! Only credential keys may reference credential keys. Anything else would
//! copy a secret into a value that is printed unredacted.

use regex_lite::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::merge::Merged;
use crate::error::{ResolveError, ResolveResult};
use crate::model::{ConfigKey, ConfigValue, SecretKeys};

/// Upper bound on substitution passes
pub const MAX_PASSES: usize = 8;

fn token_re() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)\}")
            .expect("placeholder pattern is valid")
    })
}

/// First `${key}` token in `text`, if any
pub fn first_token(text: &str) -> Option<&str> {
    token_re().find(text).map(|m| m.as_str())
}

/// Resolve all placeholder tokens in the merged set
pub fn substitute(mut merged: Merged, secrets: &SecretKeys) -> ResolveResult<Merged> {
    for pass in 1..=MAX_PASSES {
        if !has_tokens(&merged) {
            return Ok(merged);
        }

        let snapshot = merged.clone();
        let mut changed = 0usize;
        for (key, entry) in merged.iter_mut() {
            if let Some(value) = substitute_value(key, &entry.value, &snapshot, secrets)? {
                if value != entry.value {
                    entry.value = value;
                    changed += 1;
                }
            }
        }

        debug!(pass, changed, "placeholder substitution pass");
        if changed == 0 {
            break;
        }
    }

    match first_unresolved(&merged) {
        Some((key, token)) => Err(ResolveError::UnresolvedPlaceholder { key, token }),
        None => Ok(merged),
    }
}

/// Substitute one value against the snapshot. Returns `None` for values
/// without template text.
fn substitute_value(
    key: &ConfigKey,
    value: &ConfigValue,
    snapshot: &Merged,
    secrets: &SecretKeys,
) -> ResolveResult<Option<ConfigValue>> {
    let Some(text) = value.template_text() else {
        return Ok(None);
    };

    if !secrets.contains(key) {
        check_no_secret_reference(key, &text, secrets)?;
    }

    // A string that is exactly one token takes the referenced value as-is,
    // so `targetSdk = "${compileSdk}"` stays an integer.
    if let ConfigValue::String(_) = value {
        if let Some(caps) = token_re().captures(&text) {
            let whole = caps.get(0).map(|m| m.as_str().len()) == Some(text.len());
            if whole {
                return Ok(Some(match lookup(snapshot, &caps[1]) {
                    Some(referenced) => referenced.clone(),
                    None => value.clone(),
                }));
            }
        }
    }

    let replaced = token_re().replace_all(&text, |caps: &regex_lite::Captures<'_>| {
        match lookup(snapshot, &caps[1]) {
            Some(referenced) => referenced.render(),
            None => caps[0].to_string(),
        }
    });
    Ok(Some(value.with_text(replaced.into_owned())))
}

fn check_no_secret_reference(
    key: &ConfigKey,
    text: &str,
    secrets: &SecretKeys,
) -> ResolveResult<()> {
    for caps in token_re().captures_iter(text) {
        let target = match ConfigKey::parse(&caps[1]) {
            Ok(target) => target,
            Err(_) => continue,
        };
        if secrets.contains(&target) {
            return Err(ResolveError::SecretReference {
                key: key.clone(),
                token: caps[0].to_string(),
            });
        }
    }
    Ok(())
}

fn lookup<'a>(snapshot: &'a Merged, name: &str) -> Option<&'a ConfigValue> {
    let key = ConfigKey::parse(name).ok()?;
    snapshot.get(&key).map(|entry| &entry.value)
}

fn has_tokens(merged: &Merged) -> bool {
    first_unresolved(merged).is_some()
}

fn first_unresolved(merged: &Merged) -> Option<(ConfigKey, String)> {
    merged.iter().find_map(|(key, entry)| {
        let text = entry.value.template_text()?;
        first_token(&text).map(|token| (key.clone(), token.to_string()))
    })
}
