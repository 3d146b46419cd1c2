//! CLI subcommands
//!
//! Each command writes its report to `out`, diagnostics to stderr, and
//! returns the exit code for the process.

use clap::ValueEnum;
use std::io::{self, Write};
use std::path::Path;

use crate::descriptor::{override_layer, BuildDescriptor, BASE_LAYER};
use crate::exit::{ExitCode, FailureKind};
use crate::resolved::ResolvedConfig;
use crate::settings::BuildSettings;

/// Rendering of a resolved variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Env,
    Human,
}

fn load(path: &Path) -> Result<BuildDescriptor, ExitCode> {
    BuildDescriptor::from_file(path).map_err(|e| {
        eprintln!("Error loading descriptor {}: {}", path.display(), e);
        FailureKind::from_descriptor(&e).exit_code()
    })
}

fn output_failed(e: impl std::fmt::Display) -> ExitCode {
    eprintln!("Error writing output: {}", e);
    ExitCode::Output
}

/// Resolve one variant and print it in `format`
pub fn resolve<W: Write>(
    out: &mut W,
    path: &Path,
    variant: &str,
    format: Format,
    env_prefix: &str,
    overrides: &[String],
) -> ExitCode {
    let descriptor = match load(path) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let cli_layers = if overrides.is_empty() {
        Vec::new()
    } else {
        match override_layer(overrides) {
            Ok(layer) => vec![layer],
            Err(e) => {
                eprintln!("Error: {}", e);
                return FailureKind::from_descriptor(&e).exit_code();
            }
        }
    };

    let resolved = match descriptor.resolve_with_overrides(variant, &cli_layers) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Resolution failed for '{}': {}", variant, e);
            return FailureKind::from_resolve(&e).exit_code();
        }
    };

    if let Err(e) = BuildSettings::from_resolved(&resolved) {
        eprintln!("Build settings rejected for '{}': {}", variant, e);
        return FailureKind::Settings.exit_code();
    }

    let rendered = match format {
        Format::Json => match resolved.to_json() {
            Ok(json) => json + "\n",
            Err(e) => return output_failed(e),
        },
        Format::Env => resolved.to_env(env_prefix),
        Format::Human => resolved.to_human(),
    };

    match out.write_all(rendered.as_bytes()) {
        Ok(()) => ExitCode::Success,
        Err(e) => output_failed(e),
    }
}

/// Resolve every variant and report which are buildable.
///
/// The exit code is that of the first failing variant, in name order.
pub fn verify<W: Write>(out: &mut W, path: &Path, json: bool) -> ExitCode {
    let descriptor = match load(path) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let mut worst = ExitCode::Success;
    let mut report = serde_json::Map::new();
    let mut lines = String::new();

    for (name, result) in descriptor.resolve_all() {
        let outcome = result
            .map_err(|e| (FailureKind::from_resolve(&e), e.to_string()))
            .and_then(|resolved| check_settings(&resolved).map(|_| resolved));

        match outcome {
            Ok(resolved) => {
                let digest = match resolved.digest() {
                    Ok(digest) => digest,
                    Err(e) => return output_failed(e),
                };
                lines.push_str(&format!("  {}: buildable ({} keys)\n", name, resolved.len()));
                report.insert(
                    name,
                    serde_json::json!({
                        "buildable": true,
                        "digest": digest,
                    }),
                );
            }
            Err((kind, message)) => {
                lines.push_str(&format!("  {}: NOT buildable: {}\n", name, message));
                report.insert(
                    name,
                    serde_json::json!({
                        "buildable": false,
                        "failure_kind": kind,
                        "error": message,
                    }),
                );
                if worst.is_success() {
                    worst = kind.exit_code();
                }
            }
        }
    }

    let written = if json {
        serde_json::to_string_pretty(&report)
            .map_err(io::Error::from)
            .and_then(|text| writeln!(out, "{}", text))
    } else {
        out.write_all(lines.as_bytes())
    };

    match written {
        Ok(()) => worst,
        Err(e) => output_failed(e),
    }
}

fn check_settings(resolved: &ResolvedConfig) -> Result<(), (FailureKind, String)> {
    BuildSettings::from_resolved(resolved)
        .map(|_| ())
        .map_err(|e| (FailureKind::Settings, e.to_string()))
}

/// List declared variants and their layer chains
pub fn variants<W: Write>(out: &mut W, path: &Path) -> ExitCode {
    let descriptor = match load(path) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let mut lines = String::new();
    if descriptor.variants().is_empty() {
        lines.push_str(&format!("No variants declared in {}\n", path.display()));
    }
    for variant in descriptor.variants() {
        let mut chain = vec![BASE_LAYER.to_string()];
        chain.extend(variant.layers.iter().cloned());
        match &variant.signing {
            Some(group) => lines.push_str(&format!(
                "  {}: {} (signing: {})\n",
                variant.name,
                chain.join(" -> "),
                group
            )),
            None => lines.push_str(&format!("  {}: {}\n", variant.name, chain.join(" -> "))),
        }
    }

    match out.write_all(lines.as_bytes()) {
        Ok(()) => ExitCode::Success,
        Err(e) => output_failed(e),
    }
}
