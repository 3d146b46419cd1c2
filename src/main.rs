//! RCH Variants CLI
//!
//! Entry point for the `rch-variants` command-line tool.

use clap::{Parser, Subcommand};
use rch_variant_config::commands::{self, Format};
use rch_variant_config::exit::ExitCode;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rch-variants")]
#[command(about = "Resolve build-variant configuration", version)]
struct Cli {
    /// Log resolution steps to stderr (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one variant and print its effective configuration
    Resolve {
        /// Path to the build descriptor (TOML)
        descriptor: PathBuf,

        /// Variant to resolve
        #[arg(long)]
        variant: String,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: Format,

        /// Prefix for environment variable names (env format only)
        #[arg(long, default_value = "")]
        env_prefix: String,

        /// Highest-precedence override, repeatable (key=value)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },

    /// Resolve every variant and report which are buildable
    Verify {
        /// Path to the build descriptor (TOML)
        descriptor: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List declared variants and their layer chains
    Variants {
        /// Path to the build descriptor (TOML)
        descriptor: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut out = io::stdout().lock();
    let code = match cli.command {
        Commands::Resolve {
            descriptor,
            variant,
            format,
            env_prefix,
            overrides,
        } => commands::resolve(
            &mut out,
            &descriptor,
            &variant,
            format,
            &env_prefix,
            &overrides,
        ),
        Commands::Verify { descriptor, json } => commands::verify(&mut out, &descriptor, json),
        Commands::Variants { descriptor } => commands::variants(&mut out, &descriptor),
    };

    let code = match out.flush() {
        Ok(()) => code,
        Err(_) => ExitCode::Output,
    };
    process::exit(code.as_i32());
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
