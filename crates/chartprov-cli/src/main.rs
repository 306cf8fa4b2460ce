//! # chartprov CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chartprov_cli::config::{default_home, CliContext};
use chartprov_cli::inspect::{run_inspect, InspectArgs};
use chartprov_cli::signing::{run_sign, SignArgs};
use chartprov_cli::verify::{run_verify, VerifyArgs};

/// Sign and verify chart archives.
///
/// A provenance file records a chart's metadata and archive digest under
/// an OpenPGP clear signature, so consumers can check who published an
/// archive and that it has not changed since.
#[derive(Parser, Debug)]
#[command(name = "chartprov", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit log lines as JSON objects instead of plain text.
    #[arg(long, global = true)]
    log_json: bool,

    /// Directory holding the default config file and keyring.
    #[arg(long, env = "CHARTPROV_HOME", global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign a chart archive and write its provenance file.
    Sign(SignArgs),

    /// Verify a chart archive against its provenance file.
    Verify(VerifyArgs),

    /// Decode a provenance file without verifying it.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let home = cli.home.clone().unwrap_or_else(default_home);
    tracing::debug!(home = %home.display(), "chartprov starting");

    let result = CliContext::load(home, cli.config.as_deref()).and_then(|ctx| match &cli.command {
        Commands::Sign(args) => run_sign(args, &ctx),
        Commands::Verify(args) => run_verify(args, &ctx),
        Commands::Inspect(args) => run_inspect(args),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
