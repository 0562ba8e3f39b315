// crates/gait-cli/src/main.rs
// ============================================================================
// Module: Gait CLI
// Description: `clap`-derived subcommands wiring every library crate to the
//              process exit code table.
// Purpose: The single binary entry point for the offline tool-call control
//          plane: policy gating, runpack evidence, regression checks, and
//          incident signal reporting.
// Dependencies: clap, gait-broker, gait-core, gait-policy, gait-regress,
//               gait-runpack, gait-signal, gait-signer, tracing,
//               tracing-subscriber
// ============================================================================

//! ## Overview
//! `main` parses arguments, initializes one process-wide tracing subscriber,
//! loads [`config::GaitConfig`] from an optional `--config` path, dispatches
//! to the matched subcommand's module under [`commands`], and turns the
//! result into a process exit code: a successful command's own
//! [`commands::CommandOutcome::exit_code`] on success, or
//! [`error::CliError::exit_code`] on failure. Every command prints its JSON
//! result to stdout before the process exits; nothing is printed on a
//! structural parse failure, which `clap` itself reports to stderr.

mod commands;
mod config;
mod error;
mod keys;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::EnvFilter;

use crate::commands::canon::CanonCommand;
use crate::commands::gate::GateCommand;
use crate::commands::keygen::KeygenCommand;
use crate::commands::regress::RegressCommand;
use crate::commands::runpack::RunpackCommand;
use crate::commands::sign::SignCommand;
use crate::commands::sign::VerifyCommand;
use crate::commands::signal::SignalCommand;
use crate::commands::CommandOutcome;
use crate::config::GaitConfig;
use crate::error::CliError;
use crate::error::CliResult;

/// The offline-first tool-call control plane CLI.
#[derive(Parser, Debug)]
#[command(name = "gait", version, about)]
struct Cli {
    /// Path to a TOML config file overriding process-level defaults.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<std::path::PathBuf>,
    /// Enable debug-level tracing.
    #[arg(long, global = true)]
    debug: bool,
    /// The subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Every top-level subcommand `gait` exposes.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Canonicalization and digesting operations.
    Canon {
        /// The canon operation to perform.
        #[command(subcommand)]
        command: CanonCommand,
    },
    /// Signs a hex digest with an Ed25519 private key.
    Sign(SignCommand),
    /// Verifies a signature over a hex digest with an Ed25519 public key.
    Verify(VerifyCommand),
    /// Generates an Ed25519 keypair.
    Keygen(KeygenCommand),
    /// Evaluates an intent against a policy.
    Gate(GateCommand),
    /// Runpack evidence archive operations.
    Runpack {
        /// The runpack operation to perform.
        #[command(subcommand)]
        command: RunpackCommand,
    },
    /// Regression fixture staging and comparison.
    Regress {
        /// The regression operation to perform.
        #[command(subcommand)]
        command: RegressCommand,
    },
    /// Incident clustering and ranked reporting.
    Signal {
        /// The signal operation to perform.
        #[command(subcommand)]
        command: SignalCommand,
    },
}

/// Initializes the process-wide tracing subscriber, scoped to this crate's
/// own target so library crates stay quiet unless `--debug` is given.
fn init_tracing(debug: bool) {
    let filter = if debug { EnvFilter::new("gait=debug") } else { EnvFilter::new("gait=info") };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Dispatches the parsed command to its module, loading config first.
fn dispatch(cli: &Cli) -> CliResult<CommandOutcome> {
    let config = GaitConfig::load(cli.config.as_deref())?;
    match &cli.command {
        Commands::Canon { command } => match command {
            CanonCommand::Digest(command) => commands::canon::run_digest(command),
        },
        Commands::Sign(command) => commands::sign::run_sign(command),
        Commands::Verify(command) => commands::sign::run_verify(command),
        Commands::Keygen(command) => commands::keygen::run(command),
        Commands::Gate(command) => commands::gate::run(command, &config),
        Commands::Runpack { command } => match command {
            RunpackCommand::Write(command) => commands::runpack::run_write(command, &config),
            RunpackCommand::Verify(command) => commands::runpack::run_verify(command),
            RunpackCommand::Diff(command) => commands::runpack::run_diff(command),
            RunpackCommand::Inspect(command) => commands::runpack::run_inspect(command),
            RunpackCommand::Migrate(command) => commands::runpack::run_migrate(command),
        },
        Commands::Regress { command } => match command {
            RegressCommand::Init(command) => commands::regress::run_init(command),
            RegressCommand::Run(command) => commands::regress::run_run(command),
        },
        Commands::Signal { command } => match command {
            SignalCommand::Report(command) => commands::signal::run_report(command),
        },
    }
}

/// Writes a line to stdout, not panicking on a broken pipe.
fn write_stdout_line(message: &str) {
    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout, "{message}");
}

/// Writes a line to stderr, not panicking on a broken pipe.
fn write_stderr_line(message: &str) {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{message}");
}

/// Parses arguments, dispatches to the matched subcommand, and maps the
/// result onto a process exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match dispatch(&cli) {
        Ok(outcome) => {
            match serde_json::to_string_pretty(&outcome.value) {
                Ok(text) => write_stdout_line(&text),
                Err(err) => {
                    tracing::error!(%err, "failed to serialize command output");
                    return ExitCode::from(1);
                }
            }
            ExitCode::from(outcome.exit_code)
        }
        Err(err) => {
            tracing::error!(%err, "command failed");
            write_stderr_line(&err.to_string());
            ExitCode::from(error_exit_code(&err))
        }
    }
}

/// Extracted so the exit-code mapping is testable without spawning a process.
fn error_exit_code(err: &CliError) -> u8 {
    err.exit_code()
}
