// crates/gait-cli/src/commands/canon.rs
// ============================================================================
// Module: Canon Command
// Description: Canonicalizes and digests a JSON document.
// Purpose: Thin CLI wrapper over `gait_canon::digest`.
// Dependencies: gait-canon
// ============================================================================

//! Arguments and dispatch for `gait canon digest`.

use std::path::PathBuf;

use clap::Args;
use clap::Subcommand;

use crate::commands::CommandOutcome;
use crate::error::CliResult;

/// `gait canon` subcommands.
#[derive(Subcommand, Debug)]
pub enum CanonCommand {
    /// Canonicalizes a JSON document and prints its digest.
    Digest(DigestCommand),
}

/// Arguments for `gait canon digest`.
#[derive(Args, Debug)]
pub struct DigestCommand {
    /// Path to a JSON file to digest.
    pub input: PathBuf,
}

/// Runs `gait canon digest`.
///
/// # Errors
///
/// Propagates I/O, JSON parsing, and [`gait_canon::CanonError`] failures.
pub fn run_digest(command: &DigestCommand) -> CliResult<CommandOutcome> {
    let text = std::fs::read_to_string(&command.input)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let digest = gait_canon::digest(&value)?;
    Ok(CommandOutcome::ok(serde_json::json!({"digest": digest.as_str()})))
}
