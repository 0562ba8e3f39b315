// crates/gait-cli/src/commands/sign.rs
// ============================================================================
// Module: Sign Command
// Description: Signs and verifies a hex digest with an Ed25519 key.
// Purpose: Thin CLI wrapper over `gait_signer::sign`/`gait_signer::verify`.
// Dependencies: gait-signer
// ============================================================================

//! Arguments and dispatch for `gait sign` and `gait verify`.

use std::path::PathBuf;

use clap::Args;
use gait_signer::verify;
use gait_signer::Signature;
use gait_signer::VerifyOutcome;

use crate::commands::CommandOutcome;
use crate::error::CliResult;
use crate::keys::load_signing_key;
use crate::keys::load_verifying_key;

/// Arguments for `gait sign`.
#[derive(Args, Debug)]
pub struct SignCommand {
    /// The hex-encoded digest to sign.
    pub digest: String,
    /// Path to the private key to sign with.
    #[arg(long, value_name = "PATH")]
    pub key: PathBuf,
}

/// Runs `gait sign`.
///
/// # Errors
///
/// Propagates key-loading failures and [`gait_signer::SignerError`].
pub fn run_sign(command: &SignCommand) -> CliResult<CommandOutcome> {
    let private_key = load_signing_key(&command.key)?;
    let signature = gait_signer::sign(&private_key, &command.digest)?;
    Ok(CommandOutcome::ok(serde_json::to_value(&signature)?))
}

/// Arguments for `gait verify`.
#[derive(Args, Debug)]
pub struct VerifyCommand {
    /// The hex-encoded digest the signature was produced over.
    pub digest: String,
    /// Path to a JSON file holding the [`Signature`] to verify.
    #[arg(long, value_name = "PATH")]
    pub signature: PathBuf,
    /// Path to the public key to verify against.
    #[arg(long, value_name = "PATH")]
    pub pubkey: PathBuf,
}

/// Runs `gait verify`.
///
/// # Errors
///
/// Propagates key-loading, I/O, JSON parsing, and [`gait_signer::SignerError`]
/// failures.
pub fn run_verify(command: &VerifyCommand) -> CliResult<CommandOutcome> {
    let public_key = load_verifying_key(&command.pubkey)?;
    let signature_text = std::fs::read_to_string(&command.signature)?;
    let signature: Signature = serde_json::from_str(&signature_text)?;
    let outcome = verify(&public_key, &command.digest, &signature)?;
    let exit_code = u8::from(!matches!(outcome, VerifyOutcome::Ok));
    Ok(CommandOutcome { value: serde_json::to_value(&outcome)?, exit_code })
}
