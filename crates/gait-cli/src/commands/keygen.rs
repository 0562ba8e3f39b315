// crates/gait-cli/src/commands/keygen.rs
// ============================================================================
// Module: Keygen Command
// Description: Generates an Ed25519 keypair for `prod` signing mode.
// Purpose: Give an operator a way to produce the key files `gate` and
//          `runpack write` consume without reaching for an external tool.
// Dependencies: gait-signer
// ============================================================================

//! Arguments and dispatch for `gait keygen`.

use std::path::PathBuf;

use clap::Args;

use crate::commands::CommandOutcome;
use crate::error::CliResult;
use crate::keys::write_keypair;

/// Arguments for `gait keygen`.
#[derive(Args, Debug)]
pub struct KeygenCommand {
    /// Path to write the hex-encoded private key to.
    #[arg(long, value_name = "PATH")]
    pub out_private: PathBuf,
    /// Path to write the hex-encoded public key to.
    #[arg(long, value_name = "PATH")]
    pub out_public: PathBuf,
}

/// Runs `gait keygen`, printing the generated key's `key_id` on success.
///
/// # Errors
///
/// Returns [`crate::error::CliError::Io`] if either output path cannot be written.
pub fn run(command: &KeygenCommand) -> CliResult<CommandOutcome> {
    let keypair = gait_signer::generate_keypair();
    write_keypair(&command.out_private, &command.out_public, &keypair)?;
    let key_id = gait_signer::key_id(&keypair.public_key);
    Ok(CommandOutcome::ok(serde_json::json!({
        "key_id": key_id,
        "private_key_path": command.out_private,
        "public_key_path": command.out_public,
    })))
}
