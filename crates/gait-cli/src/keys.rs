// crates/gait-cli/src/keys.rs
// ============================================================================
// Module: Key File Loading
// Description: Reads and writes Ed25519 keypairs as hex-encoded files.
// Purpose: Give every signing-aware command a single, shared way to turn a
//          `--key`/`--pubkey` path into the types `gait-signer` expects.
// Dependencies: ed25519-dalek, gait-signer
// ============================================================================

//! ## Overview
//! A key file is a single line of lowercase hex: 64 characters (32 bytes) for
//! both the private seed and the public key, matching the hex convention
//! `gait-canon` digests already use elsewhere in this workspace. This is a
//! CLI-local convenience format, not a schema record; nothing outside this
//! crate reads it.

use std::path::Path;

use crate::error::CliError;

/// Decodes `text` as 64 lowercase hex characters into 32 bytes.
fn decode_32_bytes(text: &str, what: &str) -> Result<[u8; 32], CliError> {
    let trimmed = text.trim();
    if trimmed.len() != 64 {
        return Err(CliError::Usage(format!("{what} file must contain 64 hex characters")));
    }
    let mut out = [0_u8; 32];
    for (index, chunk) in trimmed.as_bytes().chunks(2).enumerate() {
        let byte_str = std::str::from_utf8(chunk).map_err(|_err| CliError::Usage(format!("{what} file is not valid hex")))?;
        let byte = u8::from_str_radix(byte_str, 16).map_err(|_err| CliError::Usage(format!("{what} file is not valid hex")))?;
        out[index] = byte;
    }
    Ok(out)
}

/// Reads an Ed25519 signing key from `path`.
///
/// # Errors
///
/// Returns [`CliError::Io`] if `path` cannot be read, and [`CliError::Usage`]
/// if its contents are not 64 hex characters.
pub fn load_signing_key(path: &Path) -> Result<ed25519_dalek::SigningKey, CliError> {
    let text = std::fs::read_to_string(path)?;
    let bytes = decode_32_bytes(&text, "private key")?;
    Ok(ed25519_dalek::SigningKey::from_bytes(&bytes))
}

/// Reads an Ed25519 verifying key from `path`.
///
/// # Errors
///
/// Returns [`CliError::Io`] if `path` cannot be read, and [`CliError::Usage`]
/// if its contents are not 64 hex characters or not a valid public key.
pub fn load_verifying_key(path: &Path) -> Result<ed25519_dalek::VerifyingKey, CliError> {
    let text = std::fs::read_to_string(path)?;
    let bytes = decode_32_bytes(&text, "public key")?;
    ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(|_err| CliError::Usage("public key file is not a valid Ed25519 key".to_owned()))
}

/// Writes `keypair` to `private_path`/`public_path` as hex, one line each.
///
/// # Errors
///
/// Returns [`CliError::Io`] if either file cannot be written.
pub fn write_keypair(private_path: &Path, public_path: &Path, keypair: &gait_signer::Keypair) -> Result<(), CliError> {
    let private_hex: String = keypair.private_key.to_bytes().iter().map(|byte| format!("{byte:02x}")).collect();
    let public_hex: String = keypair.public_key.to_bytes().iter().map(|byte| format!("{byte:02x}")).collect();
    std::fs::write(private_path, private_hex)?;
    std::fs::write(public_path, public_hex)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]
    use tempfile::tempdir;

    use super::load_signing_key;
    use super::load_verifying_key;
    use super::write_keypair;

    #[test]
    fn keypair_round_trips_through_hex_files() {
        let dir = tempdir().expect("temp dir");
        let private_path = dir.path().join("key.priv");
        let public_path = dir.path().join("key.pub");
        let keypair = gait_signer::generate_keypair();
        write_keypair(&private_path, &public_path, &keypair).expect("writes");

        let loaded_private = load_signing_key(&private_path).expect("reads private key");
        let loaded_public = load_verifying_key(&public_path).expect("reads public key");
        assert_eq!(loaded_private.to_bytes(), keypair.private_key.to_bytes());
        assert_eq!(loaded_public.to_bytes(), keypair.public_key.to_bytes());
    }

    #[test]
    fn rejects_malformed_hex() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("key.priv");
        std::fs::write(&path, "not-hex").expect("write");
        assert!(load_signing_key(&path).is_err());
    }
}
