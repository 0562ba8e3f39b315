// crates/gait-cli/src/commands/runpack.rs
// ============================================================================
// Module: Runpack Command
// Description: Write, verify, diff, inspect, and migrate evidence archives.
// Purpose: Thin CLI wrapper over `gait_runpack`.
// Dependencies: gait-core, gait-runpack, gait-signer
// ============================================================================

//! Arguments and dispatch for `gait runpack write|verify|diff|inspect|migrate`.

use std::path::PathBuf;

use clap::Args;
use clap::Subcommand;
use gait_core::CancellationToken;
use gait_core::Timestamp;
use gait_runpack::manifest::RefsDocument;
use gait_runpack::manifest::RunRecord;
use gait_runpack::migrate::migrate;
use gait_runpack::migrate::MigrateOutcome;
use gait_runpack::verify::verify;
use gait_runpack::verify::VerifyOptions;
use gait_runpack::write::write;
use gait_runpack::write::WriteOptions;
use gait_signer::SigningMode;

use crate::commands::gate::SigningModeArg;
use crate::commands::CommandOutcome;
use crate::config::GaitConfig;
use crate::error::CliError;
use crate::error::CliResult;
use crate::keys::load_signing_key;
use crate::keys::load_verifying_key;

/// `gait runpack` subcommands.
#[derive(Subcommand, Debug)]
pub enum RunpackCommand {
    /// Assembles and atomically writes a runpack archive.
    Write(WriteCommand),
    /// Verifies a runpack archive against its own manifest.
    Verify(VerifyCommand),
    /// Compares two runpack archives and classifies their differences.
    Diff(DiffCommand),
    /// Prints a read-only projection of an archive's manifest and run record.
    Inspect(InspectCommand),
    /// Upgrades a legacy archive layout to the current one.
    Migrate(MigrateCommand),
}

/// Arguments for `gait runpack write`.
#[derive(Args, Debug)]
pub struct WriteCommand {
    /// Path to a JSON file holding the run record (`run.json`'s contents).
    #[arg(long, value_name = "PATH")]
    pub run: PathBuf,
    /// Path to a JSONL file holding the recorded intents, when any were recorded.
    #[arg(long, value_name = "PATH")]
    pub intents: Option<PathBuf>,
    /// Path to a JSONL file holding the recorded results, when any were recorded.
    #[arg(long, value_name = "PATH")]
    pub results: Option<PathBuf>,
    /// Path to a JSON file holding the refs document (`refs.json`'s contents).
    #[arg(long, value_name = "PATH")]
    pub refs: Option<PathBuf>,
    /// Destination path for the written archive.
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,
    /// Creation time stamped onto the manifest header.
    #[arg(long, value_name = "RFC3339", default_value = "1980-01-01T00:00:00Z")]
    pub created_at: String,
    /// Signing mode applied to the manifest digest; defaults to the loaded
    /// config's `signing_mode` when absent.
    #[arg(long, value_enum)]
    pub signing_mode: Option<SigningModeArg>,
    /// Private key to sign the manifest with; required when `--signing-mode prod`.
    #[arg(long, value_name = "PATH")]
    pub key: Option<PathBuf>,
}

/// Parses `path` as newline-delimited JSON, or returns an empty list when absent.
fn read_jsonl_values(path: &Option<PathBuf>) -> CliResult<Vec<serde_json::Value>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = std::fs::read_to_string(path)?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(CliError::from))
        .collect()
}

/// Runs `gait runpack write`.
///
/// # Errors
///
/// Returns [`CliError::Usage`] when `--signing-mode prod` is given without
/// `--key`, and propagates I/O, JSON parsing, and [`gait_runpack::RunpackError`]
/// failures.
pub fn run_write(command: &WriteCommand, config: &GaitConfig) -> CliResult<CommandOutcome> {
    let run_text = std::fs::read_to_string(&command.run)?;
    let run_record: RunRecord = serde_json::from_str(&run_text)?;

    let intents = read_jsonl_values(&command.intents)?;
    let results = read_jsonl_values(&command.results)?;

    let refs = match &command.refs {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let refs: RefsDocument = serde_json::from_str(&text)?;
            for receipt in &refs.refs {
                receipt.validate()?;
            }
            refs
        }
        None => RefsDocument { header: gait_runpack::manifest::header_for("gait.refs", Timestamp::fixed_epoch()), refs: Vec::new() },
    };

    let signing_mode: SigningMode = command.signing_mode.map_or(config.signing_mode, Into::into);
    let signing_key = command.key.as_deref().map(load_signing_key).transpose()?;
    if matches!(signing_mode, SigningMode::Prod) && signing_key.is_none() {
        return Err(CliError::Usage("--signing-mode prod requires --key".to_owned()));
    }

    let created_at =
        Timestamp::parse(&command.created_at).map_err(|err| CliError::Usage(format!("--created-at: {err}")))?;

    let options = WriteOptions {
        created_at,
        signing_mode,
        signing_key: signing_key.as_ref(),
        optional_members: Vec::new(),
        cancel: CancellationToken::new(),
    };

    let path = write(&run_record, &intents, &results, &refs, &command.out, options)?;
    Ok(CommandOutcome { value: serde_json::json!({"path": path}), exit_code: 0 })
}

/// Arguments for `gait runpack verify`.
#[derive(Args, Debug)]
pub struct VerifyCommand {
    /// Path to the archive to verify.
    pub archive: PathBuf,
    /// Public key to verify the manifest signature against, when the
    /// archive is expected to be signed.
    #[arg(long, value_name = "PATH")]
    pub pubkey: Option<PathBuf>,
    /// Tolerate a recognized legacy archive layout instead of rejecting it.
    #[arg(long)]
    pub tolerate_legacy: bool,
}

/// Runs `gait runpack verify`.
///
/// # Errors
///
/// Propagates [`gait_runpack::RunpackError`] and key-loading failures.
pub fn run_verify(command: &VerifyCommand) -> CliResult<CommandOutcome> {
    let public_key = command.pubkey.as_deref().map(load_verifying_key).transpose()?;
    let options = VerifyOptions { public_key, tolerate_legacy: command.tolerate_legacy };
    let result = verify(&command.archive, &options)?;
    let exit_code = u8::from(!result.ok);
    Ok(CommandOutcome {
        value: serde_json::json!({
            "ok": result.ok,
            "run_id": result.run_id.as_str(),
            "manifest_digest": result.manifest_digest,
            "files_checked": result.files_checked,
            "signature_status": result.signature_status,
            "legacy_type": result.legacy_type,
            "migration_hint": result.migration_hint,
        }),
        exit_code,
    })
}

/// Arguments for `gait runpack diff`.
#[derive(Args, Debug)]
pub struct DiffCommand {
    /// Path to the left-hand archive.
    pub left: PathBuf,
    /// Path to the right-hand archive.
    pub right: PathBuf,
}

/// Runs `gait runpack diff`.
///
/// # Errors
///
/// Propagates [`gait_runpack::RunpackError`].
pub fn run_diff(command: &DiffCommand) -> CliResult<CommandOutcome> {
    let result = gait_runpack::diff::diff(&command.left, &command.right)?;
    let exit_code = u8::from(result.changed) * 2;
    Ok(CommandOutcome {
        value: serde_json::json!({
            "changed": result.changed,
            "changed_files": result.changed_files,
            "semantic_classification": result.semantic_classification,
            "summary": result.summary,
        }),
        exit_code,
    })
}

/// Arguments for `gait runpack inspect`.
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Path to the archive to inspect.
    pub archive: PathBuf,
}

/// Runs `gait runpack inspect`.
///
/// # Errors
///
/// Propagates [`gait_runpack::RunpackError`].
pub fn run_inspect(command: &InspectCommand) -> CliResult<CommandOutcome> {
    let result = gait_runpack::inspect::inspect(&command.archive)?;
    Ok(CommandOutcome {
        value: serde_json::json!({
            "manifest": result.manifest,
            "run_payload": result.run_payload,
            "members": result.members,
        }),
        exit_code: 0,
    })
}

/// Arguments for `gait runpack migrate`.
#[derive(Args, Debug)]
pub struct MigrateCommand {
    /// Path to the legacy archive to migrate.
    pub archive: PathBuf,
}

/// Runs `gait runpack migrate`.
///
/// # Errors
///
/// Propagates [`gait_runpack::RunpackError`].
pub fn run_migrate(command: &MigrateCommand) -> CliResult<CommandOutcome> {
    let outcome = migrate(&command.archive)?;
    let value = match outcome {
        MigrateOutcome::Noop => serde_json::json!({"migrated": false}),
        MigrateOutcome::Migrated(path) => serde_json::json!({"migrated": true, "path": path}),
    };
    Ok(CommandOutcome { value, exit_code: 0 })
}
