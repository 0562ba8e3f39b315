// crates/gait-runpack/src/write.rs
// ============================================================================
// Module: Runpack Writer
// Description: Assembles a run's records into a signed, deterministic
//              archive and writes it atomically.
// Purpose: Turn a run's evidence into a byte-stable artifact no two
//          independent invocations with the same inputs can disagree on.
// Dependencies: gait-canon, gait-signer, zip
// ============================================================================

//! ## Overview
//! [`write`] never touches the wall clock itself: every timestamp it stamps
//! onto the manifest comes from the caller-supplied [`WriteOptions::created_at`],
//! so re-running with identical inputs (including identical options) yields a
//! byte-identical archive. The six-step algorithm is canonicalize, digest,
//! build manifest, sign, serialize, atomic rename.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use ed25519_dalek::SigningKey;
use gait_core::CancellationToken;
use gait_core::Timestamp;
use gait_signer::SigningMode;

use crate::archive::write_members;
use crate::error::RunpackError;
use crate::manifest::header_for;
use crate::manifest::MemberEntry;
use crate::manifest::RefsDocument;
use crate::manifest::RunpackManifest;
use crate::manifest::RunRecord;
use crate::manifest::MANIFEST_SCHEMA_ID;

/// An optional member beyond the five required ones, named and pre-serialized
/// by the caller.
#[derive(Debug, Clone)]
pub struct OptionalMember {
    /// The member's archive-relative name.
    pub name: String,
    /// The member's raw bytes.
    pub bytes: Vec<u8>,
}

/// Caller-supplied parameters for [`write`].
pub struct WriteOptions<'a> {
    /// Creation time stamped onto the manifest header. Supplied explicitly
    /// (never sourced from the wall clock here) so the archive stays
    /// reproducible across repeated calls.
    pub created_at: Timestamp,
    /// Signing mode; `prod` requires `signing_key`.
    pub signing_mode: SigningMode,
    /// Private key to sign the manifest digest with, when signing.
    pub signing_key: Option<&'a SigningKey>,
    /// Optional members beyond the five required ones.
    pub optional_members: Vec<OptionalMember>,
    /// Cooperative cancellation, checked before the atomic rename.
    pub cancel: CancellationToken,
}

impl Default for WriteOptions<'_> {
    fn default() -> Self {
        Self {
            created_at: Timestamp::fixed_epoch(),
            signing_mode: SigningMode::Dev,
            signing_key: None,
            optional_members: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Serializes a JSON-shaped record to its canonical bytes, used for every
/// member except the JSONL logs, which are newline-joined canonical lines.
fn canonical_member_bytes<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, RunpackError> {
    Ok(gait_canon::canonicalize(value)?)
}

fn jsonl_member_bytes<T: serde::Serialize>(entries: &[T]) -> Result<Vec<u8>, RunpackError> {
    let mut out = Vec::new();
    for entry in entries {
        out.extend_from_slice(&gait_canon::canonicalize(entry)?);
        out.push(b'\n');
    }
    Ok(out)
}

/// Assembles and atomically writes a runpack archive at `destination`.
///
/// # Errors
///
/// Returns [`RunpackError::Canon`] if any record fails to canonicalize,
/// [`RunpackError::Signer`] if signing fails, [`RunpackError::Cancelled`] if
/// cancellation is observed before the atomic rename, and
/// [`RunpackError::Io`] / [`RunpackError::Zip`] on archive I/O failure.
#[allow(clippy::too_many_arguments, reason = "mirrors the five required runpack members plus explicit options")]
pub fn write<I: serde::Serialize, R: serde::Serialize>(
    run_record: &RunRecord,
    intents: &[I],
    results: &[R],
    refs: &RefsDocument,
    destination: &Path,
    options: WriteOptions<'_>,
) -> Result<PathBuf, RunpackError> {
    let mut members: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    members.insert("run.json".to_owned(), canonical_member_bytes(run_record)?);
    members.insert("intents.jsonl".to_owned(), jsonl_member_bytes(intents)?);
    members.insert("results.jsonl".to_owned(), jsonl_member_bytes(results)?);
    members.insert("refs.json".to_owned(), canonical_member_bytes(refs)?);
    for optional in &options.optional_members {
        crate::archive::validate_member_name(&optional.name)?;
        members.insert(optional.name.clone(), optional.bytes.clone());
    }

    let member_entries: Vec<MemberEntry> = members
        .iter()
        .map(|(name, bytes)| MemberEntry {
            name: name.clone(),
            content_digest: gait_canon::digest_bytes(bytes).as_str().to_owned(),
            size: bytes.len() as u64,
        })
        .collect();

    let mut manifest = RunpackManifest {
        header: header_for(MANIFEST_SCHEMA_ID, options.created_at),
        run_id: run_record.run_id.clone(),
        members: member_entries,
        manifest_digest: String::new(),
    };
    let manifest_digest = manifest.recompute_digest()?;
    manifest.manifest_digest = manifest_digest.as_str().to_owned();

    if let Some(signature) =
        gait_signer::sign_for_mode(options.signing_mode, options.signing_key, manifest_digest.as_str())?
    {
        let signature_bytes = serde_json::to_vec(&signature).map_err(RunpackError::Json)?;
        members.insert("signature.json".to_owned(), signature_bytes);
    }

    members.insert("manifest.json".to_owned(), canonical_member_bytes(&manifest)?);

    options.cancel.check()?;

    let staging_path = staging_path_for(destination);
    {
        let staging_file = File::create(&staging_path)?;
        write_members(&staging_file, &members)?;
        staging_file.sync_all()?;
    }
    options.cancel.check()?;
    std::fs::rename(&staging_path, destination)?;

    Ok(destination.to_path_buf())
}

fn staging_path_for(destination: &Path) -> PathBuf {
    let mut staging = destination.as_os_str().to_owned();
    staging.push(".staging");
    PathBuf::from(staging)
}
