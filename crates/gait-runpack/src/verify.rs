// crates/gait-runpack/src/verify.rs
// ============================================================================
// Module: Runpack Verifier
// Description: Opens an archive, recomputes every member digest against the
//              manifest, and checks the manifest signature.
// Purpose: Give callers a typed, classified verdict on whether an archive is
//          exactly what its manifest claims, never a silent pass.
// Dependencies: gait-canon, gait-signer, zip
// ============================================================================

//! ## Overview
//! Verification runs as a small state machine: open, parse manifest,
//! recompute digests, verify signature, ok. Every step produces a typed
//! failure rather than a panic or a silent skip; [`verify`] never returns
//! `ok = true` unless every declared member's digest matched and, when a
//! signature is present, it verified.

use std::fs::File;
use std::path::Path;

use ed25519_dalek::VerifyingKey;
use gait_core::RunId;

use crate::archive::read_all_members;
use crate::error::RunpackError;
use crate::manifest::RunpackManifest;
use crate::migrate::detect_legacy_layout;
use crate::migrate::LegacyLayout;

/// Status of a runpack's manifest signature after verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    /// The manifest is signed and the signature verified.
    Signed,
    /// No `signature.json` member is present; not a failure in `dev` mode.
    Unsigned,
    /// A signature is present but failed verification.
    Invalid,
}

/// Caller-supplied parameters for [`verify`].
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Public key to verify the manifest signature against, when present.
    pub public_key: Option<VerifyingKey>,
    /// Whether an archive recognized as a legacy layout is tolerated rather
    /// than rejected outright.
    pub tolerate_legacy: bool,
}

/// The outcome of verifying a runpack archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    /// Whether every check passed.
    pub ok: bool,
    /// The run identifier the manifest declares.
    pub run_id: RunId,
    /// The manifest's own digest.
    pub manifest_digest: String,
    /// Number of members whose content digest was recomputed and checked.
    pub files_checked: usize,
    /// Signature verification outcome.
    pub signature_status: SignatureStatus,
    /// The legacy layout detected, if the archive is not a modern runpack.
    pub legacy_type: Option<LegacyLayout>,
    /// A human-readable hint pointing at [`crate::migrate::migrate`] when a
    /// legacy layout was detected.
    pub migration_hint: Option<String>,
}

/// Verifies a runpack archive against its own manifest.
///
/// # Errors
///
/// Returns [`RunpackError::PathTraversal`] if any member name is not flat,
/// [`RunpackError::MissingFile`] if a declared member is absent,
/// [`RunpackError::HashMismatch`] if a member's recomputed digest does not
/// match the manifest, [`RunpackError::UndeclaredMember`] if an
/// undeclared member is present and legacy tolerance does not cover it, and
/// [`RunpackError::ManifestDigestMismatch`] if the manifest's own digest does
/// not match its recomputed value.
pub fn verify(path: &Path, options: &VerifyOptions) -> Result<VerifyResult, RunpackError> {
    let file = File::open(path)?;
    let members = read_all_members(file)?;

    let manifest_bytes = members.get("manifest.json").ok_or_else(|| RunpackError::MissingFile {
        member: "manifest.json".to_owned(),
    })?;
    let manifest: RunpackManifest =
        serde_json::from_slice(manifest_bytes).map_err(|err| RunpackError::ManifestMalformed(err.to_string()))?;

    let recomputed_manifest_digest = manifest.recompute_digest()?;
    if recomputed_manifest_digest.as_str() != manifest.manifest_digest {
        return Err(RunpackError::ManifestDigestMismatch);
    }

    let mut files_checked = 1_usize; // manifest.json itself, recomputed above.
    for entry in &manifest.members {
        let bytes = members
            .get(&entry.name)
            .ok_or_else(|| RunpackError::MissingFile { member: entry.name.clone() })?;
        let actual_digest = gait_canon::digest_bytes(bytes);
        if actual_digest.as_str() != entry.content_digest {
            return Err(RunpackError::HashMismatch { member: entry.name.clone() });
        }
        files_checked += 1;
    }

    let declared: std::collections::BTreeSet<&str> =
        manifest.members.iter().map(|entry| entry.name.as_str()).collect();
    let legacy_type = detect_legacy_layout(&members);
    for name in members.keys() {
        let is_declared =
            declared.contains(name.as_str()) || name == "manifest.json" || name == "signature.json";
        if !is_declared && !(options.tolerate_legacy && legacy_type.is_some()) {
            return Err(RunpackError::UndeclaredMember { member: name.clone() });
        }
    }
    if members.contains_key("signature.json") {
        files_checked += 1;
    }

    let signature_status = match members.get("signature.json") {
        None => SignatureStatus::Unsigned,
        Some(signature_bytes) => {
            let signature: gait_signer::Signature =
                serde_json::from_slice(signature_bytes).map_err(RunpackError::Json)?;
            match options.public_key {
                None => SignatureStatus::Unsigned,
                Some(public_key) => {
                    match gait_signer::verify(&public_key, &manifest.manifest_digest, &signature)? {
                        gait_signer::VerifyOutcome::Ok => SignatureStatus::Signed,
                        gait_signer::VerifyOutcome::Failed { .. } => SignatureStatus::Invalid,
                    }
                }
            }
        }
    };

    let ok = !matches!(signature_status, SignatureStatus::Invalid);

    Ok(VerifyResult {
        ok,
        run_id: manifest.run_id.clone(),
        manifest_digest: manifest.manifest_digest.clone(),
        files_checked,
        signature_status,
        legacy_type,
        migration_hint: legacy_type.map(|_| "archive uses a legacy layout; run migrate to upgrade it".to_owned()),
    })
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
    use gait_core::CorrelationId;
    use gait_core::RunId;
    use gait_core::Timestamp;

    use super::verify;
    use super::SignatureStatus;
    use super::VerifyOptions;
    use crate::manifest::header_for;
    use crate::manifest::RefsDocument;
    use crate::manifest::RunRecord;
    use crate::manifest::REFS_DOCUMENT_SCHEMA_ID;
    use crate::manifest::RUN_SCHEMA_ID;
    use crate::write::write;
    use crate::write::WriteOptions;

    fn sample_run_record() -> RunRecord {
        RunRecord {
            header: header_for(RUN_SCHEMA_ID, Timestamp::fixed_epoch()),
            run_id: RunId::new("run_demo").expect("non-empty literal"),
            correlation_id: Some(CorrelationId::new("corr_demo").expect("non-empty literal")),
            started_at: Timestamp::fixed_epoch(),
            finished_at: None,
            residual: serde_json::Map::new(),
        }
    }

    #[test]
    fn tampered_member_fails_verification() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let destination = dir.path().join("run.gaitpack");
        let run_record = sample_run_record();
        let intents: Vec<serde_json::Value> = Vec::new();
        let results: Vec<serde_json::Value> = Vec::new();
        let refs = RefsDocument { header: header_for(REFS_DOCUMENT_SCHEMA_ID, Timestamp::fixed_epoch()), refs: Vec::new() };

        write(&run_record, &intents, &results, &refs, &destination, WriteOptions::default())
            .expect("archive writes");

        let bytes = std::fs::read(&destination).expect("archive reads back");
        let mut tampered = bytes.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0xFF;
        std::fs::write(&destination, tampered).expect("tampered archive writes");

        let result = verify(&destination, &VerifyOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn unsigned_archive_verifies_as_unsigned() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let destination = dir.path().join("run.gaitpack");
        let run_record = sample_run_record();
        let intents: Vec<serde_json::Value> = Vec::new();
        let results: Vec<serde_json::Value> = Vec::new();
        let refs = RefsDocument { header: header_for(REFS_DOCUMENT_SCHEMA_ID, Timestamp::fixed_epoch()), refs: Vec::new() };

        write(&run_record, &intents, &results, &refs, &destination, WriteOptions::default())
            .expect("archive writes");

        let result = verify(&destination, &VerifyOptions::default()).expect("archive verifies");
        assert_eq!(result.signature_status, SignatureStatus::Unsigned);
        assert!(result.ok);
    }
}
