// crates/gait-runpack/src/inspect.rs
// ============================================================================
// Module: Runpack Inspection
// Description: Read-only projection of an archive's manifest, run record,
//              and member list.
// Purpose: Let callers look inside an archive without running the full
//          verification state machine.
// Dependencies: zip
// ============================================================================

//! ## Overview
//! [`inspect`] does not recompute digests or check signatures; it is a
//! plain read, useful for tooling that wants to display an archive's
//! contents without paying for a full [`crate::verify::verify`] pass.

use std::fs::File;
use std::path::Path;

use crate::archive::read_all_members;
use crate::error::RunpackError;
use crate::manifest::MemberEntry;
use crate::manifest::RunpackManifest;
use crate::manifest::RunRecord;

/// A read-only view of a runpack archive's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspect {
    /// The archive's manifest.
    pub manifest: RunpackManifest,
    /// The archive's run record.
    pub run_payload: RunRecord,
    /// Every member the manifest declares.
    pub members: Vec<MemberEntry>,
}

/// Reads a runpack archive's manifest and run record without verifying
/// digests or signatures.
///
/// # Errors
///
/// Returns [`RunpackError::MissingFile`] when `manifest.json` or `run.json`
/// is absent, and [`RunpackError::ManifestMalformed`] / [`RunpackError::Json`]
/// when either cannot be parsed.
pub fn inspect(path: &Path) -> Result<Inspect, RunpackError> {
    let members = read_all_members(File::open(path)?)?;

    let manifest_bytes = members
        .get("manifest.json")
        .ok_or_else(|| RunpackError::MissingFile { member: "manifest.json".to_owned() })?;
    let manifest: RunpackManifest =
        serde_json::from_slice(manifest_bytes).map_err(|err| RunpackError::ManifestMalformed(err.to_string()))?;

    let run_bytes =
        members.get("run.json").ok_or_else(|| RunpackError::MissingFile { member: "run.json".to_owned() })?;
    let run_payload: RunRecord = serde_json::from_slice(run_bytes).map_err(RunpackError::Json)?;

    Ok(Inspect { members: manifest.members.clone(), manifest, run_payload })
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
    use gait_core::RunId;
    use gait_core::Timestamp;

    use super::inspect;
    use crate::manifest::header_for;
    use crate::manifest::RefsDocument;
    use crate::manifest::RunRecord;
    use crate::manifest::REFS_DOCUMENT_SCHEMA_ID;
    use crate::manifest::RUN_SCHEMA_ID;
    use crate::write::write;
    use crate::write::WriteOptions;

    #[test]
    fn inspect_reads_manifest_and_run_record() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let destination = dir.path().join("run.gaitpack");
        let record = RunRecord {
            header: header_for(RUN_SCHEMA_ID, Timestamp::fixed_epoch()),
            run_id: RunId::new("run_demo").expect("non-empty literal"),
            correlation_id: None,
            started_at: Timestamp::fixed_epoch(),
            finished_at: None,
            residual: serde_json::Map::new(),
        };
        let intents: Vec<serde_json::Value> = Vec::new();
        let results: Vec<serde_json::Value> = Vec::new();
        let refs = RefsDocument { header: header_for(REFS_DOCUMENT_SCHEMA_ID, Timestamp::fixed_epoch()), refs: Vec::new() };
        write(&record, &intents, &results, &refs, &destination, WriteOptions::default()).expect("archive writes");

        let result = inspect(&destination).expect("inspect reads");
        assert_eq!(result.run_payload.run_id, record.run_id);
        assert!(!result.members.is_empty());
    }
}
