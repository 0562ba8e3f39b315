// crates/gait-regress/src/fixture.rs
// ============================================================================
// Module: Fixture Staging
// Description: Stages a fixture runpack into a working directory alongside a
//              metadata record describing what drift is tolerated.
// Purpose: Separate "what the fixture expects" from "how a candidate is
//          compared against it", so the allow-list is declared once, not
//          re-derived on every run.
// Dependencies: gait-core, gait-runpack
// ============================================================================

//! Stages a fixture runpack and records the drift its metadata tolerates.

use std::path::Path;
use std::path::PathBuf;

use gait_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::error::RegressError;

/// How strictly the context envelope must match between fixture and
/// candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextConformanceMode {
    /// Any non-additive context drift fails the run.
    Strict,
    /// Context drift is recorded but never fails the run on its own.
    Advisory,
}

/// Metadata describing a staged fixture, written alongside the copied
/// archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureMetadata {
    /// The fixture's run identifier.
    pub run_id: String,
    /// The fixture archive's manifest digest.
    pub manifest_digest: String,
    /// The fixture's expected context set digest, when the fixture declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_context_digest: Option<String>,
    /// Member names permitted to vary between fixture and candidate.
    #[serde(default)]
    pub drift_allow_list: Vec<String>,
    /// How strictly the context envelope must match.
    pub context_conformance_mode: ContextConformanceMode,
    /// When this fixture was staged.
    pub staged_at: Timestamp,
}

/// The file name the fixture metadata record is written under.
pub const FIXTURE_METADATA_FILE: &str = "fixture.json";
/// The file name the staged fixture archive copy is written under.
pub const FIXTURE_ARCHIVE_FILE: &str = "fixture.gaitpack";

/// Stages `fixture_runpack` into a fresh subdirectory of `fixture_dir`,
/// copying the archive and writing its metadata record.
///
/// # Errors
///
/// Returns [`RegressError::Runpack`] if the fixture archive cannot be read,
/// and [`RegressError::Io`] if staging fails.
pub fn init(
    fixture_runpack: &Path,
    fixture_dir: &Path,
    drift_allow_list: Vec<String>,
    context_conformance_mode: ContextConformanceMode,
    staged_at: Timestamp,
) -> Result<PathBuf, RegressError> {
    std::fs::create_dir_all(fixture_dir)?;

    let inspected = gait_runpack::inspect::inspect(fixture_runpack)?;
    let expected_context_digest = inspected
        .members
        .iter()
        .find(|member| member.name == "context_envelope.json")
        .map(|member| member.content_digest.clone());

    let metadata = FixtureMetadata {
        run_id: inspected.manifest.run_id.to_string(),
        manifest_digest: inspected.manifest.manifest_digest.clone(),
        expected_context_digest,
        drift_allow_list,
        context_conformance_mode,
        staged_at,
    };

    let archive_path = fixture_dir.join(FIXTURE_ARCHIVE_FILE);
    std::fs::copy(fixture_runpack, &archive_path)?;

    let metadata_path = fixture_dir.join(FIXTURE_METADATA_FILE);
    let metadata_bytes = serde_json::to_vec_pretty(&metadata).map_err(RegressError::Json)?;
    std::fs::write(&metadata_path, metadata_bytes)?;

    Ok(fixture_dir.to_path_buf())
}

/// Reads back a previously staged fixture's metadata record.
///
/// # Errors
///
/// Returns [`RegressError::MissingFixtureMetadata`] if `fixture_dir` has no
/// metadata record, and [`RegressError::FixtureMetadataMalformed`] if it
/// cannot be parsed.
pub fn load_metadata(fixture_dir: &Path) -> Result<FixtureMetadata, RegressError> {
    let metadata_path = fixture_dir.join(FIXTURE_METADATA_FILE);
    if !metadata_path.exists() {
        return Err(RegressError::MissingFixtureMetadata);
    }
    let bytes = std::fs::read(&metadata_path)?;
    serde_json::from_slice(&bytes).map_err(|err| RegressError::FixtureMetadataMalformed(err.to_string()))
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
    use gait_runpack::manifest::header_for;
    use gait_runpack::manifest::RefsDocument;
    use gait_runpack::manifest::RunRecord;
    use gait_runpack::manifest::REFS_DOCUMENT_SCHEMA_ID;
    use gait_runpack::manifest::RUN_SCHEMA_ID;
    use gait_runpack::write::write;
    use gait_runpack::write::WriteOptions;

    use super::init;
    use super::load_metadata;
    use super::ContextConformanceMode;

    #[test]
    fn init_stages_archive_and_metadata() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let fixture_path = dir.path().join("fixture.gaitpack");
        let record = RunRecord {
            header: header_for(RUN_SCHEMA_ID, Timestamp::fixed_epoch()),
            run_id: RunId::new("run_demo").expect("non-empty literal"),
            correlation_id: Some(CorrelationId::new("corr").expect("non-empty literal")),
            started_at: Timestamp::fixed_epoch(),
            finished_at: None,
            residual: serde_json::Map::new(),
        };
        let intents: Vec<serde_json::Value> = Vec::new();
        let results: Vec<serde_json::Value> = Vec::new();
        let refs = RefsDocument { header: header_for(REFS_DOCUMENT_SCHEMA_ID, Timestamp::fixed_epoch()), refs: Vec::new() };
        write(&record, &intents, &results, &refs, &fixture_path, WriteOptions::default()).expect("fixture writes");

        let staged_dir = dir.path().join("staged");
        init(&fixture_path, &staged_dir, vec!["refs.json".to_owned()], ContextConformanceMode::Strict, Timestamp::fixed_epoch())
            .expect("init stages fixture");

        let metadata = load_metadata(&staged_dir).expect("metadata loads");
        assert_eq!(metadata.run_id, "run_demo");
        assert_eq!(metadata.drift_allow_list, vec!["refs.json".to_owned()]);
    }
}
