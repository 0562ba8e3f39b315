// crates/gait-regress/src/run.rs
// ============================================================================
// Module: Regress Run
// Description: Runs every grader over a staged fixture and a candidate
//              runpack, aggregating a pass/fail verdict.
// Purpose: Turn four independent per-dimension checks into a single
//          deterministic regression verdict.
// Dependencies: gait-runpack
// ============================================================================

//! ## Overview
//! `run` builds its grader list fresh on every call, in the fixed order
//! content, receipts, context, signatures — no registration system. A
//! regression passes only if every grader passes.

use std::path::Path;

use crate::error::RegressError;
use crate::fixture::load_metadata;
use crate::fixture::ContextConformanceMode;
use crate::fixture::FIXTURE_ARCHIVE_FILE;
use crate::grader::ContentGrader;
use crate::grader::ContextGrader;
use crate::grader::Grader;
use crate::grader::GraderResult;
use crate::grader::GraderStatus;
use crate::grader::ReceiptsGrader;
use crate::grader::SignaturesGrader;
use crate::normalize::normalize;
use crate::thresholds::ContextDriftThresholds;

/// Caller-supplied parameters for [`run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Thresholds bounding additive context envelope drift.
    pub context_drift_thresholds: ContextDriftThresholds,
}

/// Overall pass/fail outcome of a regression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressStatus {
    /// Every grader passed.
    Pass,
    /// At least one grader failed.
    Fail,
}

/// Result of comparing a candidate runpack against a staged fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressResult {
    /// Overall pass/fail outcome.
    pub status: RegressStatus,
    /// Every grader's individual result, in fixed evaluation order.
    pub graders: Vec<GraderResult>,
    /// The first failing grader's first reason code, when any grader failed.
    pub top_failure_reason: Option<String>,
}

/// Compares `candidate_runpack` against the fixture staged at `fixture_dir`.
///
/// # Errors
///
/// Returns [`RegressError::MissingFixtureMetadata`] if `fixture_dir` was not
/// staged via [`crate::fixture::init`], and the normalization errors
/// [`crate::normalize::normalize`] can produce.
pub fn run(fixture_dir: &Path, candidate_runpack: &Path, options: &RunOptions) -> Result<RegressResult, RegressError> {
    let metadata = load_metadata(fixture_dir)?;
    let fixture_archive = fixture_dir.join(FIXTURE_ARCHIVE_FILE);

    let fixture = normalize(&fixture_archive)?;
    let candidate = normalize(candidate_runpack)?;

    let context_allow_list = if matches!(metadata.context_conformance_mode, ContextConformanceMode::Advisory) {
        let mut allow_list = metadata.drift_allow_list.clone();
        allow_list.push("context_envelope.json".to_owned());
        allow_list
    } else {
        metadata.drift_allow_list.clone()
    };

    let graders: Vec<Box<dyn Grader>> = vec![
        Box::new(ContentGrader { allow_list: metadata.drift_allow_list.clone(), run_id_tag: metadata.run_id.clone() }),
        Box::new(ReceiptsGrader { allow_list: metadata.drift_allow_list.clone(), run_id_tag: metadata.run_id.clone() }),
        Box::new(ContextGrader {
            allow_list: context_allow_list,
            thresholds: options.context_drift_thresholds.clone(),
            run_id_tag: metadata.run_id.clone(),
        }),
        Box::new(SignaturesGrader { allow_list: metadata.drift_allow_list.clone(), run_id_tag: metadata.run_id }),
    ];

    let results: Vec<GraderResult> = graders.iter().map(|grader| grader.grade(&fixture, &candidate)).collect();

    let status =
        if results.iter().all(|result| result.status == GraderStatus::Pass) { RegressStatus::Pass } else { RegressStatus::Fail };

    let top_failure_reason = results
        .iter()
        .find(|result| result.status == GraderStatus::Fail)
        .and_then(|result| result.reason_codes.first().cloned());

    Ok(RegressResult { status, graders: results, top_failure_reason })
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

    use super::run;
    use super::RegressStatus;
    use super::RunOptions;
    use crate::fixture::init;
    use crate::fixture::ContextConformanceMode;

    fn sample_run_record(run_id: &str) -> RunRecord {
        RunRecord {
            header: header_for(RUN_SCHEMA_ID, Timestamp::fixed_epoch()),
            run_id: RunId::new(run_id).expect("non-empty literal"),
            correlation_id: Some(CorrelationId::new("corr").expect("non-empty literal")),
            started_at: Timestamp::fixed_epoch(),
            finished_at: None,
            residual: serde_json::Map::new(),
        }
    }

    fn empty_refs() -> RefsDocument {
        RefsDocument { header: header_for(REFS_DOCUMENT_SCHEMA_ID, Timestamp::fixed_epoch()), refs: Vec::new() }
    }

    #[test]
    fn identical_candidate_passes_every_grader() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let fixture_path = dir.path().join("fixture.gaitpack");
        let candidate_path = dir.path().join("candidate.gaitpack");
        let record = sample_run_record("run_demo");
        let intents: Vec<serde_json::Value> = Vec::new();
        let results: Vec<serde_json::Value> = Vec::new();
        let refs = empty_refs();

        write(&record, &intents, &results, &refs, &fixture_path, WriteOptions::default()).expect("fixture writes");
        write(&record, &intents, &results, &refs, &candidate_path, WriteOptions::default()).expect("candidate writes");

        let fixture_dir = dir.path().join("staged");
        init(&fixture_path, &fixture_dir, Vec::new(), ContextConformanceMode::Strict, Timestamp::fixed_epoch())
            .expect("fixture stages");

        let outcome = run(&fixture_dir, &candidate_path, &RunOptions::default()).expect("run executes");
        assert_eq!(outcome.status, RegressStatus::Pass);
        assert_eq!(outcome.graders.len(), 4);
        assert!(outcome.top_failure_reason.is_none());
    }

    #[test]
    fn drifted_candidate_without_allow_listing_fails() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let fixture_path = dir.path().join("fixture.gaitpack");
        let candidate_path = dir.path().join("candidate.gaitpack");
        let refs = empty_refs();
        let intents: Vec<serde_json::Value> = Vec::new();
        let results: Vec<serde_json::Value> = Vec::new();

        write(&sample_run_record("run_a"), &intents, &results, &refs, &fixture_path, WriteOptions::default())
            .expect("fixture writes");
        write(&sample_run_record("run_b"), &intents, &results, &refs, &candidate_path, WriteOptions::default())
            .expect("candidate writes");

        let fixture_dir = dir.path().join("staged");
        init(&fixture_path, &fixture_dir, Vec::new(), ContextConformanceMode::Strict, Timestamp::fixed_epoch())
            .expect("fixture stages");

        let outcome = run(&fixture_dir, &candidate_path, &RunOptions::default()).expect("run executes");
        assert_eq!(outcome.status, RegressStatus::Fail);
        assert!(outcome.top_failure_reason.is_some());
    }
}
