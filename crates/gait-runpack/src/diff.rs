// crates/gait-runpack/src/diff.rs
// ============================================================================
// Module: Runpack Diff
// Description: Structural comparison of two runpack archives' canonicalized
//              members.
// Purpose: Classify what changed between two archives without caring about
//          incidental byte-level differences (whitespace, key order).
// Dependencies: gait-canon, zip
// ============================================================================

//! ## Overview
//! Comparison is over each member's canonicalized JSON projection, not raw
//! bytes, so two archives that differ only in incidental JSON formatting
//! report no change. JSONL members are compared line-by-line after each
//! line is independently canonicalized.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use crate::archive::read_all_members;
use crate::error::RunpackError;

/// How a pair of archives' differences are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticClassification {
    /// No member differs.
    None,
    /// Every changed member is newly added; nothing existing was altered.
    Additive,
    /// The only changed member is `context_envelope.json`.
    ContextDrift,
    /// Some other, non-additive, non-context-only change occurred.
    Semantic,
}

/// Result of comparing two runpack archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    /// Whether any member differs.
    pub changed: bool,
    /// Names of members that differ, sorted lexicographically.
    pub changed_files: Vec<String>,
    /// How the set of changes is classified.
    pub semantic_classification: SemanticClassification,
    /// A short human-readable summary.
    pub summary: String,
}

fn canonicalize_member(name: &str, bytes: &[u8]) -> Result<Vec<u8>, RunpackError> {
    if name.ends_with(".jsonl") {
        let text = std::str::from_utf8(bytes).map_err(|err| RunpackError::ManifestMalformed(err.to_string()))?;
        let mut out = Vec::new();
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            let value: serde_json::Value = serde_json::from_str(line).map_err(RunpackError::Json)?;
            out.extend_from_slice(&gait_canon::canonicalize(&value)?);
            out.push(b'\n');
        }
        Ok(out)
    } else if name.ends_with(".json") {
        let value: serde_json::Value = serde_json::from_slice(bytes).map_err(RunpackError::Json)?;
        Ok(gait_canon::canonicalize(&value)?)
    } else {
        Ok(bytes.to_vec())
    }
}

/// Compares two runpack archives, classifying their differences.
///
/// # Errors
///
/// Returns [`RunpackError::PathTraversal`] if either archive has a non-flat
/// member, and [`RunpackError::Json`] / [`RunpackError::Canon`] if a member
/// cannot be canonicalized for comparison.
pub fn diff(left_path: &Path, right_path: &Path) -> Result<Diff, RunpackError> {
    let left = read_all_members(File::open(left_path)?)?;
    let right = read_all_members(File::open(right_path)?)?;

    let mut all_names: BTreeSet<String> = BTreeSet::new();
    all_names.extend(left.keys().cloned());
    all_names.extend(right.keys().cloned());

    let mut changed_files = Vec::new();
    let mut added_only = true;
    for name in &all_names {
        let left_bytes = left.get(name);
        let right_bytes = right.get(name);
        match (left_bytes, right_bytes) {
            (Some(left_bytes), Some(right_bytes)) => {
                let left_canon = canonicalize_member(name, left_bytes)?;
                let right_canon = canonicalize_member(name, right_bytes)?;
                if left_canon != right_canon {
                    changed_files.push(name.clone());
                    added_only = false;
                }
            }
            (None, Some(_)) => {
                changed_files.push(name.clone());
            }
            (Some(_), None) => {
                changed_files.push(name.clone());
                added_only = false;
            }
            (None, None) => unreachable!("name drawn from the union of both member sets"),
        }
    }
    changed_files.sort();

    let changed = !changed_files.is_empty();
    let semantic_classification = if !changed {
        SemanticClassification::None
    } else if changed_files == vec!["context_envelope.json".to_owned()] {
        SemanticClassification::ContextDrift
    } else if added_only {
        SemanticClassification::Additive
    } else {
        SemanticClassification::Semantic
    };

    let summary = match semantic_classification {
        SemanticClassification::None => "no differences".to_owned(),
        SemanticClassification::Additive => format!("{} member(s) added", changed_files.len()),
        SemanticClassification::ContextDrift => "context envelope changed".to_owned(),
        SemanticClassification::Semantic => format!("{} member(s) changed", changed_files.len()),
    };

    Ok(Diff { changed, changed_files, semantic_classification, summary })
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

    use super::diff;
    use super::SemanticClassification;
    use crate::manifest::header_for;
    use crate::manifest::RefsDocument;
    use crate::manifest::RunRecord;
    use crate::manifest::REFS_DOCUMENT_SCHEMA_ID;
    use crate::manifest::RUN_SCHEMA_ID;
    use crate::write::write;
    use crate::write::WriteOptions;

    fn run_record(run_id: &str) -> RunRecord {
        RunRecord {
            header: header_for(RUN_SCHEMA_ID, Timestamp::fixed_epoch()),
            run_id: RunId::new(run_id).expect("non-empty literal"),
            correlation_id: Some(CorrelationId::new("corr_demo").expect("non-empty literal")),
            started_at: Timestamp::fixed_epoch(),
            finished_at: None,
            residual: serde_json::Map::new(),
        }
    }

    fn empty_refs() -> RefsDocument {
        RefsDocument { header: header_for(REFS_DOCUMENT_SCHEMA_ID, Timestamp::fixed_epoch()), refs: Vec::new() }
    }

    #[test]
    fn identical_archives_diff_as_none() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let left_path = dir.path().join("left.gaitpack");
        let right_path = dir.path().join("right.gaitpack");
        let record = run_record("run_demo");
        let intents: Vec<serde_json::Value> = Vec::new();
        let results: Vec<serde_json::Value> = Vec::new();
        let refs = empty_refs();

        write(&record, &intents, &results, &refs, &left_path, WriteOptions::default()).expect("left writes");
        write(&record, &intents, &results, &refs, &right_path, WriteOptions::default()).expect("right writes");

        let result = diff(&left_path, &right_path).expect("diff runs");
        assert_eq!(result.semantic_classification, SemanticClassification::None);
        assert!(!result.changed);
    }

    #[test]
    fn changed_run_id_diffs_as_semantic() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let left_path = dir.path().join("left.gaitpack");
        let right_path = dir.path().join("right.gaitpack");
        let intents: Vec<serde_json::Value> = Vec::new();
        let results: Vec<serde_json::Value> = Vec::new();
        let refs = empty_refs();

        write(&run_record("run_a"), &intents, &results, &refs, &left_path, WriteOptions::default())
            .expect("left writes");
        write(&run_record("run_b"), &intents, &results, &refs, &right_path, WriteOptions::default())
            .expect("right writes");

        let result = diff(&left_path, &right_path).expect("diff runs");
        assert_eq!(result.semantic_classification, SemanticClassification::Semantic);
        assert!(result.changed_files.contains(&"run.json".to_owned()));
    }
}
