// crates/gait-regress/src/normalize.rs
// ============================================================================
// Module: Normalization
// Description: Canonicalizes a runpack archive's members into a form where
//              two logically equal archives compare equal regardless of
//              incidental byte-level differences.
// Purpose: Give every grader a stable, comparable projection of an archive
//          instead of re-deriving it per grader.
// Dependencies: gait-canon, gait-runpack
// ============================================================================

//! ## Overview
//! JSON members are canonicalized via `gait_canon::canonicalize`. JSONL
//! members are split into lines, each line canonicalized independently, then
//! re-sorted by the canonical bytes of the line itself (the "stable key"),
//! so record order does not affect comparison once the records themselves
//! are otherwise identical.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::error::RegressError;

/// A runpack archive's members, normalized for stable comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRunpack {
    /// Every member's canonicalized bytes, keyed by member name.
    pub members: BTreeMap<String, Vec<u8>>,
    /// JSONL members split into canonicalized, stably-sorted lines.
    pub jsonl_lines: BTreeMap<String, Vec<Vec<u8>>>,
}

impl NormalizedRunpack {
    /// Returns whether `name` differs between `self` and `other`.
    #[must_use]
    pub fn member_differs(&self, other: &Self, name: &str) -> bool {
        if let (Some(left_lines), Some(right_lines)) = (self.jsonl_lines.get(name), other.jsonl_lines.get(name)) {
            return left_lines != right_lines;
        }
        self.members.get(name) != other.members.get(name)
    }

    /// Returns the union of member names declared by either side.
    #[must_use]
    pub fn all_member_names(&self, other: &Self) -> Vec<String> {
        let mut names: std::collections::BTreeSet<String> = self.members.keys().cloned().collect();
        names.extend(other.members.keys().cloned());
        names.into_iter().collect()
    }
}

fn canonicalize_json(bytes: &[u8]) -> Result<Vec<u8>, RegressError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(gait_canon::canonicalize(&value)?)
}

fn canonicalize_jsonl(bytes: &[u8]) -> Result<Vec<Vec<u8>>, RegressError> {
    let text = std::str::from_utf8(bytes).map_err(|_err| RegressError::NotUtf8)?;
    let mut lines = Vec::new();
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let value: serde_json::Value = serde_json::from_str(line)?;
        lines.push(gait_canon::canonicalize(&value)?);
    }
    lines.sort();
    Ok(lines)
}

/// Reads and normalizes a runpack archive at `path`.
///
/// # Errors
///
/// Returns [`RegressError::Runpack`] if the archive cannot be read, and
/// [`RegressError::Json`] / [`RegressError::Canon`] if a member cannot be
/// canonicalized.
pub fn normalize(path: &Path) -> Result<NormalizedRunpack, RegressError> {
    let raw_members = gait_runpack::archive::read_all_members(File::open(path)?)?;
    let mut members = BTreeMap::new();
    let mut jsonl_lines = BTreeMap::new();
    for (name, bytes) in raw_members {
        if name.ends_with(".jsonl") {
            let lines = canonicalize_jsonl(&bytes)?;
            let joined = lines.iter().flat_map(|line| line.iter().copied().chain(std::iter::once(b'\n'))).collect();
            jsonl_lines.insert(name.clone(), lines);
            members.insert(name, joined);
        } else if name.ends_with(".json") {
            members.insert(name.clone(), canonicalize_json(&bytes)?);
        } else {
            members.insert(name, bytes);
        }
    }
    Ok(NormalizedRunpack { members, jsonl_lines })
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

    use super::normalize;

    #[test]
    fn reordered_jsonl_lines_normalize_equal() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let left_path = dir.path().join("left.gaitpack");
        let right_path = dir.path().join("right.gaitpack");
        let record = RunRecord {
            header: header_for(RUN_SCHEMA_ID, Timestamp::fixed_epoch()),
            run_id: RunId::new("run_demo").expect("non-empty literal"),
            correlation_id: Some(CorrelationId::new("corr").expect("non-empty literal")),
            started_at: Timestamp::fixed_epoch(),
            finished_at: None,
            residual: serde_json::Map::new(),
        };
        let refs = RefsDocument { header: header_for(REFS_DOCUMENT_SCHEMA_ID, Timestamp::fixed_epoch()), refs: Vec::new() };

        let forward = vec![serde_json::json!({"a": 1}), serde_json::json!({"a": 2})];
        let reversed = vec![serde_json::json!({"a": 2}), serde_json::json!({"a": 1})];
        let results: Vec<serde_json::Value> = Vec::new();

        write(&record, &forward, &results, &refs, &left_path, WriteOptions::default()).expect("left writes");
        write(&record, &reversed, &results, &refs, &right_path, WriteOptions::default()).expect("right writes");

        let left = normalize(&left_path).expect("left normalizes");
        let right = normalize(&right_path).expect("right normalizes");
        assert!(!left.member_differs(&right, "intents.jsonl"));
    }
}
