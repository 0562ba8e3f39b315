// crates/gait-runpack/src/migrate.rs
// ============================================================================
// Module: Runpack Migration
// Description: Detects legacy archive layouts and upgrades them to the
//              current member set without touching the source archive.
// Purpose: Let older archives keep working while steering callers toward the
//          current layout.
// Dependencies: gait-canon, zip
// ============================================================================

//! ## Overview
//! A legacy archive is recognized by member pattern: it carries the four
//! original required members but lacks `refs.json`. Migration never
//! rewrites the source; it emits a new archive with a `.migrated` suffix
//! and an empty refs document synthesized in.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use gait_core::Timestamp;

use crate::archive::read_all_members;
use crate::error::RunpackError;
use crate::manifest::header_for;
use crate::manifest::RefsDocument;
use crate::manifest::RunRecord;
use crate::manifest::REFS_DOCUMENT_SCHEMA_ID;
use crate::manifest::RUN_SCHEMA_ID;
use crate::write::write;
use crate::write::WriteOptions;

/// Recognized legacy archive layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyLayout {
    /// The four original members are present but `refs.json` is absent.
    MissingRefsDocument,
}

/// The four members a legacy archive is expected to carry.
const LEGACY_REQUIRED_MEMBERS: [&str; 4] = ["manifest.json", "run.json", "intents.jsonl", "results.jsonl"];

/// Detects whether a member set matches a recognized legacy layout.
#[must_use]
pub fn detect_legacy_layout(members: &BTreeMap<String, Vec<u8>>) -> Option<LegacyLayout> {
    let has_legacy_core = LEGACY_REQUIRED_MEMBERS.iter().all(|name| members.contains_key(*name));
    let has_refs = members.contains_key("refs.json");
    if has_legacy_core && !has_refs {
        Some(LegacyLayout::MissingRefsDocument)
    } else {
        None
    }
}

/// Outcome of attempting to migrate an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrateOutcome {
    /// The archive already uses the current layout; no new archive was written.
    Noop,
    /// A new archive was written at this path.
    Migrated(PathBuf),
}

/// Migrates a legacy archive at `legacy_path` to the current layout,
/// writing the result alongside it with a `.migrated` suffix. Never rewrites
/// or deletes `legacy_path`.
///
/// # Errors
///
/// Returns [`RunpackError::NotARunpack`] when the archive matches neither
/// the current nor a recognized legacy layout, and the errors [`write`]
/// and [`crate::archive::read_all_members`] can produce.
pub fn migrate(legacy_path: &Path) -> Result<MigrateOutcome, RunpackError> {
    let file = File::open(legacy_path)?;
    let members = read_all_members(file)?;

    if members.contains_key("refs.json") {
        return Ok(MigrateOutcome::Noop);
    }

    let Some(LegacyLayout::MissingRefsDocument) = detect_legacy_layout(&members) else {
        return Err(RunpackError::NotARunpack(
            "archive matches neither the current layout nor a recognized legacy layout".to_owned(),
        ));
    };

    let run_bytes =
        members.get("run.json").ok_or_else(|| RunpackError::MissingFile { member: "run.json".to_owned() })?;
    let run_record: RunRecord = serde_json::from_slice(run_bytes).map_err(RunpackError::Json)?;
    let intents: Vec<serde_json::Value> = parse_jsonl(
        members.get("intents.jsonl").ok_or_else(|| RunpackError::MissingFile { member: "intents.jsonl".to_owned() })?,
    )?;
    let results: Vec<serde_json::Value> = parse_jsonl(
        members.get("results.jsonl").ok_or_else(|| RunpackError::MissingFile { member: "results.jsonl".to_owned() })?,
    )?;
    let refs = RefsDocument { header: header_for(REFS_DOCUMENT_SCHEMA_ID, Timestamp::fixed_epoch()), refs: Vec::new() };

    let mut destination = legacy_path.as_os_str().to_owned();
    destination.push(".migrated");
    let destination = PathBuf::from(destination);

    let upgraded_header = header_for(RUN_SCHEMA_ID, run_record.header.created_at);
    let upgraded_run_record = RunRecord { header: upgraded_header, ..run_record };

    write(&upgraded_run_record, &intents, &results, &refs, &destination, WriteOptions::default())?;

    Ok(MigrateOutcome::Migrated(destination))
}

fn parse_jsonl(bytes: &[u8]) -> Result<Vec<serde_json::Value>, RunpackError> {
    let text = std::str::from_utf8(bytes).map_err(|err| RunpackError::ManifestMalformed(err.to_string()))?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(RunpackError::Json))
        .collect()
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
    use std::collections::BTreeMap;

    use super::detect_legacy_layout;
    use super::migrate;
    use super::MigrateOutcome;

    #[test]
    fn detects_legacy_layout_missing_refs() {
        let mut members = BTreeMap::new();
        members.insert("manifest.json".to_owned(), Vec::new());
        members.insert("run.json".to_owned(), Vec::new());
        members.insert("intents.jsonl".to_owned(), Vec::new());
        members.insert("results.jsonl".to_owned(), Vec::new());
        assert!(detect_legacy_layout(&members).is_some());

        members.insert("refs.json".to_owned(), Vec::new());
        assert!(detect_legacy_layout(&members).is_none());
    }

    #[test]
    fn modern_archive_migration_is_a_noop() {
        use gait_core::CorrelationId;
        use gait_core::RunId;
        use gait_core::Timestamp;

        use crate::manifest::header_for;
        use crate::manifest::RefsDocument;
        use crate::manifest::RunRecord;
        use crate::manifest::REFS_DOCUMENT_SCHEMA_ID;
        use crate::manifest::RUN_SCHEMA_ID;
        use crate::write::write;
        use crate::write::WriteOptions;

        let dir = tempfile::tempdir().expect("tempdir creates");
        let destination = dir.path().join("run.gaitpack");
        let run_record = RunRecord {
            header: header_for(RUN_SCHEMA_ID, Timestamp::fixed_epoch()),
            run_id: RunId::new("run_demo").expect("non-empty literal"),
            correlation_id: Some(CorrelationId::new("corr_demo").expect("non-empty literal")),
            started_at: Timestamp::fixed_epoch(),
            finished_at: None,
            residual: serde_json::Map::new(),
        };
        let intents: Vec<serde_json::Value> = Vec::new();
        let results: Vec<serde_json::Value> = Vec::new();
        let refs = RefsDocument { header: header_for(REFS_DOCUMENT_SCHEMA_ID, Timestamp::fixed_epoch()), refs: Vec::new() };
        write(&run_record, &intents, &results, &refs, &destination, WriteOptions::default())
            .expect("archive writes");

        let outcome = migrate(&destination).expect("migration runs");
        assert_eq!(outcome, MigrateOutcome::Noop);
    }
}
