// crates/gait-signal/src/observation.rs
// ============================================================================
// Module: Observation Extraction
// Description: Reduces one runpack (plus optional traces and a regress
//              result) to the fixed set of fields the run fingerprint and
//              severity scoring are computed over.
// Purpose: Give every downstream step (fingerprint, family grouping,
//          severity) a single normalized shape to work from, independent of
//          which evidence sources were available for a given run.
// Dependencies: gait-core, gait-runpack
// ============================================================================

//! ## Overview
//! An observation is extracted from a runpack's `intents.jsonl`,
//! `results.jsonl`, and `refs.json` members, read directly via
//! [`gait_runpack::archive::read_all_members`] rather than through
//! [`gait_runpack::inspect::inspect`] (which only projects `manifest.json`
//! and `run.json`). Tool classes are derived from `tool_name` by token
//! matching, target systems from a `targets` array carried as residual JSON
//! on each intent entry (the typed [`gait_runpack::IntentEntry`] projection
//! does not declare targets; a producer that wants them clustered includes
//! them as an additive field, tolerated per the schema evolution rule), and
//! the reason-code vector combines result statuses, any supplied trace
//! verdicts/violations, and any supplied regress reason codes.

use std::fs::File;
use std::path::Path;

use gait_core::RunId;
use gait_policy::intent::TargetRef;
use gait_runpack::archive::read_all_members;
use gait_runpack::IntentEntry;
use gait_runpack::RefsDocument;
use gait_runpack::ResultEntry;
use gait_runpack::ResultStatus;
use gait_runpack::RunpackManifest;

use crate::error::SignalError;
use crate::severity::SeverityInputs;

/// Maximum length a target system's locator is truncated to before joining
/// it with its endpoint class, per the spec's "locator truncated to 48 chars".
const TARGET_LOCATOR_MAX_LEN: usize = 48;

/// Token groups used to derive a tool's class from its name. Checked in this
/// order; a tool name may match more than one group's tokens, in which case
/// it contributes every class it matches.
const DESTRUCTIVE_TOKENS: [&str; 7] = ["delete", "remove", "drop", "destroy", "purge", "wipe", "rm"];
const WRITE_TOKENS: [&str; 6] = ["write", "create", "update", "put", "save", "set"];
const EXECUTE_TOKENS: [&str; 5] = ["exec", "run", "invoke", "call", "spawn"];
const READ_TOKENS: [&str; 5] = ["read", "get", "list", "query", "fetch"];

/// A single evaluated gate trace's contribution to an observation, supplied
/// by the caller rather than re-parsed from a runpack (traces are not
/// themselves runpack members).
#[derive(Debug, Clone)]
pub struct TraceContribution {
    /// The trace's verdict, formatted as `verdict:<value>`.
    pub verdict_tag: String,
    /// The trace's violation codes, included verbatim.
    pub violations: Vec<String>,
}

/// One run's reduction to the fields clustering and severity scoring need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunObservation {
    /// The run this observation was extracted from.
    pub run_id: RunId,
    /// Tool names in call order.
    pub action_sequence: Vec<String>,
    /// Sorted, deduplicated tool classes derived from `action_sequence`.
    pub tool_classes: Vec<String>,
    /// Sorted, deduplicated `endpoint_class:locator` target systems.
    pub target_systems: Vec<String>,
    /// Sorted, deduplicated reason codes from results, traces, and regress.
    pub reason_code_vector: Vec<String>,
    /// Sorted, deduplicated content digests of every ref receipt retrieved.
    pub ref_receipt_digests: Vec<String>,
    /// Severity scoring inputs derived from this observation.
    pub severity_inputs: SeverityInputs,
}

/// Derives the sorted, deduplicated tool classes a tool name contributes by
/// token matching.
#[must_use]
fn classes_for_tool_name(tool_name: &str) -> Vec<&'static str> {
    let lowered = tool_name.to_lowercase();
    let mut classes = Vec::new();
    if DESTRUCTIVE_TOKENS.iter().any(|token| lowered.contains(token)) {
        classes.push("destructive");
    }
    if WRITE_TOKENS.iter().any(|token| lowered.contains(token)) {
        classes.push("write");
    }
    if EXECUTE_TOKENS.iter().any(|token| lowered.contains(token)) {
        classes.push("execute");
    }
    if READ_TOKENS.iter().any(|token| lowered.contains(token)) {
        classes.push("read");
    }
    classes
}

/// Parses an intent entry's residual `targets` field, if present, into
/// normalized `endpoint_class:locator` strings. The typed
/// [`IntentEntry`] projection drops `targets` (it is not needed for gate
/// replay), so a producer that wants them clustered carries the same
/// [`TargetRef`] shape the intent was originally submitted with as residual
/// JSON; a producer that omits it simply contributes no target systems.
fn target_systems_for_entry(entry: &IntentEntry) -> Vec<String> {
    let Some(targets_value) = entry.residual.get("targets") else {
        return Vec::new();
    };
    let Ok(targets) = serde_json::from_value::<Vec<TargetRef>>(targets_value.clone()) else {
        return Vec::new();
    };
    targets
        .into_iter()
        .map(|target| {
            let locator: String = target.value.chars().take(TARGET_LOCATOR_MAX_LEN).collect();
            format!("{}:{locator}", target.endpoint_class)
        })
        .collect()
}

fn parse_jsonl<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>, SignalError> {
    let text = std::str::from_utf8(bytes).map_err(|_err| SignalError::NotUtf8)?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(SignalError::Json))
        .collect()
}

/// Extracts an observation from the runpack archive at `path`, folding in
/// `traces` (traces produced while evaluating intents within this run) and
/// `regress_reason_codes` (reason codes from a regression run against this
/// runpack, if any was performed).
///
/// # Errors
///
/// Returns [`SignalError::Runpack`] if the archive cannot be read,
/// [`SignalError::MissingMember`] if `manifest.json` is absent,
/// [`SignalError::Json`] if a member cannot be parsed, and
/// [`SignalError::Canon`] if severity-irrelevant digesting fails.
pub fn extract_observation(
    path: &Path,
    traces: &[TraceContribution],
    regress_reason_codes: &[String],
) -> Result<RunObservation, SignalError> {
    let members = read_all_members(File::open(path)?)?;

    let manifest_bytes =
        members.get("manifest.json").ok_or_else(|| SignalError::MissingMember { member: "manifest.json".to_owned() })?;
    let manifest: RunpackManifest = serde_json::from_slice(manifest_bytes)?;

    let intents: Vec<IntentEntry> = match members.get("intents.jsonl") {
        Some(bytes) => parse_jsonl(bytes)?,
        None => Vec::new(),
    };
    let results: Vec<ResultEntry> = match members.get("results.jsonl") {
        Some(bytes) => parse_jsonl(bytes)?,
        None => Vec::new(),
    };
    let refs: RefsDocument = match members.get("refs.json") {
        Some(bytes) => serde_json::from_slice(bytes)?,
        None => RefsDocument { header: gait_runpack::manifest::header_for("gait.refs", gait_core::Timestamp::fixed_epoch()), refs: Vec::new() },
    };

    let action_sequence: Vec<String> = intents.iter().map(|entry| entry.tool_name.clone()).collect();

    let mut tool_classes: Vec<String> =
        intents.iter().flat_map(|entry| classes_for_tool_name(&entry.tool_name)).map(str::to_owned).collect();
    tool_classes.sort();
    tool_classes.dedup();

    let mut target_systems: Vec<String> = intents.iter().flat_map(target_systems_for_entry).collect();
    target_systems.sort();
    target_systems.dedup();

    let mut reason_code_vector: Vec<String> = Vec::new();
    for result in &results {
        reason_code_vector.push(match result.status {
            ResultStatus::Success => "result_status:success".to_owned(),
            ResultStatus::Failure => "result_status:failure".to_owned(),
        });
    }
    for trace in traces {
        reason_code_vector.push(trace.verdict_tag.clone());
        reason_code_vector.extend(trace.violations.iter().cloned());
    }
    reason_code_vector.extend(regress_reason_codes.iter().cloned());
    reason_code_vector = gait_schema::normalize_sorted_unique(reason_code_vector);

    let mut ref_receipt_digests: Vec<String> = refs.refs.iter().map(|receipt| receipt.content_digest.clone()).collect();
    ref_receipt_digests.sort();
    ref_receipt_digests.dedup();

    let severity_inputs = SeverityInputs::derive(&tool_classes, &target_systems, traces, reason_code_vector.len());

    Ok(RunObservation {
        run_id: manifest.run_id,
        action_sequence,
        tool_classes,
        target_systems,
        reason_code_vector,
        ref_receipt_digests,
        severity_inputs,
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
    use super::classes_for_tool_name;
    use super::TraceContribution;

    #[test]
    fn classifies_destructive_and_write_tokens() {
        assert_eq!(classes_for_tool_name("file.delete"), vec!["destructive"]);
        assert_eq!(classes_for_tool_name("file.write"), vec!["write"]);
        assert_eq!(classes_for_tool_name("proc.run_exec"), vec!["execute"]);
        assert_eq!(classes_for_tool_name("db.query_get"), vec!["read"]);
    }

    #[test]
    fn tool_name_may_contribute_multiple_classes() {
        let classes = classes_for_tool_name("backup.create_then_remove");
        assert!(classes.contains(&"destructive"));
        assert!(classes.contains(&"write"));
    }

    #[test]
    fn unmatched_tool_name_contributes_no_class() {
        assert!(classes_for_tool_name("tool.echo").is_empty());
    }

    #[test]
    fn trace_contribution_carries_verdict_and_violations() {
        let contribution =
            TraceContribution { verdict_tag: "verdict:block".to_owned(), violations: vec!["destructive_blocked".to_owned()] };
        assert_eq!(contribution.verdict_tag, "verdict:block");
        assert_eq!(contribution.violations, vec!["destructive_blocked".to_owned()]);
    }
}
