// crates/gait-cli/src/commands/signal.rs
// ============================================================================
// Module: Signal Command
// Description: Clusters a set of runpacks into ranked incident families.
// Purpose: Thin CLI wrapper over `gait_signal`.
// Dependencies: gait-signal
// ============================================================================

//! Arguments and dispatch for `gait signal report`.

use std::path::PathBuf;

use clap::Args;
use clap::Subcommand;
use gait_signal::observation::extract_observation;
use gait_signal::report::build_report;
use gait_signal::report::SignalIssue;

use crate::commands::CommandOutcome;
use crate::error::CliResult;

/// `gait signal` subcommands.
#[derive(Subcommand, Debug)]
pub enum SignalCommand {
    /// Builds a ranked signal report over a set of runpacks.
    Report(ReportCommand),
}

/// Arguments for `gait signal report`.
#[derive(Args, Debug)]
pub struct ReportCommand {
    /// Paths to the runpack archives to cluster.
    #[arg(required = true, value_name = "ARCHIVE")]
    pub runpacks: Vec<PathBuf>,
}

/// Projects a [`SignalIssue`] into the JSON shape printed by `report`.
fn issue_to_json(issue: &SignalIssue) -> serde_json::Value {
    serde_json::json!({
        "family_id": issue.family_id.as_str(),
        "canonical_run_id": issue.canonical_run_id.as_str(),
        "member_count": issue.member_count,
        "severity_score": issue.severity_score,
        "severity_level": issue.severity_level,
        "dominant_reason_code": issue.dominant_reason_code,
        "driver_categories": issue.driver_categories,
        "fix_suggestions": issue.fix_suggestions,
    })
}

/// Runs `gait signal report`.
///
/// # Errors
///
/// Propagates I/O failures and [`gait_signal::SignalError`]. No trace
/// contributions or regression reason codes are folded in; each observation
/// is extracted from its runpack's own recorded intents and results alone.
pub fn run_report(command: &ReportCommand) -> CliResult<CommandOutcome> {
    let mut observations = Vec::with_capacity(command.runpacks.len());
    for path in &command.runpacks {
        observations.push(extract_observation(path, &[], &[])?);
    }
    let report = build_report(&observations)?;
    Ok(CommandOutcome::ok(serde_json::json!({
        "issues": report.issues.iter().map(issue_to_json).collect::<Vec<_>>(),
        "total_families": report.total_families,
        "families_omitted": report.families_omitted,
    })))
}
