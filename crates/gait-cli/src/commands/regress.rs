// crates/gait-cli/src/commands/regress.rs
// ============================================================================
// Module: Regress Command
// Description: Stages a fixture and runs a candidate runpack against it.
// Purpose: Thin CLI wrapper over `gait_regress`.
// Dependencies: gait-core, gait-regress
// ============================================================================

//! Arguments and dispatch for `gait regress init|run`.

use std::path::PathBuf;

use clap::Args;
use clap::Subcommand;
use clap::ValueEnum;
use gait_core::Timestamp;
use gait_regress::fixture::init;
use gait_regress::fixture::ContextConformanceMode;
use gait_regress::run::run;
use gait_regress::run::RegressStatus;
use gait_regress::run::RunOptions;
use gait_regress::thresholds::ContextDriftThresholds;

use crate::commands::CommandOutcome;
use crate::error::CliResult;

/// `gait regress` subcommands.
#[derive(Subcommand, Debug)]
pub enum RegressCommand {
    /// Stages a fixture runpack for later regression runs.
    Init(InitCommand),
    /// Compares a candidate runpack against a staged fixture.
    Run(RunCommand),
}

/// Mirrors [`ContextConformanceMode`] as a `clap` value enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContextConformanceModeArg {
    /// `gait_regress::fixture::ContextConformanceMode::Strict`.
    Strict,
    /// `gait_regress::fixture::ContextConformanceMode::Advisory`.
    Advisory,
}

impl From<ContextConformanceModeArg> for ContextConformanceMode {
    fn from(value: ContextConformanceModeArg) -> Self {
        match value {
            ContextConformanceModeArg::Strict => Self::Strict,
            ContextConformanceModeArg::Advisory => Self::Advisory,
        }
    }
}

/// Arguments for `gait regress init`.
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Path to the fixture runpack archive to stage.
    pub fixture_runpack: PathBuf,
    /// Directory to stage the fixture into.
    pub fixture_dir: PathBuf,
    /// Member names permitted to vary between fixture and candidate.
    #[arg(long = "allow", value_name = "MEMBER")]
    pub drift_allow_list: Vec<String>,
    /// How strictly the context envelope must match.
    #[arg(long, value_enum, default_value = "strict")]
    pub context_conformance_mode: ContextConformanceModeArg,
}

/// Runs `gait regress init`.
///
/// # Errors
///
/// Propagates [`gait_regress::RegressError`].
pub fn run_init(command: &InitCommand) -> CliResult<CommandOutcome> {
    let path = init(
        &command.fixture_runpack,
        &command.fixture_dir,
        command.drift_allow_list.clone(),
        command.context_conformance_mode.into(),
        Timestamp::fixed_epoch(),
    )?;
    Ok(CommandOutcome::ok(serde_json::json!({"fixture_dir": path})))
}

/// Arguments for `gait regress run`.
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Directory a fixture was previously staged into.
    pub fixture_dir: PathBuf,
    /// Path to the candidate runpack archive.
    pub candidate_runpack: PathBuf,
    /// Seconds of context envelope staleness tolerated as additive drift.
    #[arg(long, value_name = "SECS")]
    pub freshness_slack_secs: Option<u64>,
}

/// Runs `gait regress run`.
///
/// # Errors
///
/// Propagates [`gait_regress::RegressError`].
pub fn run_run(command: &RunCommand) -> CliResult<CommandOutcome> {
    let mut thresholds = ContextDriftThresholds::default();
    if let Some(secs) = command.freshness_slack_secs {
        thresholds.freshness_slack_secs = secs;
    }
    let options = RunOptions { context_drift_thresholds: thresholds };
    let result = run(&command.fixture_dir, &command.candidate_runpack, &options)?;
    let exit_code = u8::from(matches!(result.status, RegressStatus::Fail)) * 5;
    Ok(CommandOutcome {
        value: serde_json::json!({
            "status": result.status,
            "graders": result.graders,
            "top_failure_reason": result.top_failure_reason,
        }),
        exit_code,
    })
}
