// crates/gait-cli/src/commands/gate.rs
// ============================================================================
// Module: Gate Command
// Description: Evaluates an intent against a policy and prints the signed
//              gate result.
// Purpose: Thin CLI wrapper over `gait_policy::evaluate`.
// Dependencies: gait-broker, gait-core, gait-policy, gait-signer
// ============================================================================

//! Arguments and dispatch for `gait gate`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use clap::ValueEnum;
use gait_broker::CommandBroker;
use gait_broker::CredentialBroker;
use gait_broker::NoneBroker;
use gait_core::Clock;
use gait_core::CorrelationId;
use gait_core::FixedClock;
use gait_core::SystemClock;
use gait_policy::evaluate;
use gait_policy::intent::Intent;
use gait_policy::policy::parse_policy_document;
use gait_policy::trace::ApprovedScriptRegistry;
use gait_policy::GateConfig;
use gait_signer::SigningMode;

use crate::commands::CommandOutcome;
use crate::config::GaitConfig;
use crate::error::CliError;
use crate::error::CliResult;
use crate::keys::load_signing_key;
use crate::keys::load_verifying_key;

/// Which clock source stamps the emitted trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClockArg {
    /// The real wall clock.
    System,
    /// Always the fixed epoch, for reproducible demos and tests.
    Fixed,
}

/// Arguments for `gait gate`.
#[derive(Args, Debug)]
pub struct GateCommand {
    /// Path to a JSON file holding the intent to evaluate.
    #[arg(long, value_name = "PATH")]
    pub intent: PathBuf,
    /// Path to a TOML file holding the policy to evaluate against.
    #[arg(long, value_name = "PATH")]
    pub policy: PathBuf,
    /// Path to a JSON file holding an approved-script registry, when one applies.
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,
    /// Public key the approved-script registry's entries are verified against.
    #[arg(long, value_name = "PATH", requires = "registry")]
    pub approved_script_key: Option<PathBuf>,
    /// Caller-supplied correlation identifier.
    #[arg(long, value_name = "ID")]
    pub correlation_id: Option<String>,
    /// Signing mode applied to the emitted trace; defaults to the loaded
    /// config's `signing_mode` when absent.
    #[arg(long, value_enum)]
    pub signing_mode: Option<SigningModeArg>,
    /// Private key to sign the trace with; required when `--signing-mode prod`.
    #[arg(long, value_name = "PATH")]
    pub key: Option<PathBuf>,
    /// Clock source stamping the trace's `evaluated_at` field.
    #[arg(long, value_enum, default_value = "system")]
    pub clock: ClockArg,
    /// Program to invoke as a credential broker subprocess for
    /// `require_broker_credential` preconditions; absent means no broker is
    /// configured and such preconditions always fail closed.
    #[arg(long, value_name = "PROGRAM")]
    pub broker_command: Option<String>,
    /// Arguments passed to `--broker-command`; `{name}` is substituted with
    /// the requested credential name.
    #[arg(long, value_name = "ARG")]
    pub broker_arg: Vec<String>,
    /// Timeout, in seconds, for the broker subprocess; defaults to the
    /// loaded config's `broker_timeout_secs` when absent.
    #[arg(long, value_name = "SECS")]
    pub broker_timeout_secs: Option<u64>,
}

/// Mirrors [`SigningMode`] as a `clap` value enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SigningModeArg {
    /// `gait_signer::SigningMode::Dev`.
    Dev,
    /// `gait_signer::SigningMode::Prod`.
    Prod,
}

impl From<SigningModeArg> for SigningMode {
    fn from(value: SigningModeArg) -> Self {
        match value {
            SigningModeArg::Dev => Self::Dev,
            SigningModeArg::Prod => Self::Prod,
        }
    }
}

/// Runs `gait gate`.
///
/// # Errors
///
/// Returns [`CliError::Usage`] when `--signing-mode prod` is given without
/// `--key`, and propagates I/O, JSON/TOML parsing, and [`gait_policy::PolicyError`]
/// failures.
pub fn run(command: &GateCommand, config: &GaitConfig) -> CliResult<CommandOutcome> {
    let intent_text = std::fs::read_to_string(&command.intent)?;
    let intent: Intent = serde_json::from_str(&intent_text)?;

    let policy_text = std::fs::read_to_string(&command.policy)?;
    let policy = parse_policy_document(&policy_text)?;

    let registry = match &command.registry {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        None => ApprovedScriptRegistry::default(),
    };

    let signing_mode: SigningMode = command.signing_mode.map_or(config.signing_mode, Into::into);
    let signing_key = command.key.as_deref().map(load_signing_key).transpose()?;
    if matches!(signing_mode, SigningMode::Prod) && signing_key.is_none() {
        return Err(CliError::Usage("--signing-mode prod requires --key".to_owned()));
    }
    let approved_script_key = command.approved_script_key.as_deref().map(load_verifying_key).transpose()?;

    let correlation_id = command
        .correlation_id
        .as_deref()
        .map(CorrelationId::new)
        .transpose()
        .map_err(|_err| CliError::Usage("--correlation-id must not be empty".to_owned()))?;

    let broker_timeout_secs = command.broker_timeout_secs.unwrap_or(config.broker_timeout_secs);
    let broker: Box<dyn CredentialBroker> = match &command.broker_command {
        Some(program) => {
            Box::new(CommandBroker::new(program.clone(), command.broker_arg.clone(), Duration::from_secs(broker_timeout_secs)))
        }
        None => Box::new(NoneBroker),
    };

    let system_clock = SystemClock;
    let fixed_clock = FixedClock;
    let clock: &dyn Clock = match command.clock {
        ClockArg::System => &system_clock,
        ClockArg::Fixed => &fixed_clock,
    };

    let gate_config =
        GateConfig { signing_mode, private_key: signing_key.as_ref(), approved_script_key: approved_script_key.as_ref() };

    let result = evaluate(correlation_id, &intent, &policy, broker.as_ref(), &registry, clock, &gate_config)?;
    let exit_code = result.verdict.exit_code();
    Ok(CommandOutcome { value: serde_json::to_value(&result)?, exit_code })
}
