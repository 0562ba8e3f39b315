// crates/gait-cli/src/error.rs
// ============================================================================
// Module: CLI Errors
// Description: Wraps every library crate's error type in one enum and maps
//              it onto the process exit code table.
// Purpose: Give every command a single `?`-propagatable error type without
//          duplicating each crate's category logic at the call site.
// Dependencies: gait-core, thiserror
// ============================================================================

//! ## Overview
//! Two kinds of failure reach [`CliError`]: a CLI-level failure that never
//! touched a library crate (bad flag combination, unreadable input file,
//! malformed JSON/TOML before it was ever handed to a parser), and a
//! library crate's own error, wrapped verbatim and carrying its
//! [`gait_core::error::Categorized`] category. `exit_code` turns either kind
//! into one of the codes in the exit code table: a parse-stage failure
//! (this process could not even construct the typed value the library
//! expects) is `invalid_input_structural` (2); a library crate rejecting a
//! well-formed value on its own semantic grounds is `invalid_input_semantic`
//! (6). Every other category collapses to whatever
//! [`gait_core::ErrorCategory::exit_code`] already says, except
//! `policy_blocked` and `approval_required`, passed through unchanged in
//! case a future library error ever carries one.

use gait_core::error::Categorized;
use gait_core::ErrorCategory;

/// Every way a CLI invocation can fail.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A command's arguments were individually valid but combined into a
    /// request the command cannot satisfy (e.g. `prod` signing mode with no
    /// key path given).
    #[error("{0}")]
    Usage(String),
    /// A config file could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    /// An input or output path could not be read or written.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Input bytes were not valid JSON, or did not match the shape a command
    /// expected.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Input bytes were not valid TOML.
    #[error("{0}")]
    Toml(#[from] toml::de::Error),
    /// A canonicalization or digest operation failed.
    #[error(transparent)]
    Canon(#[from] gait_canon::CanonError),
    /// A signing or verification operation failed.
    #[error(transparent)]
    Signer(#[from] gait_signer::SignerError),
    /// A record header failed schema validation.
    #[error(transparent)]
    Schema(#[from] gait_schema::ValidationError),
    /// A credential broker call failed.
    #[error(transparent)]
    Broker(#[from] gait_broker::BrokerError),
    /// Policy parsing or evaluation failed.
    #[error(transparent)]
    Policy(#[from] gait_policy::error::PolicyError),
    /// A runpack operation failed.
    #[error(transparent)]
    Runpack(#[from] gait_runpack::RunpackError),
    /// A regression staging or comparison operation failed.
    #[error(transparent)]
    Regress(#[from] gait_regress::RegressError),
    /// Signal observation extraction or report assembly failed.
    #[error(transparent)]
    Signal(#[from] gait_signal::SignalError),
}

/// Bridges a library [`ErrorCategory`] onto the process exit code table,
/// for an error that already parsed successfully into the type the library
/// expects but was rejected on semantic grounds.
fn semantic_exit_code(category: ErrorCategory) -> u8 {
    match category {
        ErrorCategory::InvalidInput => 6,
        ErrorCategory::PolicyBlocked => 3,
        ErrorCategory::ApprovalRequired => 4,
        ErrorCategory::Verification
        | ErrorCategory::DependencyMissing
        | ErrorCategory::IoFailure
        | ErrorCategory::StateContention
        | ErrorCategory::NetworkTransient
        | ErrorCategory::NetworkPermanent
        | ErrorCategory::InternalFailure => category.exit_code(),
    }
}

impl CliError {
    /// Maps this error onto the process exit code table.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) | Self::Json(_) | Self::Toml(_) => 2,
            Self::Config(_) | Self::Io(_) => 1,
            Self::Canon(err) => semantic_exit_code(err.category()),
            Self::Signer(err) => semantic_exit_code(err.category()),
            Self::Schema(err) => semantic_exit_code(err.category()),
            Self::Broker(err) => semantic_exit_code(err.category()),
            Self::Policy(err) => semantic_exit_code(err.category()),
            Self::Runpack(err) => semantic_exit_code(err.category()),
            Self::Regress(err) => semantic_exit_code(err.category()),
            Self::Signal(err) => semantic_exit_code(err.category()),
        }
    }
}

/// Result alias for fallible CLI operations.
pub type CliResult<T> = Result<T, CliError>;

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
    use gait_canon::CanonError;

    use super::CliError;

    #[test]
    fn usage_error_is_structural() {
        let error = CliError::Usage("bad flag combination".to_owned());
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn canon_invalid_input_is_semantic() {
        let error = CliError::Canon(CanonError::NotRepresentable("unrepresentable".to_owned()));
        assert_eq!(error.exit_code(), 6);
    }
}
