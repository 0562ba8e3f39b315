// crates/gait-cli/src/commands/mod.rs
// ============================================================================
// Module: Commands
// Description: One module per subcommand group, each a thin translation from
//              parsed arguments to a library crate call and back to an
//              exit-code-bearing result.
// Purpose: Keep `main.rs` to argument parsing and dispatch; every command's
//          actual behavior lives here.
// ============================================================================

//! One module per subcommand group; see each module for its own operations.

/// `gait canon` — canonicalization and digesting operations.
pub mod canon;
/// `gait gate` — evaluates an intent against a policy.
pub mod gate;
/// `gait keygen` — generates an Ed25519 keypair.
pub mod keygen;
/// `gait regress` — fixture staging and regression comparison.
pub mod regress;
/// `gait runpack` — evidence archive write/verify/diff/inspect/migrate.
pub mod runpack;
/// `gait sign` / `gait verify` — bare signing and verification commands.
pub mod sign;
/// `gait signal` — incident clustering and ranked reporting.
pub mod signal;

/// The result of running one subcommand: the JSON to print and the process
/// exit code it maps to.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// The JSON value printed to stdout.
    pub value: serde_json::Value,
    /// The process exit code this outcome maps to.
    pub exit_code: u8,
}

impl CommandOutcome {
    /// Wraps `value` as a successful (`exit_code = 0`) outcome.
    pub fn ok(value: serde_json::Value) -> Self {
        Self { value, exit_code: 0 }
    }
}
