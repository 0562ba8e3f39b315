// crates/gait-core/src/error.rs
// ============================================================================
// Module: Error Taxonomy
// Description: The closed error category set shared across every gait crate.
// Purpose: Let callers compute exit codes and retry policy without matching
//          on crate-specific error variants.
// ============================================================================

//! ## Overview
//! Every crate-local error enum implements [`Categorized`] by an exhaustive
//! match with no wildcard arm, so adding a variant without assigning it a
//! category is a compile error rather than a silent misclassification.

/// The closed set of error categories named in the error handling design.
///
/// # Invariants
/// - This set is closed; a new category requires a major version bump of
///   every crate that maps onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The caller supplied structurally or semantically invalid input.
    InvalidInput,
    /// A cryptographic or structural verification failed.
    Verification,
    /// A policy evaluation produced a `block` verdict.
    PolicyBlocked,
    /// A policy evaluation produced a `require_approval` verdict.
    ApprovalRequired,
    /// A required dependency (credential, context evidence, delegation) is missing.
    DependencyMissing,
    /// A filesystem or archive I/O operation failed.
    IoFailure,
    /// A lock or resource could not be acquired within its deadline.
    StateContention,
    /// A network operation failed in a way that may succeed on retry.
    NetworkTransient,
    /// A network operation failed in a way that will not succeed on retry.
    NetworkPermanent,
    /// An internal invariant was violated; always fails closed.
    InternalFailure,
}

impl ErrorCategory {
    /// Maps this category onto the exit code contract in the external
    /// interfaces section, independent of which verdict (if any) produced it.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::InternalFailure => 1,
            Self::InvalidInput => 2,
            Self::PolicyBlocked => 3,
            Self::ApprovalRequired => 4,
            Self::Verification
            | Self::DependencyMissing
            | Self::IoFailure
            | Self::StateContention
            | Self::NetworkTransient
            | Self::NetworkPermanent => 1,
        }
    }
}

/// Implemented by every crate-local error enum to report its closed-set
/// category without the caller needing to match on crate-specific variants.
pub trait Categorized {
    /// Returns the error category for this error.
    fn category(&self) -> ErrorCategory;
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
    use super::ErrorCategory;

    #[test]
    fn exit_codes_match_the_external_interface_contract() {
        assert_eq!(ErrorCategory::InternalFailure.exit_code(), 1);
        assert_eq!(ErrorCategory::InvalidInput.exit_code(), 2);
        assert_eq!(ErrorCategory::PolicyBlocked.exit_code(), 3);
        assert_eq!(ErrorCategory::ApprovalRequired.exit_code(), 4);
    }
}
