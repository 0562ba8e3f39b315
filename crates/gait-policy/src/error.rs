// crates/gait-policy/src/error.rs
// ============================================================================
// Module: PolicyGate Errors
// Description: Error type for policy parsing and evaluation failures.
// ============================================================================

//! Categorized failures for policy parsing and gate evaluation.

use gait_core::error::Categorized;
use gait_core::ErrorCategory;

/// Errors produced while parsing a policy document or evaluating a gate.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy document's TOML structure could not be parsed.
    #[error("policy document is malformed: {0}")]
    MalformedDocument(String),
    /// A rule matching on high risk or destructive targets declares no
    /// `require_broker_credential` precondition; rejected at validation time.
    #[error("rule at priority {0} examines high-risk or destructive targets without a require_broker_credential precondition")]
    HighRiskRuleMissingBrokerPrecondition(i64),
    /// A digest could not be computed for a record (non-finite number, etc).
    #[error("digest computation failed: {0}")]
    Canon(#[from] gait_canon::CanonError),
    /// Signing or verification failed at the crypto layer.
    #[error("signing failed: {0}")]
    Signer(#[from] gait_signer::SignerError),
    /// A schema record failed validation.
    #[error("schema validation failed: {0}")]
    Schema(#[from] gait_schema::ValidationError),
}

impl Categorized for PolicyError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedDocument(_) | Self::Schema(_) | Self::HighRiskRuleMissingBrokerPrecondition(_) => {
                ErrorCategory::InvalidInput
            }
            Self::Canon(_) => ErrorCategory::InternalFailure,
            Self::Signer(_) => ErrorCategory::DependencyMissing,
        }
    }
}
