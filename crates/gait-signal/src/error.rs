// crates/gait-signal/src/error.rs
// ============================================================================
// Module: Signal Errors
// Description: Error type for observation extraction, fingerprinting, and
//              report assembly.
// ============================================================================

//! Categorized failures for observation extraction and signal reporting.

use gait_core::error::Categorized;
use gait_core::ErrorCategory;

/// Errors produced while extracting observations or building a signal report.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// A filesystem operation failed.
    #[error("signal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// A runpack archive could not be read.
    #[error("signal runpack error: {0}")]
    Runpack(#[from] gait_runpack::RunpackError),
    /// A digest could not be computed during fingerprinting.
    #[error("signal canonicalization failed: {0}")]
    Canon(#[from] gait_canon::CanonError),
    /// A member's JSON content could not be parsed.
    #[error("signal member is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A JSONL member's bytes are not valid UTF-8.
    #[error("signal jsonl member is not valid UTF-8")]
    NotUtf8,
    /// A required runpack member was absent.
    #[error("runpack is missing member: {member}")]
    MissingMember {
        /// The absent member's archive-relative name.
        member: String,
    },
}

impl Categorized for SignalError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) => ErrorCategory::IoFailure,
            Self::Runpack(err) => err.category(),
            Self::Canon(_) => ErrorCategory::InternalFailure,
            Self::Json(_) | Self::NotUtf8 | Self::MissingMember { .. } => ErrorCategory::InvalidInput,
        }
    }
}
