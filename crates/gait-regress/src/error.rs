// crates/gait-regress/src/error.rs
// ============================================================================
// Module: Regress Errors
// Description: Error type for fixture staging and fixture-vs-candidate
//              comparison.
// ============================================================================

//! Categorized failures for fixture staging and regression comparison.

use gait_core::error::Categorized;
use gait_core::ErrorCategory;

/// Errors produced while staging a fixture or running a regression comparison.
#[derive(Debug, thiserror::Error)]
pub enum RegressError {
    /// A filesystem operation failed.
    #[error("regress I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The candidate or fixture runpack could not be read.
    #[error("regress runpack error: {0}")]
    Runpack(#[from] gait_runpack::RunpackError),
    /// A digest could not be computed for a member during normalization.
    #[error("regress canonicalization failed: {0}")]
    Canon(#[from] gait_canon::CanonError),
    /// A member's JSON content could not be parsed during normalization.
    #[error("regress member is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A JSONL member's bytes are not valid UTF-8.
    #[error("regress jsonl member is not valid UTF-8")]
    NotUtf8,
    /// The staged fixture directory does not contain a `fixture.json` metadata record.
    #[error("fixture directory is missing its metadata record")]
    MissingFixtureMetadata,
    /// The fixture metadata record could not be parsed.
    #[error("fixture metadata record is malformed: {0}")]
    FixtureMetadataMalformed(String),
}

impl Categorized for RegressError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) => ErrorCategory::IoFailure,
            Self::Runpack(err) => err.category(),
            Self::Canon(_) => ErrorCategory::InternalFailure,
            Self::Json(_) | Self::NotUtf8 | Self::MissingFixtureMetadata | Self::FixtureMetadataMalformed(_) => {
                ErrorCategory::InvalidInput
            }
        }
    }
}
