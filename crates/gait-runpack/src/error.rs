// crates/gait-runpack/src/error.rs
// ============================================================================
// Module: Runpack Errors
// Description: Error type for archive assembly, verification, diffing, and
//              migration.
// ============================================================================

//! Categorized failures for every runpack operation.

use gait_core::error::Categorized;
use gait_core::ErrorCategory;

/// Errors produced while writing, verifying, diffing, inspecting, or
/// migrating a runpack archive.
#[derive(Debug, thiserror::Error)]
pub enum RunpackError {
    /// A filesystem operation failed.
    #[error("runpack I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The ZIP container could not be read or written.
    #[error("runpack archive is malformed: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// A digest could not be computed for a record.
    #[error("digest computation failed: {0}")]
    Canon(#[from] gait_canon::CanonError),
    /// Signing or verification failed at the crypto layer.
    #[error("signing failed: {0}")]
    Signer(#[from] gait_signer::SignerError),
    /// A member's JSON content could not be parsed.
    #[error("runpack member is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The operation was cancelled before it completed.
    #[error("runpack operation was cancelled")]
    Cancelled(#[from] gait_core::Cancelled),
    /// A declared member is absent from the archive.
    #[error("runpack is missing declared member: {member}")]
    MissingFile {
        /// Name of the missing member.
        member: String,
    },
    /// A member's recomputed content digest does not match the manifest.
    #[error("runpack member content digest mismatch: {member}")]
    HashMismatch {
        /// Name of the mismatched member.
        member: String,
    },
    /// A member is present in the archive but not declared by the manifest.
    #[error("runpack contains an undeclared member: {member}")]
    UndeclaredMember {
        /// Name of the undeclared member.
        member: String,
    },
    /// A member name is not flat (contains a path separator) or attempts
    /// path traversal.
    #[error("runpack member path is not flat or attempts traversal: {member}")]
    PathTraversal {
        /// The offending member name.
        member: String,
    },
    /// The manifest's own `manifest_digest` does not match its recomputed value.
    #[error("runpack manifest_digest does not match its recomputed value")]
    ManifestDigestMismatch,
    /// The manifest could not be parsed into a [`crate::manifest::RunpackManifest`].
    #[error("runpack manifest is malformed: {0}")]
    ManifestMalformed(String),
    /// A ref receipt declares `redaction_mode = raw` without an explicit
    /// unsafe acknowledgment.
    #[error("ref receipt {ref_id} uses raw redaction mode without an unsafe acknowledgment")]
    RawRefWithoutAck {
        /// The offending ref receipt's identifier.
        ref_id: String,
    },
    /// The archive does not match any recognized runpack layout (current or legacy).
    #[error("not a recognized runpack layout: {0}")]
    NotARunpack(String),
    /// The trace's own signature failed verification.
    #[error("runpack manifest signature is invalid")]
    SignatureInvalid,
}

impl Categorized for RunpackError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) | Self::Zip(_) | Self::Cancelled(_) => ErrorCategory::IoFailure,
            Self::Canon(_) => ErrorCategory::InternalFailure,
            Self::Signer(_) => ErrorCategory::DependencyMissing,
            Self::Json(_) | Self::RawRefWithoutAck { .. } | Self::NotARunpack(_) => ErrorCategory::InvalidInput,
            Self::MissingFile { .. }
            | Self::HashMismatch { .. }
            | Self::UndeclaredMember { .. }
            | Self::PathTraversal { .. }
            | Self::ManifestDigestMismatch
            | Self::ManifestMalformed(_)
            | Self::SignatureInvalid => ErrorCategory::Verification,
        }
    }
}
