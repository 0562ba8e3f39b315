// crates/gait-runpack/src/lib.rs
// ============================================================================
// Module: Gait Runpack
// Description: Assembly, verification, diffing, inspection, and migration of
//              content-addressed evidence archives.
// Purpose: Turn a run's evidence into a byte-stable, tamper-evident artifact.
// Dependencies: gait-canon, gait-core, gait-schema, gait-signer, zip
// ============================================================================

//! ## Overview
//! A runpack is a flat ZIP archive with no directories. Every member's
//! content digest is listed in `manifest.json`, whose own digest covers
//! every field except itself. Member order is lexicographic, timestamps
//! are fixed, and permissions are normalized, so two archives built from
//! the same logical content are byte-identical.

/// Flat, lexicographically-ordered ZIP member reading and writing.
pub mod archive;
/// Structural comparison and drift classification between two archives.
pub mod diff;
/// Categorized errors for runpack assembly, verification, and migration.
pub mod error;
/// Read-only projection of an archive's manifest, run record, and members.
pub mod inspect;
/// Manifest, run, refs, intent/result entry record shapes.
pub mod manifest;
/// Recognition and re-emission of legacy archive layouts.
pub mod migrate;
/// Archive integrity and signature verification.
pub mod verify;
/// Deterministic archive assembly and atomic write.
pub mod write;

pub use diff::diff;
pub use diff::Diff;
pub use diff::SemanticClassification;
pub use error::RunpackError;
pub use inspect::inspect;
pub use inspect::Inspect;
pub use manifest::IntentEntry;
pub use manifest::MemberEntry;
pub use manifest::RedactionMode;
pub use manifest::RefReceipt;
pub use manifest::RefsDocument;
pub use manifest::ResultEntry;
pub use manifest::ResultStatus;
pub use manifest::RunpackManifest;
pub use manifest::RunRecord;
pub use migrate::migrate;
pub use migrate::LegacyLayout;
pub use migrate::MigrateOutcome;
pub use verify::verify;
pub use verify::SignatureStatus;
pub use verify::VerifyOptions;
pub use verify::VerifyResult;
pub use write::write;
pub use write::OptionalMember;
pub use write::WriteOptions;
