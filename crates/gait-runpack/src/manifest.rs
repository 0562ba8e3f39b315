// crates/gait-runpack/src/manifest.rs
// ============================================================================
// Module: Runpack Records
// Description: The typed records a runpack's members contain: run.json,
//              intents.jsonl entries, results.jsonl entries, refs.json, and
//              manifest.json itself.
// Purpose: Give every member a declared schema shape while tolerating
//          additive fields from newer producers.
// Dependencies: gait-core, gait-canon, serde
// ============================================================================

//! ## Overview
//! Every record here carries a [`gait_schema::RecordHeader`] and a residual
//! map for fields its typed projection does not declare, per the schema
//! evolution rule. The manifest's own digest is computed over every field
//! except `manifest_digest` itself — [`RunpackManifest::recompute_digest`]
//! is the one place that invariant is enforced.

use gait_core::CorrelationId;
use gait_core::RefId;
use gait_core::RunId;
use gait_core::Timestamp;
use gait_schema::RecordHeader;
use serde::Deserialize;
use serde::Serialize;

use crate::error::RunpackError;

/// Schema id for [`RunRecord`].
pub const RUN_SCHEMA_ID: &str = "gait.run";
/// Schema id for [`IntentEntry`].
pub const INTENT_ENTRY_SCHEMA_ID: &str = "gait.intent_entry";
/// Schema id for [`ResultEntry`].
pub const RESULT_ENTRY_SCHEMA_ID: &str = "gait.result_entry";
/// Schema id for [`RefsDocument`].
pub const REFS_DOCUMENT_SCHEMA_ID: &str = "gait.refs";
/// Schema id for [`RunpackManifest`].
pub const MANIFEST_SCHEMA_ID: &str = "gait.manifest";
/// Schema version accepted for every record in this module.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// The top-level record describing one run, stored as `run.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Common schema header.
    pub header: RecordHeader,
    /// Identifier of the run this runpack evidences.
    pub run_id: RunId,
    /// Caller-supplied correlation identifier, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    /// When the run began.
    pub started_at: Timestamp,
    /// When the run concluded, when it has.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
    /// Fields present in the source document but not declared here.
    #[serde(flatten)]
    pub residual: serde_json::Map<String, serde_json::Value>,
}

/// A single proposed tool call recorded in `intents.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentEntry {
    /// Common schema header.
    pub header: RecordHeader,
    /// Caller-supplied correlation identifier, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    /// The tool the intent named.
    pub tool_name: String,
    /// The intent's opaque argument mapping.
    pub args: serde_json::Value,
    /// Content digest of the full intent this entry summarizes.
    pub intent_digest: String,
    /// Fields present in the source document but not declared here.
    #[serde(flatten)]
    pub residual: serde_json::Map<String, serde_json::Value>,
}

/// Outcome status of one executed intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// The tool call completed successfully.
    Success,
    /// The tool call failed.
    Failure,
}

/// A single executed-intent outcome recorded in `results.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Common schema header.
    pub header: RecordHeader,
    /// Caller-supplied correlation identifier, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    /// The tool the result corresponds to.
    pub tool_name: String,
    /// Whether the call succeeded.
    pub status: ResultStatus,
    /// Human-readable detail, never raw sensitive payload content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Content digest of the full result payload this entry summarizes.
    pub result_digest: String,
    /// Fields present in the source document but not declared here.
    #[serde(flatten)]
    pub residual: serde_json::Map<String, serde_json::Value>,
}

/// How a reference receipt's retrieved content may be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionMode {
    /// Only a reference (locator plus digest) is retained, never raw content.
    Reference,
    /// Raw content is retained; requires an explicit unsafe acknowledgment.
    Raw,
}

/// Describes an external content reference retrieved during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefReceipt {
    /// Common schema header.
    pub header: RecordHeader,
    /// Identifier for this receipt.
    pub ref_id: RefId,
    /// The kind of source the content was retrieved from.
    pub source_type: String,
    /// Where the content was retrieved from.
    pub source_locator: String,
    /// Content digest of the query that produced this retrieval.
    pub query_digest: String,
    /// Content digest of the retrieved content.
    pub content_digest: String,
    /// When the content was retrieved.
    pub retrieved_at: Timestamp,
    /// Redaction posture applied to the retrieved content.
    pub redaction_mode: RedactionMode,
    /// Hint about whether the referenced content is expected to change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutability_hint: Option<String>,
    /// Freshness SLA for the reference, in seconds, when one applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_sla_secs: Option<u64>,
    /// Required `true` when `redaction_mode` is [`RedactionMode::Raw`].
    #[serde(default)]
    pub unsafe_ack: bool,
    /// Fields present in the source document but not declared here.
    #[serde(flatten)]
    pub residual: serde_json::Map<String, serde_json::Value>,
}

impl RefReceipt {
    /// Validates this receipt's raw-mode acknowledgment invariant.
    ///
    /// # Errors
    ///
    /// Returns [`RunpackError::RawRefWithoutAck`] when `redaction_mode` is
    /// [`RedactionMode::Raw`] and `unsafe_ack` is `false`.
    pub fn validate(&self) -> Result<(), RunpackError> {
        if matches!(self.redaction_mode, RedactionMode::Raw) && !self.unsafe_ack {
            return Err(RunpackError::RawRefWithoutAck { ref_id: self.ref_id.to_string() });
        }
        Ok(())
    }
}

/// The container document for `refs.json`: a single JSON document (not
/// JSONL) holding every reference receipt for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefsDocument {
    /// Common schema header.
    pub header: RecordHeader,
    /// Every reference receipt produced by the run, in recording order.
    #[serde(default)]
    pub refs: Vec<RefReceipt>,
}

/// One member of a runpack archive, as declared by its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEntry {
    /// The member's archive-relative name (archives are flat; no directories).
    pub name: String,
    /// Content digest of the member's bytes.
    pub content_digest: String,
    /// Size of the member in bytes.
    pub size: u64,
}

/// A projection of [`RunpackManifest`] used only to compute `manifest_digest`
/// itself: the same fields, minus the digest field it would otherwise be
/// circular to include.
#[derive(Serialize)]
struct ManifestForDigest<'a> {
    header: &'a RecordHeader,
    run_id: &'a RunId,
    members: &'a [MemberEntry],
}

/// The manifest every runpack carries as `manifest.json`: the member list
/// and the aggregate digest over it.
///
/// # Invariants
/// - `members` is sorted by `name`.
/// - `manifest_digest` equals the canonical digest of every other field in
///   this record (see [`Self::recompute_digest`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunpackManifest {
    /// Common schema header.
    pub header: RecordHeader,
    /// Identifier of the run this manifest indexes.
    pub run_id: RunId,
    /// Every member in the archive, sorted by name.
    pub members: Vec<MemberEntry>,
    /// Canonical digest of this manifest excluding this field.
    pub manifest_digest: String,
}

impl RunpackManifest {
    /// Recomputes this manifest's digest from every field except
    /// `manifest_digest` itself.
    ///
    /// # Errors
    ///
    /// Returns [`gait_canon::CanonError`] when the manifest cannot be
    /// canonicalized.
    pub fn recompute_digest(&self) -> Result<gait_canon::Digest, gait_canon::CanonError> {
        let projection = ManifestForDigest { header: &self.header, run_id: &self.run_id, members: &self.members };
        gait_canon::digest(&projection)
    }

    /// Returns the member entry named `name`, if declared.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&MemberEntry> {
        self.members.iter().find(|member| member.name == name)
    }
}

/// Builds the common record header for a runpack member, stamped with the
/// given creation time.
#[must_use]
pub fn header_for(schema_id: &str, created_at: Timestamp) -> RecordHeader {
    RecordHeader {
        schema_id: schema_id.to_owned(),
        schema_version: SCHEMA_VERSION.to_owned(),
        created_at,
        producer_version: env!("CARGO_PKG_VERSION").to_owned(),
    }
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
    use gait_core::RefId;
    use gait_core::RunId;
    use gait_core::Timestamp;

    use super::header_for;
    use super::MemberEntry;
    use super::RedactionMode;
    use super::RefReceipt;
    use super::RunpackManifest;
    use super::MANIFEST_SCHEMA_ID;

    fn sample_manifest() -> RunpackManifest {
        RunpackManifest {
            header: header_for(MANIFEST_SCHEMA_ID, Timestamp::fixed_epoch()),
            run_id: RunId::new("run_demo").expect("non-empty literal"),
            members: vec![
                MemberEntry { name: "intents.jsonl".to_owned(), content_digest: "a".repeat(64), size: 10 },
                MemberEntry { name: "run.json".to_owned(), content_digest: "b".repeat(64), size: 20 },
            ],
            manifest_digest: String::new(),
        }
    }

    #[test]
    fn manifest_digest_excludes_itself() {
        let mut manifest = sample_manifest();
        let digest = manifest.recompute_digest().expect("manifest canonicalizes").as_str().to_owned();
        manifest.manifest_digest = digest.clone();
        let recomputed = manifest.recompute_digest().expect("manifest canonicalizes");
        assert_eq!(recomputed.as_str(), digest);
    }

    #[test]
    fn member_lookup_finds_declared_entry() {
        let manifest = sample_manifest();
        assert!(manifest.member("run.json").is_some());
        assert!(manifest.member("missing.json").is_none());
    }

    #[test]
    fn raw_ref_without_ack_is_rejected() {
        let receipt = RefReceipt {
            header: header_for("gait.ref_receipt", Timestamp::fixed_epoch()),
            ref_id: RefId::new("ref-1").expect("non-empty literal"),
            source_type: "web".to_owned(),
            source_locator: "https://example.test".to_owned(),
            query_digest: "c".repeat(64),
            content_digest: "d".repeat(64),
            retrieved_at: Timestamp::fixed_epoch(),
            redaction_mode: RedactionMode::Raw,
            immutability_hint: None,
            freshness_sla_secs: None,
            unsafe_ack: false,
            residual: serde_json::Map::new(),
        };
        assert!(receipt.validate().is_err());
    }

    #[test]
    fn raw_ref_with_ack_is_accepted() {
        let mut receipt_source = RefReceipt {
            header: header_for("gait.ref_receipt", Timestamp::fixed_epoch()),
            ref_id: RefId::new("ref-1").expect("non-empty literal"),
            source_type: "web".to_owned(),
            source_locator: "https://example.test".to_owned(),
            query_digest: "c".repeat(64),
            content_digest: "d".repeat(64),
            retrieved_at: Timestamp::fixed_epoch(),
            redaction_mode: RedactionMode::Raw,
            immutability_hint: None,
            freshness_sla_secs: None,
            unsafe_ack: false,
            residual: serde_json::Map::new(),
        };
        receipt_source.unsafe_ack = true;
        assert!(receipt_source.validate().is_ok());
    }
}
