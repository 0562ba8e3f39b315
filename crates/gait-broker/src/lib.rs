// crates/gait-broker/src/lib.rs
// ============================================================================
// Module: Gait Broker
// Description: Credential broker backends resolving policy precondition
//              evidence without PolicyGate knowing which backend is in use.
// Purpose: Implement the (a) dynamic-dispatch point named in the design notes.
// Dependencies: gait-core, gait-canon
// ============================================================================

//! ## Overview
//! [`CredentialBroker`] is implemented by three tagged backends: [`StubBroker`]
//! (fixed evidence, for tests and `dev` mode), [`CommandBroker`] (a configured
//! subprocess), and [`NoneBroker`] (always fails, the default when nothing is
//! configured). PolicyGate calls `resolve` without knowing which backend is
//! behind the trait object; a failure here always becomes a fail-closed
//! `block` with `broker_credential_missing`, never a silent allow.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use gait_canon::Digest;
use gait_core::error::Categorized;
use gait_core::ErrorCategory;
use serde::Deserialize;
use serde::Serialize;

/// Evidence returned by a successful credential resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEvidence {
    /// The named credential this evidence satisfies.
    pub credential_name: String,
    /// Scopes the resolved credential grants.
    pub scopes: Vec<String>,
    /// Opaque evidence payload (never logged; only its digest is surfaced in errors).
    pub payload: serde_json::Value,
}

impl CredentialEvidence {
    /// Computes the content digest of this evidence's payload, the only
    /// representation of it that is safe to put in an error message or trace.
    ///
    /// # Errors
    ///
    /// Returns [`gait_canon::CanonError`] when the payload cannot be
    /// canonicalized (non-finite numbers reaching it directly).
    pub fn digest(&self) -> Result<Digest, gait_canon::CanonError> {
        gait_canon::digest(&self.payload)
    }
}

/// Errors produced while resolving a credential.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// No broker backend is configured; the default posture.
    #[error("no credential broker is configured")]
    Unconfigured,
    /// The configured backend has no entry for the requested credential name.
    #[error("no credential configured for: {0}")]
    MissingCredential(String),
    /// The broker subprocess did not exit within its configured timeout.
    #[error("credential broker subprocess timed out after {0:?}")]
    Timeout(Duration),
    /// The broker subprocess exited with a non-zero status.
    #[error("credential broker subprocess exited with status {0}")]
    ProcessFailed(i32),
    /// The broker subprocess could not be spawned at all.
    #[error("credential broker subprocess could not be started: {0}")]
    Spawn(String),
    /// The broker subprocess's stdout was not a valid `CredentialEvidence`.
    #[error("credential broker response was not valid JSON: {0}")]
    MalformedResponse(String),
    /// The resolved evidence's digest did not match the digest a policy rule pinned.
    #[error("credential evidence digest mismatch")]
    DigestMismatch,
}

impl Categorized for BrokerError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Unconfigured | Self::MissingCredential(_) => ErrorCategory::DependencyMissing,
            Self::Timeout(_) => ErrorCategory::StateContention,
            Self::ProcessFailed(_) | Self::Spawn(_) | Self::MalformedResponse(_) => {
                ErrorCategory::IoFailure
            }
            Self::DigestMismatch => ErrorCategory::Verification,
        }
    }
}

/// Resolves named credential evidence for a policy precondition.
///
/// Implementations must fail rather than guess: an unresolvable credential is
/// always a [`BrokerError`], never a default/empty [`CredentialEvidence`].
pub trait CredentialBroker {
    /// Resolves evidence for `name`, requesting at least `scopes`.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the credential cannot be resolved.
    fn resolve(&self, name: &str, scopes: &[String]) -> Result<CredentialEvidence, BrokerError>;
}

/// A broker backend returning fixed, pre-configured evidence. Used in tests
/// and `dev` mode where no real credential infrastructure is available.
#[derive(Debug, Default, Clone)]
pub struct StubBroker {
    evidence: BTreeMap<String, CredentialEvidence>,
}

impl StubBroker {
    /// Builds an empty stub broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers fixed evidence for a named credential.
    #[must_use]
    pub fn with_credential(mut self, name: impl Into<String>, evidence: CredentialEvidence) -> Self {
        self.evidence.insert(name.into(), evidence);
        self
    }
}

impl CredentialBroker for StubBroker {
    fn resolve(&self, name: &str, _scopes: &[String]) -> Result<CredentialEvidence, BrokerError> {
        self.evidence.get(name).cloned().ok_or_else(|| BrokerError::MissingCredential(name.to_owned()))
    }
}

/// A broker backend that always fails with [`BrokerError::Unconfigured`].
///
/// This is the default posture per the fail-closed rule: a policy rule
/// requiring a broker credential blocks when no broker is configured, rather
/// than silently allowing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneBroker;

impl CredentialBroker for NoneBroker {
    fn resolve(&self, _name: &str, _scopes: &[String]) -> Result<CredentialEvidence, BrokerError> {
        Err(BrokerError::Unconfigured)
    }
}

/// A broker backend that resolves credentials by invoking a configured
/// subprocess, enforcing a timeout, and parsing its stdout as a canonical
/// JSON [`CredentialEvidence`].
#[derive(Debug, Clone)]
pub struct CommandBroker {
    /// Path to the executable to invoke.
    pub program: String,
    /// Argument template; `{name}` is replaced with the credential name.
    pub args: Vec<String>,
    /// Maximum time to wait for the subprocess to exit.
    pub timeout: Duration,
}

impl CommandBroker {
    /// Builds a command broker invoking `program` with `args`, substituting
    /// `{name}` with the requested credential name, bounded by `timeout`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self { program: program.into(), args, timeout }
    }
}

impl CredentialBroker for CommandBroker {
    fn resolve(&self, name: &str, scopes: &[String]) -> Result<CredentialEvidence, BrokerError> {
        let substituted: Vec<String> = self.args.iter().map(|arg| arg.replace("{name}", name)).collect();

        let mut child = Command::new(&self.program)
            .args(&substituted)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| BrokerError::Spawn(err.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            let request = serde_json::json!({"credential_name": name, "scopes": scopes});
            let _ = stdin.write_all(request.to_string().as_bytes());
        }

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        return Err(BrokerError::ProcessFailed(status.code().unwrap_or(-1)));
                    }
                    let output = child
                        .wait_with_output()
                        .map_err(|err| BrokerError::Spawn(err.to_string()))?;
                    let evidence: CredentialEvidence = serde_json::from_slice(&output.stdout)
                        .map_err(|err| BrokerError::MalformedResponse(err.to_string()))?;
                    return Ok(evidence);
                }
                Ok(None) => {
                    if started.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(BrokerError::Timeout(self.timeout));
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(err) => return Err(BrokerError::Spawn(err.to_string())),
            }
        }
    }
}
