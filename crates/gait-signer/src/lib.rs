// crates/gait-signer/src/lib.rs
// ============================================================================
// Module: Gait Signer
// Description: Ed25519 signing and verification over canonical digests.
// Purpose: Give traces and runpack manifests a tamper-evident signature.
// Dependencies: ed25519-dalek, base64, sha2
// ============================================================================

//! ## Overview
//! Signing operates on a hex-encoded SHA-256 digest produced by `gait-canon`,
//! not on the original structured value — this crate never sees intent
//! arguments or trace payloads, only their digests, so it cannot leak
//! sensitive content even if its error messages are logged.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::Signer as _;
use ed25519_dalek::Verifier as _;
use gait_core::error::Categorized;
use gait_core::ErrorCategory;
use sha2::Digest as _;
use sha2::Sha256;

/// Signature algorithm tag. Only Ed25519 is supported; the field exists so a
/// `Signature` record is self-describing and future algorithms do not require
/// a schema break.
pub const ALGORITHM: &str = "ed25519";

/// Errors produced while generating keys, signing, or verifying.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The digest string is not 64 lowercase hex characters.
    #[error("digest must be 64 lowercase hex characters")]
    MalformedDigest,
    /// The private key bytes are the wrong length or otherwise malformed.
    #[error("private key material is malformed")]
    MalformedPrivateKey,
    /// The public key bytes are the wrong length or otherwise malformed.
    #[error("public key material is malformed")]
    MalformedPublicKey,
    /// The signature bytes are not valid base64 or the wrong length.
    #[error("signature encoding is malformed")]
    MalformedSignature,
    /// `prod` mode requires a private key and none was supplied.
    #[error("signing key required in prod mode but none was provided")]
    PrivateKeyRequired,
}

impl Categorized for SignerError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedDigest
            | Self::MalformedPrivateKey
            | Self::MalformedPublicKey
            | Self::MalformedSignature => ErrorCategory::InvalidInput,
            Self::PrivateKeyRequired => ErrorCategory::DependencyMissing,
        }
    }
}

/// Why a verification failed. Distinct from [`SignerError`], which covers
/// malformed inputs: these are the verification-specific reasons named in the
/// Signer component design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyFailureReason {
    /// The signature's `key_id` does not match the supplied public key.
    KeyIdMismatch,
    /// The signature's algorithm tag is not one this crate supports.
    AlgorithmUnsupported,
    /// The cryptographic signature check failed.
    SignatureInvalid,
    /// The signature's `signed_digest` does not match the digest supplied to `verify`.
    DigestMismatch,
}

/// Result of a signature verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// The signature is valid for the given digest and public key.
    Ok,
    /// The signature did not verify, with the reason.
    Failed {
        /// Why verification failed.
        reason: VerifyFailureReason,
    },
}

/// A generated Ed25519 keypair.
pub struct Keypair {
    /// The signing (private) key.
    pub private_key: ed25519_dalek::SigningKey,
    /// The verifying (public) key.
    pub public_key: ed25519_dalek::VerifyingKey,
}

/// Generates a new Ed25519 keypair using the OS random source.
#[must_use]
pub fn generate_keypair() -> Keypair {
    let mut csprng = rand::rngs::OsRng;
    let private_key = ed25519_dalek::SigningKey::generate(&mut csprng);
    let public_key = private_key.verifying_key();
    Keypair { private_key, public_key }
}

/// Derives the stable `key_id` for a public key: the first 16 bytes of
/// `sha256(public_key_bytes)`, hex-encoded (32 hex characters).
///
/// A given public key always yields the same `key_id`, and independent
/// processes holding the same key derive the same id without coordination.
#[must_use]
pub fn key_id(public_key: &ed25519_dalek::VerifyingKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(public_key.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    digest[..16].iter().map(|byte| format!("{byte:02x}")).collect()
}

/// A signature record over a canonical digest.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Signature {
    /// Signature algorithm tag, currently always [`ALGORITHM`].
    pub alg: String,
    /// Stable identifier of the public key that produced this signature.
    pub key_id: String,
    /// Base64-encoded signature bytes.
    pub sig: String,
    /// The hex digest that was signed.
    pub signed_digest: String,
}

/// Signs a hex-encoded digest with a private key.
///
/// # Errors
///
/// Returns [`SignerError::MalformedDigest`] when `digest_hex` is not 64
/// lowercase hex characters.
pub fn sign(private_key: &ed25519_dalek::SigningKey, digest_hex: &str) -> Result<Signature, SignerError> {
    let raw = decode_digest(digest_hex)?;
    let signature = private_key.sign(&raw);
    Ok(Signature {
        alg: ALGORITHM.to_owned(),
        key_id: key_id(&private_key.verifying_key()),
        sig: BASE64.encode(signature.to_bytes()),
        signed_digest: digest_hex.to_owned(),
    })
}

/// Verifies a signature over a hex-encoded digest with a public key.
///
/// # Errors
///
/// Returns [`SignerError`] when `digest_hex` or `signature.sig` are malformed
/// (distinct from a *failed* verification, which is reported as
/// [`VerifyOutcome::Failed`] rather than an error, since an invalid signature
/// is an expected, handled outcome, not a programming error).
pub fn verify(
    public_key: &ed25519_dalek::VerifyingKey,
    digest_hex: &str,
    signature: &Signature,
) -> Result<VerifyOutcome, SignerError> {
    let raw = decode_digest(digest_hex)?;

    if signature.alg != ALGORITHM {
        return Ok(VerifyOutcome::Failed { reason: VerifyFailureReason::AlgorithmUnsupported });
    }
    if signature.key_id != key_id(public_key) {
        return Ok(VerifyOutcome::Failed { reason: VerifyFailureReason::KeyIdMismatch });
    }
    if signature.signed_digest != digest_hex {
        return Ok(VerifyOutcome::Failed { reason: VerifyFailureReason::DigestMismatch });
    }

    let sig_bytes = BASE64.decode(&signature.sig).map_err(|_err| SignerError::MalformedSignature)?;
    let sig_array: [u8; 64] =
        sig_bytes.as_slice().try_into().map_err(|_err| SignerError::MalformedSignature)?;
    let ed_signature = ed25519_dalek::Signature::from_bytes(&sig_array);

    match public_key.verify(&raw, &ed_signature) {
        Ok(()) => Ok(VerifyOutcome::Ok),
        Err(_) => Ok(VerifyOutcome::Failed { reason: VerifyFailureReason::SignatureInvalid }),
    }
}

/// Signing mode: `dev` tolerates absent keys, `prod` requires one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningMode {
    /// Unsigned operation is tolerated; a sentinel indicator is used instead.
    Dev,
    /// A private key is required; its absence is a hard error.
    Prod,
}

/// Sentinel value standing in for a signature in `dev` mode.
pub const DEV_MODE_SENTINEL: &str = "unsigned-dev-mode";

/// Signs a digest according to the signing mode, failing closed in `prod`.
///
/// # Errors
///
/// Returns [`SignerError::PrivateKeyRequired`] when `mode` is
/// [`SigningMode::Prod`] and `private_key` is `None`. Propagates [`sign`]'s
/// errors otherwise.
pub fn sign_for_mode(
    mode: SigningMode,
    private_key: Option<&ed25519_dalek::SigningKey>,
    digest_hex: &str,
) -> Result<Option<Signature>, SignerError> {
    match (mode, private_key) {
        (SigningMode::Prod, None) => Err(SignerError::PrivateKeyRequired),
        (SigningMode::Prod, Some(key)) => Ok(Some(sign(key, digest_hex)?)),
        (SigningMode::Dev, None) => Ok(None),
        (SigningMode::Dev, Some(key)) => Ok(Some(sign(key, digest_hex)?)),
    }
}

fn decode_digest(digest_hex: &str) -> Result<[u8; 32], SignerError> {
    if digest_hex.len() != 64 || !digest_hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
        return Err(SignerError::MalformedDigest);
    }
    let mut out = [0_u8; 32];
    for (index, chunk) in digest_hex.as_bytes().chunks(2).enumerate() {
        let byte_str = std::str::from_utf8(chunk).map_err(|_err| SignerError::MalformedDigest)?;
        out[index] = u8::from_str_radix(byte_str, 16).map_err(|_err| SignerError::MalformedDigest)?;
    }
    Ok(out)
}
