//! Claim proofs: claim codes and secure-tap signatures.
//!
//! Claim codes are never stored in plain text; the store keeps the hex
//! SHA-256 of the normalised code. Secure-tap proofs are checked by a
//! pluggable [`TapVerifier`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{ident::HexUid, tag::Tag};

/// Evidence presented alongside a claim attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimProof {
  #[default]
  None,
  Code {
    code: String,
  },
  Tap(TapProof),
}

/// A signature produced by the chip (or its companion app) on tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapProof {
  /// Monotonic tap counter reported by the chip. Each counter value is
  /// accepted at most once per tag.
  pub counter:   u32,
  /// Hex-encoded signature over the chip UID and counter.
  pub signature: String,
}

// ─── Claim codes ─────────────────────────────────────────────────────────────

/// Digest stored for a claim code. Codes compare case-insensitively and
/// ignore surrounding whitespace.
pub fn claim_code_digest(code: &str) -> String {
  let normalized = code.trim().to_ascii_uppercase();
  hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// Whether `code` matches the stored `digest`.
pub fn claim_code_matches(digest: &str, code: &str) -> bool {
  !code.trim().is_empty() && claim_code_digest(code) == digest
}

// ─── Secure tap ──────────────────────────────────────────────────────────────

/// Verifies secure-tap proofs. Implementations must be cheap and
/// non-blocking; they run inside the claim request.
pub trait TapVerifier: Send + Sync {
  fn verify(&self, tag: &Tag, proof: &TapProof) -> bool;
}

/// Accepts a proof whose signature is
/// `hex(sha256(secret ":" nfc_uid ":" counter))`.
#[derive(Clone)]
pub struct DigestTapVerifier {
  secret: String,
}

impl DigestTapVerifier {
  pub fn new(secret: impl Into<String>) -> Self {
    Self { secret: secret.into() }
  }

  /// The signature a genuine tap of `uid` at `counter` carries.
  pub fn sign(&self, uid: &HexUid, counter: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.secret.as_bytes());
    hasher.update(b":");
    hasher.update(uid.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(counter.to_string().as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl TapVerifier for DigestTapVerifier {
  fn verify(&self, tag: &Tag, proof: &TapProof) -> bool {
    proof
      .signature
      .eq_ignore_ascii_case(&self.sign(&tag.nfc_uid, proof.counter))
  }
}

/// Rejects every proof. Used when no tap secret is configured, which makes
/// `secure_tap` tags unclaimable rather than open.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAllTaps;

impl TapVerifier for RejectAllTaps {
  fn verify(&self, _tag: &Tag, _proof: &TapProof) -> bool { false }
}
