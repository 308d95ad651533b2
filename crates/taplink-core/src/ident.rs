//! Public identifiers and hardware UIDs.
//!
//! A [`PublicId`] is the short code printed into a tag's URL. A [`HexUid`] is
//! the chip's hardware serial, normalised so that `04:a2:3f`, `04-A2-3F` and
//! `04a23f` all name the same chip.
//!
//! Generation here only draws candidates. Global uniqueness is enforced by
//! the store at insert time; see [`crate::service::TagService::create_tag`].

use std::fmt;

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const PUBLIC_ID_MIN_LEN: usize = 4;
pub const PUBLIC_ID_MAX_LEN: usize = 64;
pub const DEFAULT_PUBLIC_ID_LEN: usize = 10;

/// Exactly 64 symbols, so a random byte masked with `0x3f` is uniform.
const PUBLIC_ID_ALPHABET: &[u8; 64] =
  b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// 32 symbols without `0/O` and `1/I`, for codes people type by hand.
const CLAIM_CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CLAIM_CODE_LEN: usize = 8;

// ─── PublicId ────────────────────────────────────────────────────────────────

/// A validated public identifier: 4–64 characters of `[A-Za-z0-9-_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicId(String);

impl PublicId {
  /// Validate a caller-supplied public id.
  pub fn parse(s: impl Into<String>) -> Result<Self> {
    let s = s.into();
    let len_ok = (PUBLIC_ID_MIN_LEN..=PUBLIC_ID_MAX_LEN).contains(&s.len());
    if len_ok && s.bytes().all(is_public_id_byte) {
      Ok(Self(s))
    } else {
      Err(Error::PublicIdFormatInvalid(s))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

fn is_public_id_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

impl TryFrom<String> for PublicId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(s) }
}

impl From<PublicId> for String {
  fn from(id: PublicId) -> Self { id.0 }
}

impl AsRef<str> for PublicId {
  fn as_ref(&self) -> &str { &self.0 }
}

impl fmt::Display for PublicId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Draw a random public id of exactly `len` characters from the OS CSPRNG.
pub fn generate_public_id(len: usize) -> Result<PublicId> {
  if !(PUBLIC_ID_MIN_LEN..=PUBLIC_ID_MAX_LEN).contains(&len) {
    return Err(Error::PublicIdFormatInvalid(format!(
      "<{len} random characters>"
    )));
  }
  Ok(PublicId(draw(PUBLIC_ID_ALPHABET, len)))
}

/// Draw a random claim code for `code`-mode tags.
pub fn generate_claim_code() -> String { draw(CLAIM_CODE_ALPHABET, CLAIM_CODE_LEN) }

/// Both alphabets have a power-of-two size, so masking keeps the draw
/// unbiased.
fn draw(alphabet: &[u8], len: usize) -> String {
  debug_assert!(alphabet.len().is_power_of_two());
  let mask = alphabet.len() - 1;
  let mut bytes = vec![0u8; len];
  OsRng.fill_bytes(&mut bytes);
  bytes
    .iter()
    .map(|b| alphabet[usize::from(*b) & mask] as char)
    .collect()
}

// ─── HexUid ──────────────────────────────────────────────────────────────────

/// A hardware UID normalised to uppercase hexadecimal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexUid(String);

impl HexUid {
  pub fn as_str(&self) -> &str { &self.0 }
}

/// Strip everything outside `[0-9a-fA-F]` and uppercase the rest.
///
/// Idempotent: normalising an already-normalised UID returns it unchanged.
pub fn normalize_uid(raw: &str) -> Result<HexUid> {
  let hex: String = raw
    .chars()
    .filter(char::is_ascii_hexdigit)
    .map(|c| c.to_ascii_uppercase())
    .collect();
  if hex.is_empty() {
    return Err(Error::InvalidUid(raw.to_owned()));
  }
  Ok(HexUid(hex))
}

impl TryFrom<String> for HexUid {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { normalize_uid(&s) }
}

impl From<HexUid> for String {
  fn from(uid: HexUid) -> Self { uid.0 }
}

impl fmt::Display for HexUid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
