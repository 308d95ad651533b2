//! Tags, claims, and the tag status state machine.
//!
//! ```text
//!            disable               claim (active only)
//!   active ──────────▶ disabled    active ──────────▶ claimed
//!     ▲                   │                              │
//!     └───── enable ──────┘          disabled ◀─disable──┘
//! ```
//!
//! Re-enabling a tag that was claimed and then disabled returns it to
//! `active`; its claim rows stay untouched but a fresh claim is needed to
//! reach `claimed` again.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  ident::{HexUid, PublicId},
};

// ─── Claim mode ──────────────────────────────────────────────────────────────

/// The policy that authorises a claim. Immutable after tag creation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClaimMode {
  /// The claimant presents a code distributed out of band.
  Code,
  /// The claimant's device presents a proof of physical tap.
  SecureTap,
  /// The first committed claim wins; no proof required.
  FirstToClaim,
}

impl ClaimMode {
  /// Parse a wire value, reporting unknown modes as
  /// [`Error::UnsupportedClaimMode`].
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnsupportedClaimMode(s.to_owned()))
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TagStatus {
  Active,
  Disabled,
  Claimed,
}

impl TagStatus {
  /// Validate an admin status change and return the status to store.
  ///
  /// Only `active` and `disabled` are admin targets; `claimed` is reachable
  /// solely through a claim.
  pub fn transition(self, to: TagStatus) -> Result<TagStatus> {
    match (self, to) {
      (Self::Active, Self::Disabled)
      | (Self::Claimed, Self::Disabled)
      | (Self::Disabled, Self::Active) => Ok(to),
      (from, to) => Err(Error::InvalidTransition { from, to }),
    }
  }

  /// Check that a tag in this status may be claimed.
  pub fn check_claimable(self, tag_id: Uuid) -> Result<()> {
    match self {
      Self::Active => Ok(()),
      Self::Disabled => Err(Error::TagDisabled(tag_id)),
      Self::Claimed => Err(Error::AlreadyClaimed(tag_id)),
    }
  }
}

// ─── Tag ─────────────────────────────────────────────────────────────────────

/// The logical record of one physical chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id:     Uuid,
  pub public_id:  PublicId,
  pub nfc_uid:    HexUid,
  pub project_id: Uuid,
  /// If set, belongs to the same project as the tag.
  pub asset_id:   Option<Uuid>,
  pub claim_mode: ClaimMode,
  pub status:     TagStatus,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::TagStore::insert_tag`]. All fields are already
/// validated; the store assigns `tag_id`, `created_at` and `status`.
#[derive(Debug, Clone)]
pub struct NewTag {
  pub project_id:        Uuid,
  pub asset_id:          Option<Uuid>,
  pub public_id:         PublicId,
  pub nfc_uid:           HexUid,
  pub claim_mode:        ClaimMode,
  /// Digest of the claim code, stored with the tag for `code` mode.
  pub claim_code_digest: Option<String>,
}

// ─── Claims ──────────────────────────────────────────────────────────────────

/// An append-only record linking a profile to a tag at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagClaim {
  pub claim_id:   Uuid,
  pub tag_id:     Uuid,
  pub profile_id: Uuid,
  pub claimed_at: DateTime<Utc>,
}
