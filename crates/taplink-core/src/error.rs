//! Error types for `taplink-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::tag::{ClaimMode, TagStatus};

#[derive(Debug, Error)]
pub enum Error {
  // ── Validation ──────────────────────────────────────────────────────────
  #[error("invalid hardware uid {0:?}: no hexadecimal digits")]
  InvalidUid(String),

  #[error("invalid public id {0:?}: expected 4-64 characters of [A-Za-z0-9-_]")]
  PublicIdFormatInvalid(String),

  #[error("asset {asset_id} does not belong to project {project_id}")]
  AssetProjectMismatch { asset_id: Uuid, project_id: Uuid },

  #[error("unsupported claim mode: {0:?}")]
  UnsupportedClaimMode(String),

  #[error("claim codes only apply to code-mode tags, not {0}")]
  ClaimCodeNotApplicable(ClaimMode),

  #[error("invalid username {0:?}: expected 2-32 characters of [A-Za-z0-9._-]")]
  InvalidUsername(String),

  // ── Not found ───────────────────────────────────────────────────────────
  #[error("project not found: {0}")]
  ProjectNotFound(Uuid),

  #[error("asset not found: {0}")]
  AssetNotFound(Uuid),

  #[error("profile not found: {0}")]
  ProfileNotFound(Uuid),

  #[error("tag not found: {0}")]
  TagNotFound(Uuid),

  #[error("no tag with public id {0:?}")]
  PublicIdNotFound(String),

  // ── Conflicts ───────────────────────────────────────────────────────────
  #[error("hardware uid {0} is already bound to a tag")]
  UidInUse(String),

  #[error("public id {0:?} is already in use")]
  PublicIdInUse(String),

  #[error("tag {0} has already been claimed")]
  AlreadyClaimed(Uuid),

  #[error("username {0:?} is already taken in this project")]
  UsernameInUse(String),

  // ── State ───────────────────────────────────────────────────────────────
  #[error("tag {0} is disabled")]
  TagDisabled(Uuid),

  #[error("cannot move a tag from {from} to {to}")]
  InvalidTransition { from: TagStatus, to: TagStatus },

  // ── Claim proofs ────────────────────────────────────────────────────────
  #[error("secure tap proof rejected for tag {0}")]
  ClaimModeProofFailed(Uuid),

  #[error("claim code rejected for tag {0}")]
  InvalidClaimCode(Uuid),

  // ── Operational ─────────────────────────────────────────────────────────
  #[error("no free public id after {attempts} attempts")]
  IdentifierExhausted { attempts: u32 },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse grouping of [`Error`] variants, used by transports to pick a
/// status code and by the service to pick a log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// Rejected before any write; the caller should fix the input.
  Validation,
  NotFound,
  /// A legitimate race or duplicate; never retried by the core.
  Conflict,
  /// The caller acted on stale state.
  State,
  /// A claim proof (code or secure tap) did not verify.
  Proof,
  /// The identifier space or retry budget is misconfigured.
  Exhaustion,
  Store,
}

impl Error {
  pub fn class(&self) -> ErrorClass {
    match self {
      Self::InvalidUid(_)
      | Self::PublicIdFormatInvalid(_)
      | Self::AssetProjectMismatch { .. }
      | Self::UnsupportedClaimMode(_)
      | Self::ClaimCodeNotApplicable(_)
      | Self::InvalidUsername(_) => ErrorClass::Validation,
      Self::ProjectNotFound(_)
      | Self::AssetNotFound(_)
      | Self::ProfileNotFound(_)
      | Self::TagNotFound(_)
      | Self::PublicIdNotFound(_) => ErrorClass::NotFound,
      Self::UidInUse(_)
      | Self::PublicIdInUse(_)
      | Self::AlreadyClaimed(_)
      | Self::UsernameInUse(_) => ErrorClass::Conflict,
      Self::TagDisabled(_) | Self::InvalidTransition { .. } => ErrorClass::State,
      Self::ClaimModeProofFailed(_) | Self::InvalidClaimCode(_) => ErrorClass::Proof,
      Self::IdentifierExhausted { .. } => ErrorClass::Exhaustion,
      Self::Store(_) => ErrorClass::Store,
    }
  }

  /// Stable machine-readable code for the variant, e.g. `"already_claimed"`.
  pub fn code(&self) -> &'static str {
    match self {
      Self::InvalidUid(_) => "invalid_uid",
      Self::PublicIdFormatInvalid(_) => "public_id_format_invalid",
      Self::AssetProjectMismatch { .. } => "asset_project_mismatch",
      Self::UnsupportedClaimMode(_) => "unsupported_claim_mode",
      Self::ClaimCodeNotApplicable(_) => "claim_code_not_applicable",
      Self::InvalidUsername(_) => "invalid_username",
      Self::ProjectNotFound(_) => "project_not_found",
      Self::AssetNotFound(_) => "asset_not_found",
      Self::ProfileNotFound(_) => "profile_not_found",
      Self::TagNotFound(_) | Self::PublicIdNotFound(_) => "tag_not_found",
      Self::UidInUse(_) => "uid_in_use",
      Self::PublicIdInUse(_) => "public_id_in_use",
      Self::AlreadyClaimed(_) => "already_claimed",
      Self::UsernameInUse(_) => "username_in_use",
      Self::TagDisabled(_) => "tag_disabled",
      Self::InvalidTransition { .. } => "invalid_transition",
      Self::ClaimModeProofFailed(_) => "claim_mode_proof_failed",
      Self::InvalidClaimCode(_) => "invalid_claim_code",
      Self::IdentifierExhausted { .. } => "identifier_exhausted",
      Self::Store(_) => "store",
    }
  }

  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
