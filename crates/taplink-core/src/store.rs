//! The `TagStore` trait and the outcome types of its conditional writes.
//!
//! The trait is implemented by storage backends (e.g. `taplink-store-sqlite`).
//! [`crate::service::TagService`] depends on this abstraction, not on any
//! concrete backend.
//!
//! Uniqueness and the claim race are settled *inside* the store: a backend
//! must enforce `public_id`/`nfc_uid` uniqueness with constraints and must
//! make [`TagStore::commit_claim`] a single atomic compare-and-swap. Expected
//! losers of those races are reported as outcome values, not errors.

use std::future::Future;

use uuid::Uuid;

use crate::{
  profile::{NewProfile, Profile, ProfileCard},
  project::{Asset, NewAsset, NewProject, Project},
  tag::{NewTag, Tag, TagClaim, TagStatus},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of [`TagStore::insert_tag`].
#[derive(Debug, Clone)]
pub enum TagInsert {
  Inserted(Tag),
  /// Another tag already holds this `nfc_uid`.
  UidTaken,
  /// Another tag already holds this `public_id`.
  PublicIdTaken,
}

/// Result of [`TagStore::commit_claim`].
#[derive(Debug, Clone)]
pub enum ClaimCommit {
  /// The tag flipped from `active` to `claimed` and the claim was recorded.
  Committed(TagClaim),
  /// The tag was not `active`; nothing was written.
  Rejected(TagStatus),
  Missing,
}

/// Result of [`TagStore::swap_status`].
#[derive(Debug, Clone)]
pub enum StatusSwap {
  Swapped(Tag),
  /// The tag's status was no longer the expected one.
  Stale(TagStatus),
  Missing,
}

/// Result of [`TagStore::set_username`].
#[derive(Debug, Clone)]
pub enum CardUpdate {
  Updated(ProfileCard),
  UsernameTaken,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Taplink storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TagStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Projects and assets ───────────────────────────────────────────────

  fn add_project(
    &self,
    input: NewProject,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  fn get_project(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// The project must exist; callers check first.
  fn add_asset(
    &self,
    input: NewAsset,
  ) -> impl Future<Output = Result<Asset, Self::Error>> + Send + '_;

  fn get_asset(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Asset>, Self::Error>> + Send + '_;

  fn list_assets(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Asset>, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn add_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Create or update the `(profile, project)` card with `username`.
  /// Usernames are unique per project.
  fn set_username(
    &self,
    profile_id: Uuid,
    project_id: Uuid,
    username: String,
  ) -> impl Future<Output = Result<CardUpdate, Self::Error>> + Send + '_;

  fn get_profile_card(
    &self,
    profile_id: Uuid,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Option<ProfileCard>, Self::Error>> + Send + '_;

  // ── Tags ──────────────────────────────────────────────────────────────

  /// Insert a tag with status `active`, plus its claim code digest if any,
  /// in one transaction.
  fn insert_tag(
    &self,
    input: NewTag,
  ) -> impl Future<Output = Result<TagInsert, Self::Error>> + Send + '_;

  fn get_tag(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + '_;

  /// Look a tag up by its public id. Returns `None` if not found.
  fn find_tag_by_public_id<'a>(
    &'a self,
    public_id: &'a str,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + 'a;

  fn list_tags(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  /// Set the tag's status to `to` only if it is currently `from`.
  fn swap_status(
    &self,
    tag_id: Uuid,
    from: TagStatus,
    to: TagStatus,
  ) -> impl Future<Output = Result<StatusSwap, Self::Error>> + Send + '_;

  fn claim_code_digest(
    &self,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Record `counter` as the latest accepted secure-tap counter for the
  /// tag. Returns `false`, writing nothing, unless it is strictly greater
  /// than the last recorded one.
  fn advance_tap_counter(
    &self,
    tag_id: Uuid,
    counter: u32,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Claims ────────────────────────────────────────────────────────────

  /// Atomically flip the tag from `active` to `claimed` and append a claim
  /// for `profile_id`. Of any number of concurrent calls on one tag, at most
  /// one returns [`ClaimCommit::Committed`].
  fn commit_claim(
    &self,
    tag_id: Uuid,
    profile_id: Uuid,
  ) -> impl Future<Output = Result<ClaimCommit, Self::Error>> + Send + '_;

  /// All claims for a tag, oldest first.
  fn list_claims(
    &self,
    tag_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TagClaim>, Self::Error>> + Send + '_;
}
