//! [`TagService`] — the tag registry, claim engine and redirect lookup.
//!
//! Every operation takes a [`RequestContext`] for log correlation, talks to
//! the store through [`TagStore`], and publishes a [`ChangeNotifier`] event
//! after each successful mutation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, ErrorClass, Result,
  context::RequestContext,
  ident::{self, DEFAULT_PUBLIC_ID_LEN, PublicId, normalize_uid},
  notify::ChangeNotifier,
  profile::{NewProfile, Profile, ProfileCard, validate_username},
  project::{Asset, NewAsset, NewProject, Project},
  resolve::{self, Destination},
  store::{CardUpdate, ClaimCommit, StatusSwap, TagInsert, TagStore},
  tag::{ClaimMode, NewTag, Tag, TagClaim, TagStatus},
  verify::{ClaimProof, RejectAllTaps, TapVerifier, claim_code_digest, claim_code_matches},
};

pub const DEFAULT_PUBLIC_ID_ATTEMPTS: u32 = 8;

/// Compare-and-swap rounds in `set_tag_status` before giving up.
const STATUS_SWAP_ATTEMPTS: u32 = 4;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
  /// Length of generated public ids.
  pub public_id_length:   usize,
  /// Draws per `create_tag` before giving up with
  /// [`Error::IdentifierExhausted`].
  pub public_id_attempts: u32,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      public_id_length:   DEFAULT_PUBLIC_ID_LEN,
      public_id_attempts: DEFAULT_PUBLIC_ID_ATTEMPTS,
    }
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// Input to [`TagService::create_tag`].
#[derive(Debug, Clone)]
pub struct CreateTag {
  pub project_id: Uuid,
  pub asset_id:   Option<Uuid>,
  /// Caller-chosen public id; generated when `None`.
  pub public_id:  Option<String>,
  /// Raw hardware UID as read from the chip, in any common notation.
  pub nfc_uid:    String,
  pub claim_mode: ClaimMode,
  /// For `code` mode; generated when `None`.
  pub claim_code: Option<String>,
}

/// Output of [`TagService::create_tag`].
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTag {
  pub tag:        Tag,
  /// The plain claim code for `code`-mode tags. It is not stored and cannot
  /// be retrieved later.
  pub claim_code: Option<String>,
}

/// Input to [`TagService::claim_tag`].
#[derive(Debug, Clone)]
pub struct ClaimRequest {
  pub public_id:  String,
  pub profile_id: Uuid,
  pub proof:      ClaimProof,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Cloning is cheap; clones share the store, notifier and verifier.
pub struct TagService<S> {
  store:    Arc<S>,
  notifier: ChangeNotifier,
  taps:     Arc<dyn TapVerifier>,
  config:   ServiceConfig,
}

impl<S> Clone for TagService<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: self.notifier.clone(),
      taps:     Arc::clone(&self.taps),
      config:   self.config,
    }
  }
}

impl<S: TagStore> TagService<S> {
  /// A service with default configuration that rejects every secure-tap
  /// proof until [`Self::with_tap_verifier`] is called.
  pub fn new(store: Arc<S>, notifier: ChangeNotifier) -> Self {
    Self {
      store,
      notifier,
      taps: Arc::new(RejectAllTaps),
      config: ServiceConfig::default(),
    }
  }

  pub fn with_tap_verifier(mut self, taps: Arc<dyn TapVerifier>) -> Self {
    self.taps = taps;
    self
  }

  pub fn with_config(mut self, config: ServiceConfig) -> Self {
    self.config = config;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn notifier(&self) -> &ChangeNotifier { &self.notifier }

  // ── Projects, assets, profiles ────────────────────────────────────────

  pub async fn create_project(&self, ctx: &RequestContext, input: NewProject) -> Result<Project> {
    let project = self.store.add_project(input).await.map_err(Error::store)?;
    tracing::info!(
      request_id = %ctx.request_id,
      project_id = %project.project_id,
      kind = %project.kind,
      "project created"
    );
    Ok(project)
  }

  pub async fn get_project(&self, id: Uuid) -> Result<Project> {
    self
      .store
      .get_project(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ProjectNotFound(id))
  }

  pub async fn create_asset(&self, ctx: &RequestContext, input: NewAsset) -> Result<Asset> {
    self.get_project(input.project_id).await?;
    let asset = self.store.add_asset(input).await.map_err(Error::store)?;
    tracing::info!(
      request_id = %ctx.request_id,
      asset_id = %asset.asset_id,
      project_id = %asset.project_id,
      "asset created"
    );
    Ok(asset)
  }

  pub async fn list_assets(&self, project_id: Uuid) -> Result<Vec<Asset>> {
    self.get_project(project_id).await?;
    self.store.list_assets(project_id).await.map_err(Error::store)
  }

  pub async fn create_profile(&self, ctx: &RequestContext, input: NewProfile) -> Result<Profile> {
    let profile = self.store.add_profile(input).await.map_err(Error::store)?;
    tracing::info!(
      request_id = %ctx.request_id,
      profile_id = %profile.profile_id,
      role = %profile.role,
      "profile created"
    );
    Ok(profile)
  }

  pub async fn get_profile(&self, id: Uuid) -> Result<Profile> {
    self
      .store
      .get_profile(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ProfileNotFound(id))
  }

  /// Establish the username a claimant's profile-card links resolve to.
  pub async fn set_username(
    &self,
    ctx: &RequestContext,
    profile_id: Uuid,
    project_id: Uuid,
    username: String,
  ) -> Result<ProfileCard> {
    validate_username(&username)?;
    self.get_profile(profile_id).await?;
    self.get_project(project_id).await?;

    match self
      .store
      .set_username(profile_id, project_id, username.clone())
      .await
      .map_err(Error::store)?
    {
      CardUpdate::Updated(card) => {
        tracing::info!(
          request_id = %ctx.request_id,
          %profile_id,
          %project_id,
          username = %username,
          "username set"
        );
        self.notifier.project_tags_changed(project_id);
        Ok(card)
      }
      CardUpdate::UsernameTaken => Err(Error::UsernameInUse(username)),
    }
  }

  // ── Tag registry ──────────────────────────────────────────────────────

  /// Register a new tag.
  ///
  /// Uniqueness of the UID and public id is decided by the store's insert,
  /// not by a prior lookup. A generated public id that collides is redrawn
  /// up to `public_id_attempts` times; a caller-supplied one is not.
  pub async fn create_tag(&self, ctx: &RequestContext, input: CreateTag) -> Result<CreatedTag> {
    let nfc_uid = normalize_uid(&input.nfc_uid)?;
    let requested = input.public_id.map(PublicId::parse).transpose()?;

    let (claim_code, claim_code_digest) = match (input.claim_mode, input.claim_code) {
      (ClaimMode::Code, code) => {
        let code = code
          .map(|c| c.trim().to_owned())
          .filter(|c| !c.is_empty())
          .unwrap_or_else(ident::generate_claim_code);
        let digest = claim_code_digest(&code);
        (Some(code), Some(digest))
      }
      (mode, Some(_)) => return Err(Error::ClaimCodeNotApplicable(mode)),
      (_, None) => (None, None),
    };

    self.get_project(input.project_id).await?;
    if let Some(asset_id) = input.asset_id {
      let asset = self
        .store
        .get_asset(asset_id)
        .await
        .map_err(Error::store)?
        .ok_or(Error::AssetNotFound(asset_id))?;
      if asset.project_id != input.project_id {
        return Err(Error::AssetProjectMismatch {
          asset_id,
          project_id: input.project_id,
        });
      }
    }

    let attempts = if requested.is_some() {
      1
    } else {
      self.config.public_id_attempts.max(1)
    };

    for attempt in 1..=attempts {
      let public_id = match &requested {
        Some(id) => id.clone(),
        None => ident::generate_public_id(self.config.public_id_length)?,
      };
      let new_tag = NewTag {
        project_id: input.project_id,
        asset_id: input.asset_id,
        public_id: public_id.clone(),
        nfc_uid: nfc_uid.clone(),
        claim_mode: input.claim_mode,
        claim_code_digest: claim_code_digest.clone(),
      };

      match self.store.insert_tag(new_tag).await.map_err(Error::store)? {
        TagInsert::Inserted(tag) => {
          tracing::info!(
            request_id = %ctx.request_id,
            tag_id = %tag.tag_id,
            public_id = %tag.public_id,
            project_id = %tag.project_id,
            claim_mode = %tag.claim_mode,
            "tag created"
          );
          self.notifier.project_tags_changed(tag.project_id);
          return Ok(CreatedTag { tag, claim_code });
        }
        TagInsert::UidTaken => return Err(Error::UidInUse(nfc_uid.to_string())),
        TagInsert::PublicIdTaken if requested.is_some() => {
          return Err(Error::PublicIdInUse(public_id.to_string()));
        }
        TagInsert::PublicIdTaken => {
          tracing::warn!(
            request_id = %ctx.request_id,
            attempt,
            "generated public id collided; drawing again"
          );
        }
      }
    }

    let err = Error::IdentifierExhausted { attempts };
    tracing::error!(request_id = %ctx.request_id, error = %err, "public id space exhausted");
    Err(err)
  }

  pub async fn get_tag(&self, tag_id: Uuid) -> Result<Tag> {
    self
      .store
      .get_tag(tag_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::TagNotFound(tag_id))
  }

  /// Look up a tag by public id. Absence is `Ok(None)`.
  pub async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Tag>> {
    self
      .store
      .find_tag_by_public_id(public_id)
      .await
      .map_err(Error::store)
  }

  pub async fn list_tags(&self, project_id: Uuid) -> Result<Vec<Tag>> {
    self.get_project(project_id).await?;
    self.store.list_tags(project_id).await.map_err(Error::store)
  }

  pub async fn list_claims(&self, tag_id: Uuid) -> Result<Vec<TagClaim>> {
    self.get_tag(tag_id).await?;
    self.store.list_claims(tag_id).await.map_err(Error::store)
  }

  /// Admin enable/disable. Claim rows are never touched.
  pub async fn set_tag_status(
    &self,
    ctx: &RequestContext,
    tag_id: Uuid,
    to: TagStatus,
  ) -> Result<Tag> {
    let mut from = self.get_tag(tag_id).await?.status;

    for _ in 0..STATUS_SWAP_ATTEMPTS {
      let next = from.transition(to)?;
      match self
        .store
        .swap_status(tag_id, from, next)
        .await
        .map_err(Error::store)?
      {
        StatusSwap::Swapped(updated) => {
          tracing::info!(
            request_id = %ctx.request_id,
            %tag_id,
            %from,
            to = %updated.status,
            "tag status changed"
          );
          self.notifier.project_tags_changed(updated.project_id);
          return Ok(updated);
        }
        // The tag moved between our read and the swap; re-check from there.
        StatusSwap::Stale(current) => {
          tracing::debug!(request_id = %ctx.request_id, %tag_id, %from, %current, "stale status");
          from = current;
        }
        StatusSwap::Missing => return Err(Error::TagNotFound(tag_id)),
      }
    }

    tracing::warn!(request_id = %ctx.request_id, %tag_id, %from, %to, "status kept changing");
    Err(Error::InvalidTransition { from, to })
  }

  // ── Claim engine ──────────────────────────────────────────────────────

  /// Attempt to claim the tag behind `public_id` for `profile_id`.
  ///
  /// The status pre-check only fails fast; the decision is made by the
  /// store's atomic [`TagStore::commit_claim`], so of two racing callers
  /// exactly one wins and the other sees [`Error::AlreadyClaimed`].
  pub async fn claim_tag(&self, ctx: &RequestContext, req: ClaimRequest) -> Result<TagClaim> {
    let result = self.try_claim(&req).await;
    match &result {
      Ok(claim) => tracing::info!(
        request_id = %ctx.request_id,
        public_id = %req.public_id,
        tag_id = %claim.tag_id,
        profile_id = %claim.profile_id,
        "tag claimed"
      ),
      Err(e) if e.class() == ErrorClass::Store => tracing::error!(
        request_id = %ctx.request_id,
        public_id = %req.public_id,
        error = %e,
        "claim failed"
      ),
      Err(e) => tracing::info!(
        request_id = %ctx.request_id,
        public_id = %req.public_id,
        profile_id = %req.profile_id,
        reason = e.code(),
        "claim refused"
      ),
    }
    result
  }

  async fn try_claim(&self, req: &ClaimRequest) -> Result<TagClaim> {
    let tag = self
      .find_by_public_id(&req.public_id)
      .await?
      .ok_or_else(|| Error::PublicIdNotFound(req.public_id.clone()))?;
    self.get_profile(req.profile_id).await?;
    tag.status.check_claimable(tag.tag_id)?;
    self.authorize(&tag, &req.proof).await?;

    match self
      .store
      .commit_claim(tag.tag_id, req.profile_id)
      .await
      .map_err(Error::store)?
    {
      ClaimCommit::Committed(claim) => {
        self.notifier.claims_changed(tag.tag_id);
        self.notifier.project_tags_changed(tag.project_id);
        Ok(claim)
      }
      ClaimCommit::Rejected(TagStatus::Disabled) => Err(Error::TagDisabled(tag.tag_id)),
      ClaimCommit::Rejected(_) => Err(Error::AlreadyClaimed(tag.tag_id)),
      ClaimCommit::Missing => Err(Error::TagNotFound(tag.tag_id)),
    }
  }

  /// Check the claim-mode policy for `tag` against the presented proof.
  async fn authorize(&self, tag: &Tag, proof: &ClaimProof) -> Result<()> {
    match tag.claim_mode {
      ClaimMode::FirstToClaim => Ok(()),
      ClaimMode::SecureTap => {
        let ClaimProof::Tap(tap) = proof else {
          return Err(Error::ClaimModeProofFailed(tag.tag_id));
        };
        if !self.taps.verify(tag, tap) {
          return Err(Error::ClaimModeProofFailed(tag.tag_id));
        }
        // A genuine signature at a counter already seen is a replay.
        let fresh = self
          .store
          .advance_tap_counter(tag.tag_id, tap.counter)
          .await
          .map_err(Error::store)?;
        if fresh { Ok(()) } else { Err(Error::ClaimModeProofFailed(tag.tag_id)) }
      }
      ClaimMode::Code => {
        let ClaimProof::Code { code } = proof else {
          return Err(Error::InvalidClaimCode(tag.tag_id));
        };
        let digest = self
          .store
          .claim_code_digest(tag.tag_id)
          .await
          .map_err(Error::store)?;
        match digest {
          Some(digest) if claim_code_matches(&digest, code) => Ok(()),
          _ => Err(Error::InvalidClaimCode(tag.tag_id)),
        }
      }
    }
  }

  // ── Redirect resolution ───────────────────────────────────────────────

  /// Where the tag behind `public_id` currently points. `Ok(None)` when no
  /// such tag exists.
  pub async fn resolve_redirect(
    &self,
    ctx: &RequestContext,
    public_id: &str,
  ) -> Result<Option<Destination>> {
    let Some(tag) = self.find_by_public_id(public_id).await? else {
      tracing::debug!(request_id = %ctx.request_id, public_id, "unknown public id");
      return Ok(None);
    };
    let project = self.get_project(tag.project_id).await?;

    let (claims, cards) = if tag.status == TagStatus::Claimed {
      let claims = self.store.list_claims(tag.tag_id).await.map_err(Error::store)?;
      let card = match resolve::latest_claim(&claims, tag.tag_id) {
        Some(latest) => self
          .store
          .get_profile_card(latest.profile_id, project.project_id)
          .await
          .map_err(Error::store)?,
        None => None,
      };
      (claims, card.into_iter().collect::<Vec<_>>())
    } else {
      (Vec::new(), Vec::new())
    };

    let destination = resolve::resolve(&tag, &project, &claims, &cards);
    tracing::debug!(
      request_id = %ctx.request_id,
      public_id,
      destination = %destination,
      "redirect resolved"
    );
    Ok(Some(destination))
  }
}
