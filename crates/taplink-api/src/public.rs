//! The public tag surface: what a phone hits after reading a tag, and the
//! claim endpoint.

use axum::{
  Json,
  extract::State,
};
use serde::{Deserialize, Serialize};
use taplink_core::{
  Error,
  resolve::Destination,
  service::{ClaimRequest, TagService},
  store::TagStore,
  verify::ClaimProof,
};
use uuid::Uuid;

use crate::{
  context::Ctx,
  error::ApiError,
  extract::{JsonBody, UrlPath},
};

#[derive(Debug, Serialize)]
pub struct ResolvedBody {
  pub public_id:   String,
  pub destination: Destination,
  /// `destination` rendered for display.
  pub display:     String,
}

/// `GET /t/{public_id}`
pub async fn resolve<S: TagStore>(
  State(svc): State<TagService<S>>,
  Ctx(ctx): Ctx,
  UrlPath(public_id): UrlPath<String>,
) -> Result<Json<ResolvedBody>, ApiError> {
  let destination = svc
    .resolve_redirect(&ctx, &public_id)
    .await?
    .ok_or_else(|| Error::PublicIdNotFound(public_id.clone()))?;
  Ok(Json(ResolvedBody {
    display: destination.to_string(),
    public_id,
    destination,
  }))
}

#[derive(Debug, Deserialize)]
pub struct ClaimBody {
  pub profile_id: Uuid,
  #[serde(default)]
  pub proof:      ClaimProof,
}

#[derive(Debug, Serialize)]
pub struct ClaimedBody {
  pub status:   &'static str,
  pub claim_id: Uuid,
  pub tag_id:   Uuid,
}

/// `POST /t/{public_id}/claim` — body: `{"profile_id":..,"proof":{"kind":"code","code":..}}`
pub async fn claim<S: TagStore>(
  State(svc): State<TagService<S>>,
  Ctx(ctx): Ctx,
  UrlPath(public_id): UrlPath<String>,
  JsonBody(body): JsonBody<ClaimBody>,
) -> Result<Json<ClaimedBody>, ApiError> {
  let claim = svc
    .claim_tag(&ctx, ClaimRequest {
      public_id,
      profile_id: body.profile_id,
      proof: body.proof,
    })
    .await?;
  Ok(Json(ClaimedBody {
    status:   "claimed",
    claim_id: claim.claim_id,
    tag_id:   claim.tag_id,
  }))
}
