//! Handlers for `/tags` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/tags` | 201 with `{tag_id, public_id, claim_code?}` |
//! | `GET`  | `/tags/{id}` | 404 if not found |
//! | `GET`  | `/tags/{id}/claims` | Oldest first |
//! | `POST` | `/tags/{id}/status` | Body: `{"status":"disabled"}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use taplink_core::{
  service::{CreateTag, TagService},
  store::TagStore,
  tag::{ClaimMode, Tag, TagClaim, TagStatus},
};
use uuid::Uuid;

use crate::{
  context::Ctx,
  error::ApiError,
  extract::{JsonBody, UrlPath},
};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub project_id: Uuid,
  #[serde(default)]
  pub asset_id:   Option<Uuid>,
  #[serde(default)]
  pub public_id:  Option<String>,
  pub nfc_uid:    String,
  /// Parsed by the service so unknown modes surface as a domain error.
  pub claim_mode: String,
  #[serde(default)]
  pub claim_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedBody {
  pub tag_id:     Uuid,
  pub public_id:  String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub claim_code: Option<String>,
}

/// `POST /tags`
pub async fn create<S: TagStore>(
  State(svc): State<TagService<S>>,
  Ctx(ctx): Ctx,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let claim_mode = ClaimMode::parse(&body.claim_mode)?;
  let created = svc
    .create_tag(&ctx, CreateTag {
      project_id: body.project_id,
      asset_id: body.asset_id,
      public_id: body.public_id,
      nfc_uid: body.nfc_uid,
      claim_mode,
      claim_code: body.claim_code,
    })
    .await?;

  Ok((
    StatusCode::CREATED,
    Json(CreatedBody {
      tag_id:     created.tag.tag_id,
      public_id:  created.tag.public_id.to_string(),
      claim_code: created.claim_code,
    }),
  ))
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// `GET /tags/{id}`
pub async fn get_one<S: TagStore>(
  State(svc): State<TagService<S>>,
  UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Tag>, ApiError> {
  Ok(Json(svc.get_tag(id).await?))
}

/// `GET /tags/{id}/claims`
pub async fn list_claims<S: TagStore>(
  State(svc): State<TagService<S>>,
  UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Vec<TagClaim>>, ApiError> {
  Ok(Json(svc.list_claims(id).await?))
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: TagStatus,
}

/// `POST /tags/{id}/status`
pub async fn set_status<S: TagStore>(
  State(svc): State<TagService<S>>,
  Ctx(ctx): Ctx,
  UrlPath(id): UrlPath<Uuid>,
  JsonBody(body): JsonBody<StatusBody>,
) -> Result<Json<Tag>, ApiError> {
  Ok(Json(svc.set_tag_status(&ctx, id, body.status).await?))
}
