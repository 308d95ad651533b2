//! Handlers for `/projects` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/projects` | Body: `{"name","kind","destination_url"?,"description"?}` |
//! | `GET`  | `/projects/{id}` | 404 if not found |
//! | `GET`  | `/projects/{id}/tags` | Tags in creation order |
//! | `GET`  | `/projects/{id}/assets` | |
//! | `POST` | `/projects/{id}/assets` | Body: `{"name","kind"}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use taplink_core::{
  project::{Asset, AssetKind, NewAsset, NewProject, Project},
  service::TagService,
  store::TagStore,
  tag::Tag,
};
use uuid::Uuid;

use crate::{
  context::Ctx,
  error::ApiError,
  extract::{JsonBody, UrlPath},
};

// ─── Projects ────────────────────────────────────────────────────────────────

/// `POST /projects`
pub async fn create<S: TagStore>(
  State(svc): State<TagService<S>>,
  Ctx(ctx): Ctx,
  JsonBody(body): JsonBody<NewProject>,
) -> Result<impl IntoResponse, ApiError> {
  let project = svc.create_project(&ctx, body).await?;
  Ok((StatusCode::CREATED, Json(project)))
}

/// `GET /projects/{id}`
pub async fn get_one<S: TagStore>(
  State(svc): State<TagService<S>>,
  UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Project>, ApiError> {
  Ok(Json(svc.get_project(id).await?))
}

/// `GET /projects/{id}/tags`
pub async fn list_tags<S: TagStore>(
  State(svc): State<TagService<S>>,
  UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Vec<Tag>>, ApiError> {
  Ok(Json(svc.list_tags(id).await?))
}

// ─── Assets ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateAssetBody {
  pub name: String,
  pub kind: AssetKind,
}

/// `POST /projects/{id}/assets`
pub async fn create_asset<S: TagStore>(
  State(svc): State<TagService<S>>,
  Ctx(ctx): Ctx,
  UrlPath(project_id): UrlPath<Uuid>,
  JsonBody(body): JsonBody<CreateAssetBody>,
) -> Result<impl IntoResponse, ApiError> {
  let asset = svc
    .create_asset(&ctx, NewAsset {
      project_id,
      name: body.name,
      kind: body.kind,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(asset)))
}

/// `GET /projects/{id}/assets`
pub async fn list_assets<S: TagStore>(
  State(svc): State<TagService<S>>,
  UrlPath(project_id): UrlPath<Uuid>,
) -> Result<Json<Vec<Asset>>, ApiError> {
  Ok(Json(svc.list_assets(project_id).await?))
}
