//! Handlers for `/profiles` endpoints.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use taplink_core::{
  profile::{NewProfile, Profile, ProfileCard},
  service::TagService,
  store::TagStore,
};
use uuid::Uuid;

use crate::{
  context::Ctx,
  error::ApiError,
  extract::{JsonBody, UrlPath},
};

/// `POST /profiles` — body: `{"role":"customer","display_name":..,"email":..}`
pub async fn create<S: TagStore>(
  State(svc): State<TagService<S>>,
  Ctx(ctx): Ctx,
  JsonBody(body): JsonBody<NewProfile>,
) -> Result<impl IntoResponse, ApiError> {
  let profile = svc.create_profile(&ctx, body).await?;
  Ok((StatusCode::CREATED, Json(profile)))
}

/// `GET /profiles/{id}`
pub async fn get_one<S: TagStore>(
  State(svc): State<TagService<S>>,
  UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Profile>, ApiError> {
  Ok(Json(svc.get_profile(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UsernameBody {
  pub username: String,
}

/// `PUT /profiles/{id}/cards/{project_id}` — body: `{"username":"ada"}`
pub async fn set_username<S: TagStore>(
  State(svc): State<TagService<S>>,
  Ctx(ctx): Ctx,
  UrlPath((profile_id, project_id)): UrlPath<(Uuid, Uuid)>,
  JsonBody(body): JsonBody<UsernameBody>,
) -> Result<Json<ProfileCard>, ApiError> {
  let card = svc
    .set_username(&ctx, profile_id, project_id, body.username)
    .await?;
  Ok(Json(card))
}
