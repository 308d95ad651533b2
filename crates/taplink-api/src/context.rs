//! Extractor building a [`RequestContext`] from request headers.
//!
//! `x-request-id` is honoured when it holds a UUID; otherwise a fresh one is
//! minted. `x-actor-id` names the acting profile, if any.

use std::convert::Infallible;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use taplink_core::context::RequestContext;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Handler argument carrying the per-request [`RequestContext`].
#[derive(Debug, Clone)]
pub struct Ctx(pub RequestContext);

fn uuid_header(headers: &HeaderMap, name: &str) -> Option<Uuid> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

impl<S: Send + Sync> FromRequestParts<S> for Ctx {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let request_id = uuid_header(&parts.headers, REQUEST_ID_HEADER).unwrap_or_else(Uuid::new_v4);
    let actor = uuid_header(&parts.headers, ACTOR_ID_HEADER);
    Ok(Ctx(RequestContext::new(request_id, actor)))
  }
}
