//! Router tests driving the full stack over an in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use taplink_core::{notify::ChangeNotifier, service::TagService};
use taplink_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(TagService::new(Arc::new(store), ChangeNotifier::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn project(app: &Router, kind: &str, url: &str) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/projects",
    Some(json!({ "name": "Launch", "kind": kind, "destination_url": url })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["project_id"].as_str().unwrap().to_owned()
}

async fn profile(app: &Router, name: &str) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/profiles",
    Some(json!({
      "role": "customer",
      "display_name": name,
      "email": format!("{name}@example.com"),
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["profile_id"].as_str().unwrap().to_owned()
}

// ─── Projects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn project_create_and_fetch() {
  let app = app().await;
  let id = project(&app, "simple_redirect", "https://x.io").await;

  let (status, body) = send(&app, "GET", &format!("/projects/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["kind"], "simple_redirect");

  let (status, body) = send(
    &app,
    "GET",
    "/projects/00000000-0000-4000-8000-000000000000",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["code"], "project_not_found");
}

#[tokio::test]
async fn assets_are_created_under_their_project() {
  let app = app().await;
  let id = project(&app, "exclusive_club", "").await;

  let (status, body) = send(
    &app,
    "POST",
    &format!("/projects/{id}/assets"),
    Some(json!({ "name": "Jacket", "kind": "unique" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["project_id"], id.as_str());

  let (_, listed) = send(&app, "GET", &format!("/projects/{id}/assets"), None).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);
}

// ─── Tags ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tag_registration_errors_map_to_statuses() {
  let app = app().await;
  let id = project(&app, "simple_redirect", "").await;

  let (status, body) = send(
    &app,
    "POST",
    "/tags",
    Some(json!({ "project_id": id, "nfc_uid": "::", "claim_mode": "first_to_claim" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "invalid_uid");

  let (status, body) = send(
    &app,
    "POST",
    "/tags",
    Some(json!({ "project_id": id, "nfc_uid": "04a1", "claim_mode": "telepathy" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "unsupported_claim_mode");

  let (status, _) = send(
    &app,
    "POST",
    "/tags",
    Some(json!({ "project_id": id, "nfc_uid": "04a1", "claim_mode": "first_to_claim" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = send(
    &app,
    "POST",
    "/tags",
    Some(json!({ "project_id": id, "nfc_uid": "04:A1", "claim_mode": "first_to_claim" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["code"], "uid_in_use");
}

#[tokio::test]
async fn code_claim_flow() {
  let app = app().await;
  let project_id = project(&app, "simple_redirect", "https://shop.example/").await;
  let profile_id = profile(&app, "ada").await;

  let (status, created) = send(
    &app,
    "POST",
    "/tags",
    Some(json!({
      "project_id": project_id,
      "nfc_uid": "04a1b2c3",
      "claim_mode": "code",
      "claim_code": "SESAME",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["claim_code"], "SESAME");
  let tag_id = created["tag_id"].as_str().unwrap().to_owned();
  let public_id = created["public_id"].as_str().unwrap().to_owned();

  let (status, resolved) = send(&app, "GET", &format!("/t/{public_id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    resolved["destination"],
    json!({ "kind": "url", "target": "https://shop.example" })
  );

  let claim_uri = format!("/t/{public_id}/claim");
  let (status, body) = send(
    &app,
    "POST",
    &claim_uri,
    Some(json!({ "profile_id": profile_id, "proof": { "kind": "code", "code": "nope" } })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["code"], "invalid_claim_code");

  let (status, body) = send(
    &app,
    "POST",
    &claim_uri,
    Some(json!({ "profile_id": profile_id, "proof": { "kind": "code", "code": "sesame" } })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "claimed");

  let (status, body) = send(
    &app,
    "POST",
    &claim_uri,
    Some(json!({ "profile_id": profile_id, "proof": { "kind": "code", "code": "sesame" } })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["code"], "already_claimed");

  let (_, claims) = send(&app, "GET", &format!("/tags/{tag_id}/claims"), None).await;
  assert_eq!(claims.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn status_changes_and_invalid_transitions() {
  let app = app().await;
  let project_id = project(&app, "simple_redirect", "").await;
  let (_, created) = send(
    &app,
    "POST",
    "/tags",
    Some(json!({ "project_id": project_id, "nfc_uid": "0a0b", "claim_mode": "first_to_claim" })),
  )
  .await;
  let tag_id = created["tag_id"].as_str().unwrap().to_owned();
  let uri = format!("/tags/{tag_id}/status");

  let (status, body) = send(&app, "POST", &uri, Some(json!({ "status": "disabled" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "disabled");

  let (status, body) = send(&app, "POST", &uri, Some(json!({ "status": "claimed" }))).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["code"], "invalid_transition");

  let profile_id = profile(&app, "bob").await;
  let public_id = created["public_id"].as_str().unwrap();
  let (status, body) = send(
    &app,
    "POST",
    &format!("/t/{public_id}/claim"),
    Some(json!({ "profile_id": profile_id })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["code"], "tag_disabled");
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
  let app = app().await;
  let project_id = project(&app, "simple_redirect", "").await;
  let (_, created) = send(
    &app,
    "POST",
    "/tags",
    Some(json!({ "project_id": project_id, "nfc_uid": "0c0d", "claim_mode": "first_to_claim" })),
  )
  .await;
  let tag_id = created["tag_id"].as_str().unwrap().to_owned();

  let uri = format!("/tags/{tag_id}/status");
  let (status, body) = send(&app, "POST", &uri, Some(json!({ "status": "bogus" }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["code"], "invalid_body");

  let (status, body) = send(&app, "POST", "/tags", Some(json!({ "nfc_uid": "0c0e" }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["code"], "invalid_body");

  let (status, body) = send(&app, "GET", "/tags/not-a-uuid", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "invalid_path");

  // The tag is untouched by the rejected update.
  let (_, tag) = send(&app, "GET", &format!("/tags/{tag_id}"), None).await;
  assert_eq!(tag["status"], "active");
}

// ─── Public surface ──────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_public_id_is_404() {
  let app = app().await;
  let (status, body) = send(&app, "GET", "/t/doesnotexist", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["code"], "tag_not_found");
}

#[tokio::test]
async fn profile_card_link_follows_username() {
  let app = app().await;
  let project_id = project(&app, "profile_card", "https://cards.example").await;
  let profile_id = profile(&app, "ada").await;
  let (_, created) = send(
    &app,
    "POST",
    "/tags",
    Some(json!({ "project_id": project_id, "nfc_uid": "cafe", "claim_mode": "first_to_claim" })),
  )
  .await;
  let public_id = created["public_id"].as_str().unwrap().to_owned();

  send(
    &app,
    "POST",
    &format!("/t/{public_id}/claim"),
    Some(json!({ "profile_id": profile_id })),
  )
  .await;
  let (status, _) = send(
    &app,
    "PUT",
    &format!("/profiles/{profile_id}/cards/{project_id}"),
    Some(json!({ "username": "ada" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, resolved) = send(&app, "GET", &format!("/t/{public_id}"), None).await;
  assert_eq!(resolved["display"], "https://cards.example/p/ada");
}

#[tokio::test]
async fn event_streams_are_served_as_sse() {
  let app = app().await;
  let resp = app
    .clone()
    .oneshot(Request::builder().uri("/events/claims").body(Body::empty()).unwrap())
    .await
    .unwrap();

  assert_eq!(resp.status(), StatusCode::OK);
  let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
  assert!(content_type.to_str().unwrap().starts_with("text/event-stream"));
}
