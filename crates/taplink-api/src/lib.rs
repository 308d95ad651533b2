//! JSON REST API for Taplink.
//!
//! Exposes an axum [`Router`] backed by a [`TagService`] over any
//! [`taplink_core::store::TagStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", taplink_api::api_router(service.clone()))
//! ```

pub mod context;
pub mod error;
pub mod events;
pub mod extract;
pub mod profiles;
pub mod projects;
pub mod public;
pub mod tags;

use axum::{
  Router,
  routing::{get, post, put},
};
use taplink_core::{service::TagService, store::TagStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: TagService<S>) -> Router<()>
where
  S: TagStore + 'static,
{
  Router::new()
    // Projects and assets
    .route("/projects", post(projects::create::<S>))
    .route("/projects/{id}", get(projects::get_one::<S>))
    .route("/projects/{id}/tags", get(projects::list_tags::<S>))
    .route(
      "/projects/{id}/assets",
      get(projects::list_assets::<S>).post(projects::create_asset::<S>),
    )
    // Profiles
    .route("/profiles", post(profiles::create::<S>))
    .route("/profiles/{id}", get(profiles::get_one::<S>))
    .route("/profiles/{id}/cards/{project_id}", put(profiles::set_username::<S>))
    // Tags
    .route("/tags", post(tags::create::<S>))
    .route("/tags/{id}", get(tags::get_one::<S>))
    .route("/tags/{id}/claims", get(tags::list_claims::<S>))
    .route("/tags/{id}/status", post(tags::set_status::<S>))
    // Public tag surface
    .route("/t/{public_id}", get(public::resolve::<S>))
    .route("/t/{public_id}/claim", post(public::claim::<S>))
    // Change notifications
    .route("/events/projects/{id}", get(events::project::<S>))
    .route("/events/claims", get(events::claims::<S>))
    .with_state(service)
}

#[cfg(test)]
mod tests;
