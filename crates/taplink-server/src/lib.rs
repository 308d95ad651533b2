//! Taplink HTTP server: configuration and application wiring.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use taplink_core::{
  ident::DEFAULT_PUBLIC_ID_LEN,
  notify::{ChangeNotifier, DEFAULT_CAPACITY},
  service::{DEFAULT_PUBLIC_ID_ATTEMPTS, ServiceConfig, TagService},
  store::TagStore,
  verify::DigestTapVerifier,
};
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TAPLINK_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub public_id_length:   usize,
  pub public_id_attempts: u32,
  /// Shared secret for [`DigestTapVerifier`]. Unset means secure-tap claims
  /// are always refused.
  pub tap_secret:         Option<String>,
  pub event_capacity:     usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_string(),
      port:               8080,
      store_path:         PathBuf::from("taplink.db"),
      public_id_length:   DEFAULT_PUBLIC_ID_LEN,
      public_id_attempts: DEFAULT_PUBLIC_ID_ATTEMPTS,
      tap_secret:         None,
      event_capacity:     DEFAULT_CAPACITY,
    }
  }
}

impl ServerConfig {
  pub fn service_config(&self) -> ServiceConfig {
    ServiceConfig {
      public_id_length:   self.public_id_length,
      public_id_attempts: self.public_id_attempts,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Wiring ──────────────────────────────────────────────────────────────────

/// Build the [`TagService`] described by `cfg` over `store`.
pub fn service<S: TagStore>(cfg: &ServerConfig, store: S) -> TagService<S> {
  let notifier = ChangeNotifier::new(cfg.event_capacity);
  let service = TagService::new(Arc::new(store), notifier).with_config(cfg.service_config());

  match &cfg.tap_secret {
    Some(secret) if !secret.is_empty() => {
      service.with_tap_verifier(Arc::new(DigestTapVerifier::new(secret.clone())))
    }
    _ => {
      tracing::warn!("no tap_secret configured; secure_tap claims will be refused");
      service
    }
  }
}

/// The full application router with request tracing.
pub fn router<S: TagStore + 'static>(service: TagService<S>) -> Router {
  taplink_api::api_router(service).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use taplink_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn config_defaults_match_service_defaults() {
    let cfg = ServerConfig::default();
    assert_eq!(cfg.service_config(), ServiceConfig::default());
    assert_eq!(cfg.address(), "127.0.0.1:8080");
  }

  #[test]
  fn partial_config_fills_in_defaults() {
    let settings = config::Config::builder()
      .set_override("port", 9000)
      .unwrap()
      .set_override("tap_secret", "s3cret")
      .unwrap()
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.tap_secret.as_deref(), Some("s3cret"));
    assert_eq!(cfg.public_id_length, DEFAULT_PUBLIC_ID_LEN);
  }

  #[tokio::test]
  async fn router_serves_the_api() {
    let cfg = ServerConfig::default();
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = router(service(&cfg, store));

    let resp = app
      .oneshot(Request::builder().uri("/t/unknown1").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
