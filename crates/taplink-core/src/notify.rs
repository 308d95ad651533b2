//! Change notifications for dashboards and other observers.
//!
//! Events are invalidation cues, not authoritative payloads: an observer
//! that receives one re-fetches whatever it displays. Delivery is
//! at-least-once with no ordering guarantee, and a subscriber that falls
//! behind receives [`Signal::Resync`] instead of the events it missed.

use serde::Serialize;
use tokio::{
  sync::broadcast::{self, error::RecvError},
  task::JoinHandle,
};
use uuid::Uuid;

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
  /// A tag in this project was created or changed status, or a redirect
  /// target inside the project moved.
  ProjectTagsChanged { project_id: Uuid },
  /// A claim was recorded for this tag.
  ClaimsChanged { tag_id: Uuid },
}

/// What a subscriber observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
  Changed(ChangeEvent),
  /// Events were dropped for this subscriber; re-fetch everything.
  Resync,
}

/// Which events a subscription receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  Project(Uuid),
  /// Every claim, regardless of project.
  Claims,
  All,
}

impl Scope {
  fn matches(&self, event: &ChangeEvent) -> bool {
    match (self, event) {
      (Self::All, _) => true,
      (Self::Project(want), ChangeEvent::ProjectTagsChanged { project_id }) => {
        want == project_id
      }
      (Self::Claims, ChangeEvent::ClaimsChanged { .. }) => true,
      _ => false,
    }
  }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// Fan-out hub. Cloning is cheap; all clones publish to the same channel.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
  tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeNotifier {
  fn default() -> Self { Self::new(DEFAULT_CAPACITY) }
}

impl ChangeNotifier {
  /// `capacity` bounds how far a subscriber may lag before it is resynced.
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  /// Publish an event. Having no subscribers is not an error.
  pub fn publish(&self, event: ChangeEvent) {
    let receivers = self.tx.send(event).unwrap_or(0);
    tracing::trace!(?event, receivers, "change published");
  }

  pub fn project_tags_changed(&self, project_id: Uuid) {
    self.publish(ChangeEvent::ProjectTagsChanged { project_id });
  }

  pub fn claims_changed(&self, tag_id: Uuid) {
    self.publish(ChangeEvent::ClaimsChanged { tag_id });
  }

  pub fn subscribe(&self, scope: Scope) -> Subscription {
    Subscription { rx: self.tx.subscribe(), scope }
  }

  pub fn subscribe_project(&self, project_id: Uuid) -> Subscription {
    self.subscribe(Scope::Project(project_id))
  }

  pub fn subscribe_claims(&self) -> Subscription { self.subscribe(Scope::Claims) }

  /// Invoke `callback` for every signal about `project_id` until the
  /// notifier is dropped or the returned task is aborted.
  pub fn on_project_tags_changed<F>(&self, project_id: Uuid, callback: F) -> JoinHandle<()>
  where
    F: FnMut(Signal) + Send + 'static,
  {
    spawn_callback(self.subscribe_project(project_id), callback)
  }

  /// Invoke `callback` for every claim signal.
  pub fn on_claims_changed<F>(&self, callback: F) -> JoinHandle<()>
  where
    F: FnMut(Signal) + Send + 'static,
  {
    spawn_callback(self.subscribe_claims(), callback)
  }
}

fn spawn_callback<F>(mut sub: Subscription, mut callback: F) -> JoinHandle<()>
where
  F: FnMut(Signal) + Send + 'static,
{
  tokio::spawn(async move {
    while let Some(signal) = sub.recv().await {
      callback(signal);
    }
  })
}

// ─── Subscription ────────────────────────────────────────────────────────────

pub struct Subscription {
  rx:    broadcast::Receiver<ChangeEvent>,
  scope: Scope,
}

impl Subscription {
  /// Wait for the next signal in scope. Returns `None` once every
  /// [`ChangeNotifier`] clone has been dropped.
  pub async fn recv(&mut self) -> Option<Signal> {
    loop {
      match self.rx.recv().await {
        Ok(event) if self.scope.matches(&event) => {
          return Some(Signal::Changed(event));
        }
        Ok(_) => continue,
        Err(RecvError::Lagged(skipped)) => {
          tracing::debug!(skipped, scope = ?self.scope, "subscriber lagged");
          return Some(Signal::Resync);
        }
        Err(RecvError::Closed) => return None,
      }
    }
  }

  pub fn scope(&self) -> Scope { self.scope }
}
