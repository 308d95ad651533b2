//! Server-sent change notifications.
//!
//! Each SSE event is named `change` (data: the JSON [`ChangeEvent`]) or
//! `resync` (the subscriber fell behind and should re-fetch everything).

use std::{convert::Infallible, time::Duration};

use axum::{
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use taplink_core::{
  notify::{ChangeEvent, Signal, Subscription},
  service::TagService,
  store::TagStore,
};
use uuid::Uuid;

use crate::extract::UrlPath;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

fn resync() -> Event { Event::default().event("resync").data("resync") }

fn change(event: &ChangeEvent) -> Event {
  match Event::default().event("change").json_data(event) {
    Ok(ev) => ev,
    Err(e) => {
      tracing::warn!(error = %e, "failed to encode change event");
      resync()
    }
  }
}

fn signals(sub: Subscription) -> impl Stream<Item = Result<Event, Infallible>> {
  stream::unfold(sub, |mut sub| async move {
    let event = match sub.recv().await? {
      Signal::Changed(event) => change(&event),
      Signal::Resync => resync(),
    };
    Some((Ok(event), sub))
  })
}

/// `GET /events/projects/{id}`
pub async fn project<S: TagStore>(
  State(svc): State<TagService<S>>,
  UrlPath(project_id): UrlPath<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
  tracing::debug!(%project_id, "project event stream opened");
  let sub = svc.notifier().subscribe_project(project_id);
  Sse::new(signals(sub)).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}

/// `GET /events/claims`
pub async fn claims<S: TagStore>(
  State(svc): State<TagService<S>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
  tracing::debug!("claim event stream opened");
  let sub = svc.notifier().subscribe_claims();
  Sse::new(signals(sub)).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}
