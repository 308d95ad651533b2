//! Redirect resolution: where a tag's public link currently points.
//!
//! [`resolve`] is a pure function of the tag, its project, the tag's claim
//! history and the relevant profile cards. The tag's *status* gates the
//! result, not its claim history: a claimed-then-disabled tag resolves like
//! an unclaimed one.

use std::fmt;

use serde::Serialize;

use crate::{
  profile::ProfileCard,
  project::{Project, ProjectKind},
  tag::{Tag, TagClaim, TagStatus},
};

/// Rendered form of [`Destination::None`].
pub const NO_DESTINATION: &str = "—";

/// The outcome of resolving a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Destination {
  /// A working link.
  Url(String),
  /// An unresolved template such as `https://x.io/t/{token}`; the literal
  /// braces are part of the value.
  Placeholder(String),
  /// The project has no destination URL.
  None,
}

impl Destination {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Url(s) | Self::Placeholder(s) => s,
      Self::None => NO_DESTINATION,
    }
  }

  pub fn is_link(&self) -> bool { matches!(self, Self::Url(_)) }
}

impl fmt::Display for Destination {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The most recent claim on `tag_id`: greatest `claimed_at`, then greatest
/// `claim_id` among equal timestamps.
pub fn latest_claim(claims: &[TagClaim], tag_id: uuid::Uuid) -> Option<&TagClaim> {
  claims
    .iter()
    .filter(|c| c.tag_id == tag_id)
    .max_by(|a, b| {
      a.claimed_at
        .cmp(&b.claimed_at)
        .then_with(|| a.claim_id.cmp(&b.claim_id))
    })
}

/// Compute the destination for `tag` under `project`.
///
/// `claims` may contain claims of other tags and `cards` may contain cards of
/// other profiles or projects; both are filtered here.
pub fn resolve(
  tag: &Tag,
  project: &Project,
  claims: &[TagClaim],
  cards: &[ProfileCard],
) -> Destination {
  let base = project.destination_url.trim().trim_end_matches('/');
  if base.is_empty() {
    return Destination::None;
  }

  match project.kind {
    ProjectKind::SimpleRedirect => Destination::Url(base.to_owned()),
    ProjectKind::ProfileCard if tag.status == TagStatus::Claimed => {
      let username = latest_claim(claims, tag.tag_id)
        .and_then(|claim| {
          cards.iter().find(|card| {
            card.profile_id == claim.profile_id
              && card.project_id == project.project_id
          })
        })
        .and_then(|card| card.username.as_deref());
      match username {
        Some(username) => Destination::Url(format!("{base}/p/{username}")),
        None => Destination::Placeholder(format!("{base}/p/{{username}}")),
      }
    }
    ProjectKind::ProfileCard | ProjectKind::ExclusiveClub => {
      Destination::Placeholder(format!("{base}/t/{{token}}"))
    }
  }
}
