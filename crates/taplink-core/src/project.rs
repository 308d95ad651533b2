//! Projects and the assets that gate access within them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a project's tags resolve. Immutable after creation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectKind {
  /// Claimed tags point at the claimant's public profile card.
  ProfileCard,
  /// Tags point at a per-visit token page handled outside the core.
  ExclusiveClub,
  /// Every tag points at the project's destination URL.
  SimpleRedirect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub project_id:      Uuid,
  pub name:            String,
  pub kind:            ProjectKind,
  /// Base URL used by redirect resolution; may be empty.
  pub destination_url: String,
  pub description:     Option<String>,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::TagStore::add_project`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
  pub name:            String,
  pub kind:            ProjectKind,
  #[serde(default)]
  pub destination_url: String,
  pub description:     Option<String>,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
  Unique,
  Generic,
}

/// A gating resource owned by exactly one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
  pub asset_id:   Uuid,
  pub project_id: Uuid,
  pub name:       String,
  pub kind:       AssetKind,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::TagStore::add_asset`].
#[derive(Debug, Clone)]
pub struct NewAsset {
  pub project_id: Uuid,
  pub name:       String,
  pub kind:       AssetKind,
}
