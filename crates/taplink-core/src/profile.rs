//! Profiles (claimants and staff) and their per-project public cards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

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
pub enum ProfileRole {
  Owner,
  Customer,
  Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub profile_id:   Uuid,
  pub role:         ProfileRole,
  pub display_name: String,
  pub email:        String,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::TagStore::add_profile`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
  pub role:         ProfileRole,
  pub display_name: String,
  pub email:        String,
}

/// A profile's public card within one project. The `username` forms the
/// `/p/{username}` link of claimed tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCard {
  pub card_id:    Uuid,
  pub profile_id: Uuid,
  pub project_id: Uuid,
  /// `None` until the claimant picks one.
  pub username:   Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Usernames appear verbatim in URLs: 2–32 characters of `[A-Za-z0-9._-]`.
pub fn validate_username(username: &str) -> Result<()> {
  let len_ok = (2..=32).contains(&username.len());
  let chars_ok = username
    .bytes()
    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
  if len_ok && chars_ok {
    Ok(())
  } else {
    Err(Error::InvalidUsername(username.to_owned()))
  }
}
