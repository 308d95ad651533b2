//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 strings. Enums are stored as their
//! snake_case wire names. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use taplink_core::{
  ident::{PublicId, normalize_uid},
  profile::{Profile, ProfileCard},
  project::{Asset, Project},
  tag::{Tag, TagClaim},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Fixed-width (microseconds, `Z` suffix) so that text order is time order.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The snake_case name of a domain enum (all derive `strum::IntoStaticStr`).
pub fn encode_enum<T: Into<&'static str>>(value: T) -> &'static str { value.into() }

pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PROJECT_COLUMNS: &str =
  "project_id, name, kind, destination_url, description, created_at";

/// Raw strings read directly from a `projects` row.
pub struct RawProject {
  pub project_id:      String,
  pub name:            String,
  pub kind:            String,
  pub destination_url: String,
  pub description:     Option<String>,
  pub created_at:      String,
}

impl RawProject {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      project_id:      row.get(0)?,
      name:            row.get(1)?,
      kind:            row.get(2)?,
      destination_url: row.get(3)?,
      description:     row.get(4)?,
      created_at:      row.get(5)?,
    })
  }

  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id:      decode_uuid(&self.project_id)?,
      name:            self.name,
      kind:            decode_enum("projects.kind", &self.kind)?,
      destination_url: self.destination_url,
      description:     self.description,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub const ASSET_COLUMNS: &str = "asset_id, project_id, name, kind, created_at";

pub struct RawAsset {
  pub asset_id:   String,
  pub project_id: String,
  pub name:       String,
  pub kind:       String,
  pub created_at: String,
}

impl RawAsset {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      asset_id:   row.get(0)?,
      project_id: row.get(1)?,
      name:       row.get(2)?,
      kind:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_asset(self) -> Result<Asset> {
    Ok(Asset {
      asset_id:   decode_uuid(&self.asset_id)?,
      project_id: decode_uuid(&self.project_id)?,
      name:       self.name,
      kind:       decode_enum("assets.kind", &self.kind)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const PROFILE_COLUMNS: &str = "profile_id, role, display_name, email, created_at";

pub struct RawProfile {
  pub profile_id:   String,
  pub role:         String,
  pub display_name: String,
  pub email:        String,
  pub created_at:   String,
}

impl RawProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:   row.get(0)?,
      role:         row.get(1)?,
      display_name: row.get(2)?,
      email:        row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      profile_id:   decode_uuid(&self.profile_id)?,
      role:         decode_enum("profiles.role", &self.role)?,
      display_name: self.display_name,
      email:        self.email,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const CARD_COLUMNS: &str = "card_id, profile_id, project_id, username, created_at";

pub struct RawCard {
  pub card_id:    String,
  pub profile_id: String,
  pub project_id: String,
  pub username:   Option<String>,
  pub created_at: String,
}

impl RawCard {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      card_id:    row.get(0)?,
      profile_id: row.get(1)?,
      project_id: row.get(2)?,
      username:   row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_card(self) -> Result<ProfileCard> {
    Ok(ProfileCard {
      card_id:    decode_uuid(&self.card_id)?,
      profile_id: decode_uuid(&self.profile_id)?,
      project_id: decode_uuid(&self.project_id)?,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const TAG_COLUMNS: &str =
  "tag_id, public_id, nfc_uid, project_id, asset_id, claim_mode, status, created_at";

/// Raw strings read directly from a `tags` row.
pub struct RawTag {
  pub tag_id:     String,
  pub public_id:  String,
  pub nfc_uid:    String,
  pub project_id: String,
  pub asset_id:   Option<String>,
  pub claim_mode: String,
  pub status:     String,
  pub created_at: String,
}

impl RawTag {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tag_id:     row.get(0)?,
      public_id:  row.get(1)?,
      nfc_uid:    row.get(2)?,
      project_id: row.get(3)?,
      asset_id:   row.get(4)?,
      claim_mode: row.get(5)?,
      status:     row.get(6)?,
      created_at: row.get(7)?,
    })
  }

  pub fn into_tag(self) -> Result<Tag> {
    let public_id = PublicId::parse(self.public_id.as_str()).map_err(|_| Error::Decode {
      column: "tags.public_id",
      value:  self.public_id.clone(),
    })?;
    let nfc_uid = normalize_uid(&self.nfc_uid).map_err(|_| Error::Decode {
      column: "tags.nfc_uid",
      value:  self.nfc_uid.clone(),
    })?;

    Ok(Tag {
      tag_id: decode_uuid(&self.tag_id)?,
      public_id,
      nfc_uid,
      project_id: decode_uuid(&self.project_id)?,
      asset_id: self.asset_id.as_deref().map(decode_uuid).transpose()?,
      claim_mode: decode_enum("tags.claim_mode", &self.claim_mode)?,
      status: decode_enum("tags.status", &self.status)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const CLAIM_COLUMNS: &str = "claim_id, tag_id, profile_id, claimed_at";

pub struct RawClaim {
  pub claim_id:   String,
  pub tag_id:     String,
  pub profile_id: String,
  pub claimed_at: String,
}

impl RawClaim {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      claim_id:   row.get(0)?,
      tag_id:     row.get(1)?,
      profile_id: row.get(2)?,
      claimed_at: row.get(3)?,
    })
  }

  pub fn into_claim(self) -> Result<TagClaim> {
    Ok(TagClaim {
      claim_id:   decode_uuid(&self.claim_id)?,
      tag_id:     decode_uuid(&self.tag_id)?,
      profile_id: decode_uuid(&self.profile_id)?,
      claimed_at: decode_dt(&self.claimed_at)?,
    })
  }
}
