//! [`SqliteStore`] — the SQLite implementation of [`TagStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::{OptionalExtension as _, Row, TransactionBehavior};
use uuid::Uuid;

use taplink_core::{
  profile::{NewProfile, Profile, ProfileCard},
  project::{Asset, NewAsset, NewProject, Project},
  store::{CardUpdate, ClaimCommit, StatusSwap, TagInsert, TagStore},
  tag::{NewTag, Tag, TagClaim, TagStatus},
};

use crate::{
  Error, Result,
  encode::{
    ASSET_COLUMNS, CARD_COLUMNS, CLAIM_COLUMNS, PROFILE_COLUMNS, PROJECT_COLUMNS,
    RawAsset, RawCard, RawClaim, RawProfile, RawProject, RawTag, TAG_COLUMNS,
    decode_enum, encode_dt, encode_enum, encode_uuid,
  },
  schema::SCHEMA,
};

/// Timestamps are stored with microsecond precision; truncate up front so
/// returned values equal what a later read yields.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// The `table.column` list of a UNIQUE violation, if `err` is one.
fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
  match err {
    rusqlite::Error::SqliteFailure(e, Some(msg))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      msg.strip_prefix("UNIQUE constraint failed: ")
    }
    _ => None,
  }
}

/// What happened inside the insert transaction; the `Tag` is built outside.
enum RawInsert {
  Inserted,
  UidTaken,
  PublicIdTaken,
}

enum RawCommit {
  Committed,
  Rejected(String),
  Missing,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Taplink store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema ready");
    Ok(())
  }

  /// Run a single-row query with text parameters.
  async fn fetch_optional<R>(
    &self,
    sql: String,
    params: Vec<String>,
    from_row: fn(&Row<'_>) -> rusqlite::Result<R>,
  ) -> Result<Option<R>>
  where
    R: Send + 'static,
  {
    let row = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(params.iter()), from_row)
            .optional()?,
        )
      })
      .await?;
    Ok(row)
  }

  /// Run a multi-row query with text parameters.
  async fn fetch_all<R>(
    &self,
    sql: String,
    params: Vec<String>,
    from_row: fn(&Row<'_>) -> rusqlite::Result<R>,
  ) -> Result<Vec<R>>
  where
    R: Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

// ─── TagStore impl ───────────────────────────────────────────────────────────

impl TagStore for SqliteStore {
  type Error = Error;

  // ── Projects and assets ───────────────────────────────────────────────────

  async fn add_project(&self, input: NewProject) -> Result<Project> {
    let project = Project {
      project_id:      Uuid::new_v4(),
      name:            input.name,
      kind:            input.kind,
      destination_url: input.destination_url,
      description:     input.description,
      created_at:      now(),
    };

    let id_str      = encode_uuid(project.project_id);
    let name        = project.name.clone();
    let kind_str    = encode_enum(project.kind);
    let url         = project.destination_url.clone();
    let description = project.description.clone();
    let at_str      = encode_dt(project.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (project_id, name, kind, destination_url, description, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, kind_str, url, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(project)
  }

  async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
    self
      .fetch_optional(
        format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1"),
        vec![encode_uuid(id)],
        RawProject::from_row,
      )
      .await?
      .map(RawProject::into_project)
      .transpose()
  }

  async fn add_asset(&self, input: NewAsset) -> Result<Asset> {
    let asset = Asset {
      asset_id:   Uuid::new_v4(),
      project_id: input.project_id,
      name:       input.name,
      kind:       input.kind,
      created_at: now(),
    };

    let id_str         = encode_uuid(asset.asset_id);
    let project_id_str = encode_uuid(asset.project_id);
    let name           = asset.name.clone();
    let kind_str       = encode_enum(asset.kind);
    let at_str         = encode_dt(asset.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assets (asset_id, project_id, name, kind, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, project_id_str, name, kind_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(asset)
  }

  async fn get_asset(&self, id: Uuid) -> Result<Option<Asset>> {
    self
      .fetch_optional(
        format!("SELECT {ASSET_COLUMNS} FROM assets WHERE asset_id = ?1"),
        vec![encode_uuid(id)],
        RawAsset::from_row,
      )
      .await?
      .map(RawAsset::into_asset)
      .transpose()
  }

  async fn list_assets(&self, project_id: Uuid) -> Result<Vec<Asset>> {
    self
      .fetch_all(
        format!(
          "SELECT {ASSET_COLUMNS} FROM assets WHERE project_id = ?1 ORDER BY created_at, asset_id"
        ),
        vec![encode_uuid(project_id)],
        RawAsset::from_row,
      )
      .await?
      .into_iter()
      .map(RawAsset::into_asset)
      .collect()
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn add_profile(&self, input: NewProfile) -> Result<Profile> {
    let profile = Profile {
      profile_id:   Uuid::new_v4(),
      role:         input.role,
      display_name: input.display_name,
      email:        input.email,
      created_at:   now(),
    };

    let id_str   = encode_uuid(profile.profile_id);
    let role_str = encode_enum(profile.role);
    let name     = profile.display_name.clone();
    let email    = profile.email.clone();
    let at_str   = encode_dt(profile.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (profile_id, role, display_name, email, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, role_str, name, email, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(profile)
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    self
      .fetch_optional(
        format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = ?1"),
        vec![encode_uuid(id)],
        RawProfile::from_row,
      )
      .await?
      .map(RawProfile::into_profile)
      .transpose()
  }

  async fn set_username(
    &self,
    profile_id: Uuid,
    project_id: Uuid,
    username:   String,
  ) -> Result<CardUpdate> {
    let card_id_str    = encode_uuid(Uuid::new_v4());
    let profile_id_str = encode_uuid(profile_id);
    let project_id_str = encode_uuid(project_id);
    let at_str         = encode_dt(now());

    let raw: Option<RawCard> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let upsert = tx.execute(
          "INSERT INTO profile_cards (card_id, profile_id, project_id, username, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (profile_id, project_id) DO UPDATE SET username = excluded.username",
          rusqlite::params![card_id_str, profile_id_str, project_id_str, username, at_str],
        );
        if let Err(e) = upsert {
          let taken = unique_violation(&e).is_some_and(|cols| cols.contains("username"));
          return if taken { Ok(None) } else { Err(e.into()) };
        }

        let card = tx.query_row(
          &format!(
            "SELECT {CARD_COLUMNS} FROM profile_cards WHERE profile_id = ?1 AND project_id = ?2"
          ),
          rusqlite::params![profile_id_str, project_id_str],
          RawCard::from_row,
        )?;
        tx.commit()?;
        Ok(Some(card))
      })
      .await?;

    match raw {
      Some(raw) => Ok(CardUpdate::Updated(raw.into_card()?)),
      None => Ok(CardUpdate::UsernameTaken),
    }
  }

  async fn get_profile_card(
    &self,
    profile_id: Uuid,
    project_id: Uuid,
  ) -> Result<Option<ProfileCard>> {
    self
      .fetch_optional(
        format!(
          "SELECT {CARD_COLUMNS} FROM profile_cards WHERE profile_id = ?1 AND project_id = ?2"
        ),
        vec![encode_uuid(profile_id), encode_uuid(project_id)],
        RawCard::from_row,
      )
      .await?
      .map(RawCard::into_card)
      .transpose()
  }

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn insert_tag(&self, input: NewTag) -> Result<TagInsert> {
    let tag = Tag {
      tag_id:     Uuid::new_v4(),
      public_id:  input.public_id,
      nfc_uid:    input.nfc_uid,
      project_id: input.project_id,
      asset_id:   input.asset_id,
      claim_mode: input.claim_mode,
      status:     TagStatus::Active,
      created_at: now(),
    };

    let tag_id_str     = encode_uuid(tag.tag_id);
    let public_id      = tag.public_id.to_string();
    let nfc_uid        = tag.nfc_uid.to_string();
    let project_id_str = encode_uuid(tag.project_id);
    let asset_id_str   = tag.asset_id.map(encode_uuid);
    let mode_str       = encode_enum(tag.claim_mode);
    let status_str     = encode_enum(tag.status);
    let at_str         = encode_dt(tag.created_at);
    let digest         = input.claim_code_digest;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT INTO tags (
             tag_id, public_id, nfc_uid, project_id, asset_id,
             claim_mode, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            tag_id_str,
            public_id,
            nfc_uid,
            project_id_str,
            asset_id_str,
            mode_str,
            status_str,
            at_str,
          ],
        );
        if let Err(e) = inserted {
          let taken = match unique_violation(&e) {
            Some(cols) if cols.contains("tags.nfc_uid") => Some(RawInsert::UidTaken),
            Some(cols) if cols.contains("tags.public_id") => Some(RawInsert::PublicIdTaken),
            _ => None,
          };
          return match taken {
            Some(taken) => Ok(taken),
            None => Err(e.into()),
          };
        }

        if let Some(digest) = digest {
          tx.execute(
            "INSERT INTO claim_codes (tag_id, code_digest) VALUES (?1, ?2)",
            rusqlite::params![tag_id_str, digest],
          )?;
        }
        tx.commit()?;
        Ok(RawInsert::Inserted)
      })
      .await?;

    Ok(match outcome {
      RawInsert::Inserted => TagInsert::Inserted(tag),
      RawInsert::UidTaken => TagInsert::UidTaken,
      RawInsert::PublicIdTaken => TagInsert::PublicIdTaken,
    })
  }

  async fn get_tag(&self, id: Uuid) -> Result<Option<Tag>> {
    self
      .fetch_optional(
        format!("SELECT {TAG_COLUMNS} FROM tags WHERE tag_id = ?1"),
        vec![encode_uuid(id)],
        RawTag::from_row,
      )
      .await?
      .map(RawTag::into_tag)
      .transpose()
  }

  async fn find_tag_by_public_id(&self, public_id: &str) -> Result<Option<Tag>> {
    self
      .fetch_optional(
        format!("SELECT {TAG_COLUMNS} FROM tags WHERE public_id = ?1"),
        vec![public_id.to_owned()],
        RawTag::from_row,
      )
      .await?
      .map(RawTag::into_tag)
      .transpose()
  }

  async fn list_tags(&self, project_id: Uuid) -> Result<Vec<Tag>> {
    self
      .fetch_all(
        format!(
          "SELECT {TAG_COLUMNS} FROM tags WHERE project_id = ?1 ORDER BY created_at, tag_id"
        ),
        vec![encode_uuid(project_id)],
        RawTag::from_row,
      )
      .await?
      .into_iter()
      .map(RawTag::into_tag)
      .collect()
  }

  async fn swap_status(
    &self,
    tag_id: Uuid,
    from:   TagStatus,
    to:     TagStatus,
  ) -> Result<StatusSwap> {
    let id_str   = encode_uuid(tag_id);
    let from_str = encode_enum(from);
    let to_str   = encode_enum(to);

    let (changed, raw): (usize, Option<RawTag>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE tags SET status = ?3 WHERE tag_id = ?1 AND status = ?2",
          rusqlite::params![id_str, from_str, to_str],
        )?;
        let raw = tx
          .query_row(
            &format!("SELECT {TAG_COLUMNS} FROM tags WHERE tag_id = ?1"),
            rusqlite::params![id_str],
            RawTag::from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok((changed, raw))
      })
      .await?;

    Ok(match (changed, raw) {
      (_, None) => StatusSwap::Missing,
      (1, Some(raw)) => StatusSwap::Swapped(raw.into_tag()?),
      (_, Some(raw)) => StatusSwap::Stale(raw.into_tag()?.status),
    })
  }

  async fn claim_code_digest(&self, tag_id: Uuid) -> Result<Option<String>> {
    self
      .fetch_optional(
        "SELECT code_digest FROM claim_codes WHERE tag_id = ?1".to_owned(),
        vec![encode_uuid(tag_id)],
        |row| row.get(0),
      )
      .await
  }

  async fn advance_tap_counter(&self, tag_id: Uuid, counter: u32) -> Result<bool> {
    let id_str = encode_uuid(tag_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO tap_counters (tag_id, last_counter) VALUES (?1, ?2)
           ON CONFLICT (tag_id) DO UPDATE SET last_counter = excluded.last_counter
           WHERE excluded.last_counter > tap_counters.last_counter",
          rusqlite::params![id_str, counter],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  // ── Claims ────────────────────────────────────────────────────────────────

  async fn commit_claim(&self, tag_id: Uuid, profile_id: Uuid) -> Result<ClaimCommit> {
    let claim = TagClaim {
      claim_id: Uuid::new_v4(),
      tag_id,
      profile_id,
      claimed_at: now(),
    };

    let claim_id_str   = encode_uuid(claim.claim_id);
    let tag_id_str     = encode_uuid(tag_id);
    let profile_id_str = encode_uuid(profile_id);
    let at_str         = encode_dt(claim.claimed_at);

    // The status flip is the compare-and-swap; the claim row is written only
    // by the caller whose UPDATE matched.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE tags SET status = 'claimed' WHERE tag_id = ?1 AND status = 'active'",
          rusqlite::params![tag_id_str],
        )?;
        if changed == 0 {
          let status: Option<String> = tx
            .query_row(
              "SELECT status FROM tags WHERE tag_id = ?1",
              rusqlite::params![tag_id_str],
              |row| row.get(0),
            )
            .optional()?;
          return Ok(status.map_or(RawCommit::Missing, RawCommit::Rejected));
        }

        tx.execute(
          "INSERT INTO tag_claims (claim_id, tag_id, profile_id, claimed_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![claim_id_str, tag_id_str, profile_id_str, at_str],
        )?;
        tx.commit()?;
        Ok(RawCommit::Committed)
      })
      .await?;

    match outcome {
      RawCommit::Committed => Ok(ClaimCommit::Committed(claim)),
      RawCommit::Rejected(status) => {
        Ok(ClaimCommit::Rejected(decode_enum("tags.status", &status)?))
      }
      RawCommit::Missing => Ok(ClaimCommit::Missing),
    }
  }

  async fn list_claims(&self, tag_id: Uuid) -> Result<Vec<TagClaim>> {
    self
      .fetch_all(
        format!(
          "SELECT {CLAIM_COLUMNS} FROM tag_claims WHERE tag_id = ?1 ORDER BY claimed_at, claim_id"
        ),
        vec![encode_uuid(tag_id)],
        RawClaim::from_row,
      )
      .await?
      .into_iter()
      .map(RawClaim::into_claim)
      .collect()
  }
}
