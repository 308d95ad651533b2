//! SQL schema for the Taplink SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
    project_id      TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    kind            TEXT NOT NULL,   -- 'profile_card' | 'exclusive_club' | 'simple_redirect'
    destination_url TEXT NOT NULL DEFAULT '',
    description     TEXT,
    created_at      TEXT NOT NULL    -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS assets (
    asset_id   TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(project_id),
    name       TEXT NOT NULL,
    kind       TEXT NOT NULL,        -- 'unique' | 'generic'
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    profile_id   TEXT PRIMARY KEY,
    role         TEXT NOT NULL,      -- 'owner' | 'customer' | 'admin'
    display_name TEXT NOT NULL,
    email        TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

-- NULL usernames do not collide under UNIQUE.
CREATE TABLE IF NOT EXISTS profile_cards (
    card_id    TEXT PRIMARY KEY,
    profile_id TEXT NOT NULL REFERENCES profiles(profile_id),
    project_id TEXT NOT NULL REFERENCES projects(project_id),
    username   TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (profile_id, project_id),
    UNIQUE (project_id, username)
);

-- The UNIQUE constraints are the only guard against duplicate chips and
-- duplicate public ids; the application never checks before inserting.
CREATE TABLE IF NOT EXISTS tags (
    tag_id     TEXT PRIMARY KEY,
    public_id  TEXT NOT NULL UNIQUE,
    nfc_uid    TEXT NOT NULL UNIQUE,
    project_id TEXT NOT NULL REFERENCES projects(project_id),
    asset_id   TEXT REFERENCES assets(asset_id),
    claim_mode TEXT NOT NULL,        -- 'code' | 'secure_tap' | 'first_to_claim'
    status     TEXT NOT NULL DEFAULT 'active'
               CHECK (status IN ('active', 'disabled', 'claimed')),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS claim_codes (
    tag_id      TEXT PRIMARY KEY REFERENCES tags(tag_id),
    code_digest TEXT NOT NULL        -- hex SHA-256 of the normalised code
);

-- Highest secure-tap counter accepted per tag; older signatures are replays.
CREATE TABLE IF NOT EXISTS tap_counters (
    tag_id       TEXT PRIMARY KEY REFERENCES tags(tag_id),
    last_counter INTEGER NOT NULL
);

-- Claims are strictly append-only.
CREATE TABLE IF NOT EXISTS tag_claims (
    claim_id   TEXT PRIMARY KEY,
    tag_id     TEXT NOT NULL REFERENCES tags(tag_id),
    profile_id TEXT NOT NULL REFERENCES profiles(profile_id),
    claimed_at TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS tags_asset_same_project
BEFORE INSERT ON tags
WHEN NEW.asset_id IS NOT NULL
 AND (SELECT project_id FROM assets WHERE asset_id = NEW.asset_id) IS NOT NEW.project_id
BEGIN
    SELECT RAISE(ABORT, 'asset belongs to another project');
END;

CREATE TRIGGER IF NOT EXISTS tags_identity_immutable
BEFORE UPDATE OF project_id, claim_mode, nfc_uid, public_id ON tags
BEGIN
    SELECT RAISE(ABORT, 'tag identity columns are immutable');
END;

CREATE TRIGGER IF NOT EXISTS tag_claims_no_update
BEFORE UPDATE ON tag_claims
BEGIN
    SELECT RAISE(ABORT, 'tag_claims is append-only');
END;

CREATE TRIGGER IF NOT EXISTS tag_claims_no_delete
BEFORE DELETE ON tag_claims
BEGIN
    SELECT RAISE(ABORT, 'tag_claims is append-only');
END;

CREATE INDEX IF NOT EXISTS assets_project_idx ON assets(project_id);
CREATE INDEX IF NOT EXISTS tags_project_idx   ON tags(project_id);
CREATE INDEX IF NOT EXISTS claims_tag_idx     ON tag_claims(tag_id, claimed_at);

PRAGMA user_version = 1;
";
