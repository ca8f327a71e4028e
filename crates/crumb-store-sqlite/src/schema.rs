//! SQL schema for a Crumb profile.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Expiring entries. Expired rows are ignored on read and removed by
-- purge_expired(); nothing deletes them proactively.
CREATE TABLE IF NOT EXISTS cookies (
    name        TEXT    NOT NULL,
    path        TEXT    NOT NULL,
    value       TEXT    NOT NULL,
    expires_at  TEXT,               -- RFC 3339 UTC, fixed width; NULL = never
    same_site   TEXT    NOT NULL,   -- 'strict' | 'lax' | 'none'
    secure      INTEGER NOT NULL,
    updated_at  TEXT    NOT NULL,
    PRIMARY KEY (name, path)
);

-- Non-expiring entries.
CREATE TABLE IF NOT EXISTS local_storage (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS cookies_expires_idx ON cookies(expires_at);

PRAGMA user_version = 1;
";
