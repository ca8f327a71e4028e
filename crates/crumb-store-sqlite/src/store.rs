//! [`SqliteProfile`] and the two [`KvBackend`] views over it.

use std::{path::Path, rc::Rc};

use chrono::{DateTime, TimeDelta, Utc};
use crumb_core::backend::{expiry_after, KvBackend};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  encode::{encode_dt, encode_same_site, RawCookie},
  schema::SCHEMA,
  scope::{CookieScope, SameSite},
  Result,
};

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A visitor profile backed by a single SQLite file.
///
/// Cloning is cheap; clones and the backends handed out share one
/// connection. The profile is single-threaded, like the store it serves.
#[derive(Clone)]
pub struct SqliteProfile {
  conn: Rc<Connection>,
}

impl SqliteProfile {
  /// Open (or create) a profile at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let profile = Self { conn: Rc::new(Connection::open(path)?) };
    profile.init_schema()?;
    Ok(profile)
  }

  /// Open an in-memory profile — useful for testing.
  pub fn open_in_memory() -> Result<Self> {
    let profile = Self { conn: Rc::new(Connection::open_in_memory()?) };
    profile.init_schema()?;
    Ok(profile)
  }

  fn init_schema(&self) -> Result<()> {
    self.conn.execute_batch(SCHEMA)?;
    Ok(())
  }

  /// The expiring backend. Every entry it writes carries `scope`.
  pub fn cookie_jar(&self, scope: CookieScope) -> CookieJar {
    CookieJar { conn: Rc::clone(&self.conn), scope }
  }

  /// The non-expiring backend.
  pub fn local_storage(&self) -> LocalStorage {
    LocalStorage { conn: Rc::clone(&self.conn) }
  }

  /// Physically delete cookies whose expiry has passed. Returns the number
  /// of rows removed.
  pub fn purge_expired(&self) -> Result<usize> {
    let removed = self.conn.execute(
      "DELETE FROM cookies WHERE expires_at IS NOT NULL AND expires_at <= ?1",
      rusqlite::params![encode_dt(Utc::now())],
    )?;
    if removed > 0 {
      tracing::debug!(removed, "purged expired cookies");
    }
    Ok(removed)
  }
}

// ─── Cookie jar ──────────────────────────────────────────────────────────────

/// A cookie row as stored, attributes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
  pub name:       String,
  pub path:       String,
  pub value:      String,
  pub expires_at: Option<DateTime<Utc>>,
  pub same_site:  SameSite,
  pub secure:     bool,
  pub updated_at: DateTime<Utc>,
}

impl StoredCookie {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|at| at <= now)
  }
}

/// Expiring key-value storage over the `cookies` table, restricted to one
/// [`CookieScope`] path.
#[derive(Clone)]
pub struct CookieJar {
  conn:  Rc<Connection>,
  scope: CookieScope,
}

impl CookieJar {
  /// The full row for `name` in this jar's path, expired or not.
  pub fn entry(&self, name: &str) -> Result<Option<StoredCookie>> {
    let sql = format!(
      "SELECT {} FROM cookies WHERE name = ?1 AND path = ?2",
      RawCookie::COLUMNS
    );
    let raw = self
      .conn
      .query_row(
        &sql,
        rusqlite::params![name, self.scope.path],
        RawCookie::from_row,
      )
      .optional()?;
    raw.map(RawCookie::into_cookie).transpose()
  }

  /// Names of the live cookies in this jar's path, sorted. Rows that fail
  /// to decode are skipped.
  pub fn names(&self) -> Result<Vec<String>> {
    let sql = format!(
      "SELECT {} FROM cookies WHERE path = ?1 ORDER BY name",
      RawCookie::COLUMNS
    );
    let mut stmt = self.conn.prepare(&sql)?;
    let raws = stmt
      .query_map(rusqlite::params![self.scope.path], RawCookie::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let now = Utc::now();
    let mut names = Vec::with_capacity(raws.len());
    for raw in raws {
      let name = raw.name.clone();
      match raw.into_cookie() {
        Ok(cookie) if !cookie.is_expired(now) => names.push(cookie.name),
        Ok(_) => {}
        Err(error) => {
          tracing::warn!(%name, %error, "skipping undecodable cookie row");
        }
      }
    }
    Ok(names)
  }
}

impl KvBackend for CookieJar {
  type Error = crate::Error;

  fn get(&self, key: &str) -> Result<Option<String>> {
    let now = Utc::now();
    Ok(
      self
        .entry(key)?
        .filter(|cookie| !cookie.is_expired(now))
        .map(|cookie| cookie.value),
    )
  }

  fn set(&self, key: &str, value: &str, ttl: Option<TimeDelta>) -> Result<()> {
    let now = Utc::now();
    let expires_at = ttl.map(|ttl| encode_dt(expiry_after(now, ttl)));

    self.conn.execute(
      "INSERT INTO cookies (name, path, value, expires_at, same_site, secure, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
       ON CONFLICT (name, path) DO UPDATE SET
         value      = excluded.value,
         expires_at = excluded.expires_at,
         same_site  = excluded.same_site,
         secure     = excluded.secure,
         updated_at = excluded.updated_at",
      rusqlite::params![
        key,
        self.scope.path,
        value,
        expires_at,
        encode_same_site(self.scope.same_site),
        self.scope.secure,
        encode_dt(now),
      ],
    )?;
    Ok(())
  }

  fn delete(&self, key: &str) -> Result<()> {
    self.conn.execute(
      "DELETE FROM cookies WHERE name = ?1 AND path = ?2",
      rusqlite::params![key, self.scope.path],
    )?;
    Ok(())
  }
}

// ─── Local storage ───────────────────────────────────────────────────────────

/// Non-expiring key-value storage over the `local_storage` table.
#[derive(Clone)]
pub struct LocalStorage {
  conn: Rc<Connection>,
}

impl KvBackend for LocalStorage {
  type Error = crate::Error;

  fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(
      self
        .conn
        .query_row(
          "SELECT value FROM local_storage WHERE key = ?1",
          rusqlite::params![key],
          |row| row.get(0),
        )
        .optional()?,
    )
  }

  fn set(&self, key: &str, value: &str, ttl: Option<TimeDelta>) -> Result<()> {
    if ttl.is_some() {
      tracing::debug!(key, "local storage entries never expire, ignoring ttl");
    }
    self.conn.execute(
      "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
       ON CONFLICT (key) DO UPDATE SET
         value      = excluded.value,
         updated_at = excluded.updated_at",
      rusqlite::params![key, value, encode_dt(Utc::now())],
    )?;
    Ok(())
  }

  fn delete(&self, key: &str) -> Result<()> {
    self.conn.execute(
      "DELETE FROM local_storage WHERE key = ?1",
      rusqlite::params![key],
    )?;
    Ok(())
  }
}
