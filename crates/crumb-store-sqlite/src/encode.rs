//! Encoding and decoding helpers between Rust types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that SQL
//! string comparison orders them chronologically.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{scope::SameSite, store::StoredCookie, Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SameSite ────────────────────────────────────────────────────────────────

pub fn encode_same_site(s: SameSite) -> &'static str {
  match s {
    SameSite::Strict => "strict",
    SameSite::Lax => "lax",
    SameSite::None => "none",
  }
}

pub fn decode_same_site(s: &str) -> Result<SameSite> {
  match s {
    "strict" => Ok(SameSite::Strict),
    "lax" => Ok(SameSite::Lax),
    "none" => Ok(SameSite::None),
    other => Err(Error::UnknownSameSite(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `cookies` row.
pub struct RawCookie {
  pub name:       String,
  pub path:       String,
  pub value:      String,
  pub expires_at: Option<String>,
  pub same_site:  String,
  pub secure:     bool,
  pub updated_at: String,
}

impl RawCookie {
  pub const COLUMNS: &'static str =
    "name, path, value, expires_at, same_site, secure, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:       row.get(0)?,
      path:       row.get(1)?,
      value:      row.get(2)?,
      expires_at: row.get(3)?,
      same_site:  row.get(4)?,
      secure:     row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_cookie(self) -> Result<StoredCookie> {
    Ok(StoredCookie {
      name:       self.name,
      path:       self.path,
      value:      self.value,
      expires_at: self.expires_at.as_deref().map(decode_dt).transpose()?,
      same_site:  decode_same_site(&self.same_site)?,
      secure:     self.secure,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
