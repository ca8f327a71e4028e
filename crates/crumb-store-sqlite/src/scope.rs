//! Attributes that scope the cookie jar's entries.

use serde::Deserialize;

/// Cross-site sending policy of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
  /// Never sent with requests to third-party origins.
  #[default]
  Strict,
  Lax,
  None,
}

/// Scope applied to every entry a [`CookieJar`](crate::CookieJar) writes.
/// Deserialised from the `[cookie_scope]` table of the application config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CookieScope {
  pub path:      String,
  pub same_site: SameSite,
  pub secure:    bool,
}

impl Default for CookieScope {
  fn default() -> Self {
    Self { path: "/".to_owned(), same_site: SameSite::Strict, secure: true }
  }
}
