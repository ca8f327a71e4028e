//! Application configuration, read from `crumb.toml` and `CRUMB_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use crumb_core::ConsentConfig;
use crumb_store_sqlite::CookieScope;
use serde::Deserialize;

/// Runtime configuration. Every field has a default, so an absent config
/// file is not an error.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub profile_path: PathBuf,
  pub consent:      ConsentConfig,
  pub cookie_scope: CookieScope,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      profile_path: PathBuf::from("~/.local/share/crumb/profile.sqlite"),
      consent:      ConsentConfig::default(),
      cookie_scope: CookieScope::default(),
    }
  }
}

/// Load `path` (if it exists) overlaid with the environment, e.g.
/// `CRUMB_PROFILE_PATH` or `CRUMB_CONSENT__TTL_DAYS`.
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("CRUMB")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let app: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")?;
  app
    .consent
    .validate()
    .context("invalid [consent] configuration")?;
  Ok(app)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use crumb_core::Category;
  use crumb_store_sqlite::SameSite;

  use super::*;

  fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn missing_file_yields_defaults() {
    let app = load(Path::new("/nonexistent/crumb.toml")).unwrap();
    assert_eq!(app.consent.record_key, "consent_record");
    assert_eq!(app.cookie_scope, CookieScope::default());
  }

  #[test]
  fn file_overrides_nested_tables() {
    let file = write_config(
      r#"
        profile_path = "/tmp/visitor.sqlite"

        [consent]
        ttl_days = 180

        [consent.artifacts]
        analytics = ["_ga", "_pk_id"]

        [cookie_scope]
        same_site = "lax"
      "#,
    );

    let app = load(file.path()).unwrap();

    assert_eq!(app.profile_path, PathBuf::from("/tmp/visitor.sqlite"));
    assert_eq!(app.consent.ttl_days, 180);
    assert_eq!(app.consent.artifacts[&Category::Analytics], ["_ga", "_pk_id"]);
    assert_eq!(app.cookie_scope.same_site, SameSite::Lax);
    assert_eq!(app.cookie_scope.path, "/");
  }

  #[test]
  fn invalid_consent_config_is_rejected() {
    let file = write_config("[consent]\nttl_days = -1\n");
    assert!(load(file.path()).is_err());

    let file = write_config("[consent]\nttl_days = 200000000\n");
    assert!(load(file.path()).is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/profile.sqlite")),
      PathBuf::from(home).join("profile.sqlite")
    );
    assert_eq!(
      expand_tilde(Path::new("/abs/profile.sqlite")),
      PathBuf::from("/abs/profile.sqlite")
    );
  }
}
