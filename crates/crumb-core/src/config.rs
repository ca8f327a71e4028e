//! Runtime configuration for the consent store.

use std::collections::BTreeMap;

use chrono::TimeDelta;
use serde::Deserialize;

use crate::{Category, Error, Result};

/// Key of the consent record in the expiring backend.
pub const DEFAULT_RECORD_KEY: &str = "consent_record";
/// Key of the "prompt already shown" flag in the non-expiring backend.
pub const DEFAULT_PROMPT_SHOWN_KEY: &str = "consent_prompt_shown";
/// Schema version stamped on every record this build writes.
pub const SCHEMA_VERSION: &str = "1.0";
pub const DEFAULT_TTL_DAYS: i64 = 365;
/// Upper bound on `ttl_days`: one hundred years.
pub const MAX_TTL_DAYS: i64 = 36_500;

/// Tunables for the codec and cleanup policy, deserialised from the
/// `[consent]` table of the application config. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
  pub record_key:       String,
  pub prompt_shown_key: String,
  pub schema_version:   String,
  pub ttl_days:         i64,
  /// Tracking artifacts removed when their owning category is refused.
  pub artifacts:        BTreeMap<Category, Vec<String>>,
}

impl Default for ConsentConfig {
  fn default() -> Self {
    Self {
      record_key:       DEFAULT_RECORD_KEY.to_owned(),
      prompt_shown_key: DEFAULT_PROMPT_SHOWN_KEY.to_owned(),
      schema_version:   SCHEMA_VERSION.to_owned(),
      ttl_days:         DEFAULT_TTL_DAYS,
      artifacts:        default_artifacts(),
    }
  }
}

/// The built-in category → artifact table.
pub fn default_artifacts() -> BTreeMap<Category, Vec<String>> {
  let owned = |names: &[&str]| names.iter().map(|n| (*n).to_owned()).collect();
  BTreeMap::from([
    (Category::Analytics, owned(&["_ga", "_gid", "_gat"])),
    (Category::Marketing, owned(&["_fbp", "_fbc"])),
    (Category::Preferences, Vec::new()),
  ])
}

impl ConsentConfig {
  /// The record lifetime, clamped to `1..=MAX_TTL_DAYS` days so an
  /// unvalidated config still yields a representable duration.
  pub fn ttl(&self) -> TimeDelta {
    let days = self.ttl_days.clamp(1, MAX_TTL_DAYS);
    TimeDelta::try_days(days).unwrap_or(TimeDelta::days(DEFAULT_TTL_DAYS))
  }

  /// Reject configurations the store cannot honour.
  pub fn validate(&self) -> Result<()> {
    if !(1..=MAX_TTL_DAYS).contains(&self.ttl_days) {
      return Err(Error::InvalidConfig(format!(
        "ttl_days must be between 1 and {MAX_TTL_DAYS}, got {}",
        self.ttl_days
      )));
    }
    if self.record_key.is_empty() || self.prompt_shown_key.is_empty() {
      return Err(Error::InvalidConfig("storage keys must not be empty".into()));
    }
    if self.record_key == self.prompt_shown_key {
      return Err(Error::InvalidConfig(
        "record_key and prompt_shown_key must differ".into(),
      ));
    }
    if self.schema_version.is_empty() {
      return Err(Error::InvalidConfig("schema_version must not be empty".into()));
    }
    if self
      .artifacts
      .get(&Category::Necessary)
      .is_some_and(|names| !names.is_empty())
    {
      return Err(Error::InvalidConfig(
        "the necessary category cannot own artifacts".into(),
      ));
    }
    if let Some(name) = self
      .artifacts
      .values()
      .flatten()
      .find(|name| **name == self.record_key)
    {
      return Err(Error::InvalidConfig(format!(
        "artifact {name:?} would delete the consent record"
      )));
    }
    Ok(())
  }
}
