//! Removal of tracking artifacts owned by refused categories.

use std::collections::BTreeMap;

use crate::{
  backend::{Durable, KvBackend},
  config::ConsentConfig,
  record::ConsentRecord,
  Category,
};

/// The category → artifact table, applied after every save.
#[derive(Debug, Clone)]
pub struct CleanupPolicy {
  artifacts: BTreeMap<Category, Vec<String>>,
}

impl CleanupPolicy {
  /// Build the policy from `config`. Entries for `necessary` are ignored;
  /// that category can never be refused.
  pub fn new(config: &ConsentConfig) -> Self {
    let artifacts = config
      .artifacts
      .iter()
      .filter(|(category, _)| !category.is_required())
      .map(|(category, names)| (*category, names.clone()))
      .collect();
    Self { artifacts }
  }

  /// Artifact names owned by `category`.
  pub fn artifacts(&self, category: Category) -> &[String] {
    self.artifacts.get(&category).map(Vec::as_slice).unwrap_or_default()
  }

  /// Delete every artifact owned by a category `record` refuses. Returns the
  /// names that were deleted.
  pub fn apply<B: KvBackend>(
    &self,
    record: &ConsentRecord,
    backend: &Durable<B>,
  ) -> Vec<String> {
    let mut removed = Vec::new();
    for category in record.refused() {
      for name in self.artifacts(category) {
        backend.delete(name);
        removed.push(name.clone());
      }
    }
    if !removed.is_empty() {
      tracing::debug!(artifacts = ?removed, "removed refused tracking artifacts");
    }
    removed
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeDelta, Utc};

  use super::*;
  use crate::{backend::MemoryBackend, record::ConsentChoices};

  fn planted() -> (MemoryBackend, Durable<MemoryBackend>) {
    let memory = MemoryBackend::new();
    for name in ["_ga", "_gid", "_gat", "_fbp", "_fbc", "session"] {
      memory.set(name, "x", Some(TimeDelta::days(1))).unwrap();
    }
    (memory.clone(), Durable::new("expiring", memory))
  }

  #[test]
  fn refused_categories_lose_their_artifacts() {
    let policy = CleanupPolicy::new(&ConsentConfig::default());
    let (memory, backend) = planted();
    let record = ConsentChoices::default()
      .with(Category::Marketing, true)
      .into_record(Utc::now(), "1.0");

    let removed = policy.apply(&record, &backend);

    assert_eq!(removed, ["_ga", "_gid", "_gat"]);
    assert_eq!(memory.keys(), ["_fbc", "_fbp", "session"]);
  }

  #[test]
  fn apply_is_idempotent() {
    let policy = CleanupPolicy::new(&ConsentConfig::default());
    let (memory, backend) = planted();
    let record = ConsentChoices::necessary_only().into_record(Utc::now(), "1.0");

    policy.apply(&record, &backend);
    policy.apply(&record, &backend);

    assert_eq!(memory.keys(), ["session"]);
  }

  #[test]
  fn necessary_entries_are_never_applied() {
    let mut config = ConsentConfig::default();
    config.artifacts.insert(Category::Necessary, vec!["session".into()]);
    let policy = CleanupPolicy::new(&config);
    let (memory, backend) = planted();

    policy.apply(
      &ConsentChoices::necessary_only().into_record(Utc::now(), "1.0"),
      &backend,
    );

    assert!(policy.artifacts(Category::Necessary).is_empty());
    assert!(memory.contains("session"));
  }
}
