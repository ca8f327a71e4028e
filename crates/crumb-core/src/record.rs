//! The persisted consent record and the partial choices it is built from.
//!
//! A record is never edited in place. Every save builds a fresh record from
//! [`ConsentChoices`] merged over the defaults, and that record replaces
//! whatever was stored before.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

// ─── Record ──────────────────────────────────────────────────────────────────

/// Which categories a visitor has allowed, as persisted in the expiring
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
  /// Always `true`.
  pub necessary:      bool,
  pub analytics:      bool,
  pub marketing:      bool,
  pub preferences:    bool,
  /// When the record was saved. Audit-only; never consulted for logic.
  pub timestamp:      DateTime<Utc>,
  pub schema_version: String,
}

impl ConsentRecord {
  /// Whether `category` is granted by this record.
  pub fn granted(&self, category: Category) -> bool {
    match category {
      Category::Necessary => true,
      Category::Analytics => self.analytics,
      Category::Marketing => self.marketing,
      Category::Preferences => self.preferences,
    }
  }

  /// The visitor-controlled part of this record, as editable choices.
  pub fn choices(&self) -> ConsentChoices {
    ConsentChoices {
      necessary:   Some(true),
      analytics:   Some(self.analytics),
      marketing:   Some(self.marketing),
      preferences: Some(self.preferences),
    }
  }

  /// Categories this record refuses.
  pub fn refused(&self) -> impl Iterator<Item = Category> + '_ {
    Category::optional().filter(|c| !self.granted(*c))
  }
}

// ─── Choices ─────────────────────────────────────────────────────────────────

/// A partial set of category decisions. Unset fields fall back to the
/// default (refused); `necessary` is forced on regardless of its value here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentChoices {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub necessary:   Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub analytics:   Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub marketing:   Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferences: Option<bool>,
}

impl ConsentChoices {
  /// Every optional category granted.
  pub fn all() -> Self { Self::uniform(true) }

  /// Every optional category refused.
  pub fn necessary_only() -> Self { Self::uniform(false) }

  fn uniform(granted: bool) -> Self {
    Self {
      necessary:   None,
      analytics:   Some(granted),
      marketing:   Some(granted),
      preferences: Some(granted),
    }
  }

  /// Set the decision for a single category.
  pub fn with(mut self, category: Category, granted: bool) -> Self {
    self.set(category, granted);
    self
  }

  pub fn set(&mut self, category: Category, granted: bool) {
    let slot = match category {
      Category::Necessary => &mut self.necessary,
      Category::Analytics => &mut self.analytics,
      Category::Marketing => &mut self.marketing,
      Category::Preferences => &mut self.preferences,
    };
    *slot = Some(granted);
  }

  /// The effective decision for `category` once merged over the defaults.
  pub fn get(&self, category: Category) -> bool {
    match category {
      Category::Necessary => true,
      Category::Analytics => self.analytics.unwrap_or(false),
      Category::Marketing => self.marketing.unwrap_or(false),
      Category::Preferences => self.preferences.unwrap_or(false),
    }
  }

  /// Build a complete record from these choices. `necessary` is always
  /// `true` in the result.
  pub fn into_record(
    self,
    timestamp: DateTime<Utc>,
    schema_version: impl Into<String>,
  ) -> ConsentRecord {
    ConsentRecord {
      necessary: true,
      analytics: self.get(Category::Analytics),
      marketing: self.get(Category::Marketing),
      preferences: self.get(Category::Preferences),
      timestamp,
      schema_version: schema_version.into(),
    }
  }
}
