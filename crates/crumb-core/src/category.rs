//! Consent categories and their human-facing catalog entries.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};

/// A class of storage or tracking a visitor can allow or refuse.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Category {
  /// Always granted; cannot be refused.
  Necessary,
  Analytics,
  Marketing,
  Preferences,
}

impl TryFrom<String> for Category {
  type Error = strum::ParseError;

  fn try_from(name: String) -> Result<Self, Self::Error> { name.trim().parse() }
}

/// Static description of a category, suitable for a settings view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
  pub category:    Category,
  pub title:       &'static str,
  pub description: &'static str,
  pub examples:    &'static str,
  /// Whether the visitor is allowed to refuse this category.
  pub required:    bool,
}

impl Category {
  /// Resolve a category by name, ignoring ASCII case.
  pub fn lookup(name: &str) -> Option<Self> {
    Self::try_from(name.to_owned()).ok()
  }

  /// All categories, `necessary` first.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  /// The visitor-controlled categories.
  pub fn optional() -> impl Iterator<Item = Self> {
    Self::iter().filter(|c| !c.is_required())
  }

  pub fn is_required(self) -> bool { matches!(self, Self::Necessary) }

  pub fn info(self) -> CategoryInfo {
    match self {
      Self::Necessary => CategoryInfo {
        category:    self,
        title:       "Necessary",
        description: "Essential for site functionality, security and \
                      remembering this consent choice. Cannot be disabled.",
        examples:    "Session management, security tokens, consent \
                      preferences",
        required:    true,
      },
      Self::Analytics => CategoryInfo {
        category:    self,
        title:       "Analytics",
        description: "Help understand how visitors interact with the site.",
        examples:    "Page views, visitor journey tracking",
        required:    false,
      },
      Self::Marketing => CategoryInfo {
        category:    self,
        title:       "Marketing",
        description: "Used to track visitors across sites and show relevant \
                      advertisements.",
        examples:    "Social media pixels, advertising networks, retargeting",
        required:    false,
      },
      Self::Preferences => CategoryInfo {
        category:    self,
        title:       "Preferences",
        description: "Remember settings that customise the experience.",
        examples:    "Theme, language, layout customisations",
        required:    false,
      },
    }
  }
}
