//! Error types for `crumb-core`.
//!
//! None of these reach callers of [`ConsentStore`](crate::store::ConsentStore);
//! the store resolves every failure to a well-defined state. They surface
//! from the codec's fallible helpers and from config validation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("schema version mismatch: found {found:?}, expected {expected:?}")]
  SchemaMismatch { found: String, expected: String },

  #[error("storage unavailable")]
  StorageUnavailable,

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
