//! Error type for `crumb-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown same-site policy: {0:?}")]
  UnknownSameSite(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
