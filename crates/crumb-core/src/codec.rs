//! Reading and writing the versioned consent record.
//!
//! The record is stored as compact JSON under a single key of the expiring
//! backend. A record that fails to parse, or that carries a schema version
//! other than the current one, reads back as absent. Neither case erases
//! the stored entry; it stays until the next successful write replaces it.

use chrono::{TimeDelta, Utc};

use crate::{
  backend::{Durable, KvBackend},
  config::ConsentConfig,
  record::ConsentRecord,
  Error, Result,
};

/// Encodes consent records and moves them in and out of a backend.
#[derive(Debug, Clone)]
pub struct ConsentCodec {
  key:     String,
  version: String,
  ttl:     TimeDelta,
}

impl ConsentCodec {
  pub fn new(config: &ConsentConfig) -> Self {
    Self {
      key:     config.record_key.clone(),
      version: config.schema_version.clone(),
      ttl:     config.ttl(),
    }
  }

  pub fn key(&self) -> &str { &self.key }

  pub fn version(&self) -> &str { &self.version }

  pub fn encode(&self, record: &ConsentRecord) -> Result<String> {
    Ok(serde_json::to_string(record)?)
  }

  /// Parse `raw` and check its schema version.
  pub fn try_decode(&self, raw: &str) -> Result<ConsentRecord> {
    let mut record: ConsentRecord = serde_json::from_str(raw)?;
    if record.schema_version != self.version {
      return Err(Error::SchemaMismatch {
        found:    record.schema_version,
        expected: self.version.clone(),
      });
    }
    record.necessary = true;
    Ok(record)
  }

  /// Like [`try_decode`](Self::try_decode), but a corrupt or outdated
  /// record is simply absent.
  pub fn decode(&self, raw: &str) -> Option<ConsentRecord> {
    match self.try_decode(raw) {
      Ok(record) => Some(record),
      Err(Error::SchemaMismatch { found, expected }) => {
        tracing::info!(%found, %expected, "stored consent is outdated, ignoring");
        None
      }
      Err(error) => {
        tracing::warn!(%error, "stored consent is unreadable, ignoring");
        None
      }
    }
  }

  /// Stamp `record` with the current time and schema version and persist it.
  /// Returns the record as written.
  pub fn write<B: KvBackend>(
    &self,
    backend: &Durable<B>,
    mut record: ConsentRecord,
  ) -> ConsentRecord {
    record.timestamp = Utc::now();
    record.schema_version = self.version.clone();
    record.necessary = true;

    match self.encode(&record) {
      Ok(raw) => backend.set(&self.key, &raw, Some(self.ttl)),
      Err(error) => tracing::error!(%error, "failed to encode consent record"),
    }
    record
  }

  pub fn read<B: KvBackend>(&self, backend: &Durable<B>) -> Option<ConsentRecord> {
    let raw = backend.get(&self.key)?;
    self.decode(&raw)
  }

  pub fn erase<B: KvBackend>(&self, backend: &Durable<B>) {
    backend.delete(&self.key);
  }
}
