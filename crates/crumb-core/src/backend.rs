//! The durable key-value abstraction and its in-process implementations.
//!
//! Backends are byte-transparent string maps. They may fail (disabled
//! storage, quota, no storage medium at all); the [`Durable`] wrapper is what
//! the rest of the crate talks to, and it turns every failure into an
//! absent read or a no-op write.

use std::{
  cell::RefCell,
  collections::BTreeMap,
  convert::Infallible,
  rc::Rc,
};

use chrono::{DateTime, TimeDelta, Utc};

use crate::Error;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A string key → string value store.
///
/// Implemented by the in-memory [`MemoryBackend`] and by storage crates such
/// as `crumb-store-sqlite`. Implementations perform no validation of values.
pub trait KvBackend {
  type Error: std::error::Error + 'static;

  /// Return the value stored under `key`, or `None` if it is absent or its
  /// time-to-live has elapsed.
  fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

  /// Store `value` under `key`, replacing any previous value. `ttl = None`
  /// means the entry never expires.
  fn set(
    &self,
    key: &str,
    value: &str,
    ttl: Option<TimeDelta>,
  ) -> Result<(), Self::Error>;

  /// Remove `key`. Removing an absent key succeeds.
  fn delete(&self, key: &str) -> Result<(), Self::Error>;
}

/// 9999-12-31T23:59:59Z, the latest expiry a backend records.
const LATEST_EXPIRY_SECS: i64 = 253_402_300_799;

/// The instant an entry written at `now` with `ttl` expires.
///
/// Never overflows: an expiry past year 9999 is clamped to its last second,
/// and an underflowing negative `ttl` expires the entry at `now`.
pub fn expiry_after(now: DateTime<Utc>, ttl: TimeDelta) -> DateTime<Utc> {
  let latest = DateTime::from_timestamp(LATEST_EXPIRY_SECS, 0)
    .unwrap_or(DateTime::<Utc>::MAX_UTC);
  match now.checked_add_signed(ttl) {
    Some(at) => at.min(latest),
    None if ttl < TimeDelta::zero() => now,
    None => latest,
  }
}

// ─── No-throw wrapper ────────────────────────────────────────────────────────

/// A backend whose operations never fail from the caller's point of view.
pub struct Durable<B> {
  label:   &'static str,
  backend: B,
}

impl<B: KvBackend> Durable<B> {
  /// Wrap `backend`; `label` names it in diagnostics.
  pub fn new(label: &'static str, backend: B) -> Self { Self { label, backend } }

  pub fn get(&self, key: &str) -> Option<String> {
    match self.backend.get(key) {
      Ok(value) => value,
      Err(error) => {
        tracing::warn!(
          backend = self.label,
          key,
          %error,
          "storage unavailable, treating entry as absent"
        );
        None
      }
    }
  }

  pub fn set(&self, key: &str, value: &str, ttl: Option<TimeDelta>) {
    if let Err(error) = self.backend.set(key, value, ttl) {
      tracing::warn!(
        backend = self.label,
        key,
        %error,
        "storage unavailable, write dropped"
      );
    }
  }

  pub fn delete(&self, key: &str) {
    if let Err(error) = self.backend.delete(key) {
      tracing::warn!(
        backend = self.label,
        key,
        %error,
        "storage unavailable, delete dropped"
      );
    }
  }
}

// ─── In-memory backend ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct MemoryEntry {
  value:      String,
  expires_at: Option<DateTime<Utc>>,
}

impl MemoryEntry {
  fn is_live(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_none_or(|at| at > now)
  }
}

/// A process-local backend, used in tests and for sessions without a
/// storage medium.
///
/// Cloning is cheap and clones share the same entries, so a test can keep a
/// handle to inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
  entries: Rc<RefCell<BTreeMap<String, MemoryEntry>>>,
}

impl MemoryBackend {
  pub fn new() -> Self { Self::default() }

  /// Whether a live entry exists for `key`.
  pub fn contains(&self, key: &str) -> bool {
    let now = Utc::now();
    self
      .entries
      .borrow()
      .get(key)
      .is_some_and(|entry| entry.is_live(now))
  }

  /// Keys of all live entries, in sorted order.
  pub fn keys(&self) -> Vec<String> {
    let now = Utc::now();
    self
      .entries
      .borrow()
      .iter()
      .filter(|(_, entry)| entry.is_live(now))
      .map(|(key, _)| key.clone())
      .collect()
  }
}

impl KvBackend for MemoryBackend {
  type Error = Infallible;

  fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
    let now = Utc::now();
    Ok(
      self
        .entries
        .borrow()
        .get(key)
        .filter(|entry| entry.is_live(now))
        .map(|entry| entry.value.clone()),
    )
  }

  fn set(
    &self,
    key: &str,
    value: &str,
    ttl: Option<TimeDelta>,
  ) -> Result<(), Infallible> {
    let entry = MemoryEntry {
      value:      value.to_owned(),
      expires_at: ttl.map(|ttl| expiry_after(Utc::now(), ttl)),
    };
    self.entries.borrow_mut().insert(key.to_owned(), entry);
    Ok(())
  }

  fn delete(&self, key: &str) -> Result<(), Infallible> {
    self.entries.borrow_mut().remove(key);
    Ok(())
  }
}

// ─── Unavailable backend ─────────────────────────────────────────────────────

/// A backend with no storage medium behind it: every operation fails with
/// [`Error::StorageUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl KvBackend for UnavailableBackend {
  type Error = Error;

  fn get(&self, _key: &str) -> Result<Option<String>, Error> {
    Err(Error::StorageUnavailable)
  }

  fn set(
    &self,
    _key: &str,
    _value: &str,
    _ttl: Option<TimeDelta>,
  ) -> Result<(), Error> {
    Err(Error::StorageUnavailable)
  }

  fn delete(&self, _key: &str) -> Result<(), Error> {
    Err(Error::StorageUnavailable)
  }
}
