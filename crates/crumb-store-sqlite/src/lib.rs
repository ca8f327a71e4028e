//! SQLite backend for the Crumb consent store.
//!
//! One SQLite file is one visitor profile. It holds both durable backends
//! the consent store needs: a cookie jar with expiry and scope attributes,
//! and a non-expiring local storage map.

mod encode;
mod schema;
mod scope;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use scope::{CookieScope, SameSite};
pub use store::{CookieJar, LocalStorage, SqliteProfile, StoredCookie};

#[cfg(test)]
mod tests;
