//! Core types and state machine for the Crumb consent preference store.
//!
//! This crate is deliberately free of database and UI dependencies. Durable
//! storage is reached through the [`backend::KvBackend`] trait and the prompt
//! surface through [`prompt::PromptHandle`]; concrete implementations live in
//! other crates (e.g. `crumb-store-sqlite`) or in the calling application.

pub mod backend;
pub mod category;
pub mod cleanup;
pub mod codec;
pub mod config;
pub mod error;
pub mod prompt;
pub mod record;
pub mod store;

pub use category::Category;
pub use config::ConsentConfig;
pub use error::{Error, Result};
pub use prompt::{PromptCallbacks, PromptController, PromptHandle};
pub use record::{ConsentChoices, ConsentRecord};
pub use store::{ConsentState, ConsentStore, PromptStatus, Subscription};
