//! [`ConsentStore`] — the in-memory authority over a visitor's consent.
//!
//! The store reads the persisted record once when initialised, decides
//! whether the prompt is due, and from then on owns every transition. Each
//! mutation writes through the codec, runs the cleanup policy, updates the
//! "prompt shown" flag, notifies subscribers and finally asks the prompt
//! controller to show or hide.
//!
//! All mutations take `&mut self`: calls are strictly ordered and a
//! subscriber cannot re-enter the store while it is being notified.

use std::{
  cell::RefCell,
  rc::{Rc, Weak},
};

use chrono::Utc;

use crate::{
  backend::{Durable, KvBackend},
  cleanup::CleanupPolicy,
  codec::ConsentCodec,
  config::ConsentConfig,
  prompt::PromptController,
  record::{ConsentChoices, ConsentRecord},
  Category,
};

const FLAG_SET: &str = "true";

// ─── State ───────────────────────────────────────────────────────────────────

/// Whether a visitor without consent should be shown the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStatus {
  /// The visitor has never interacted with the prompt, or revoked consent.
  Due,
  /// The visitor interacted once but no valid record remains (it expired or
  /// was cleared). The prompt is not surfaced again on its own.
  Suppressed,
}

/// The state of a [`ConsentStore`], as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentState {
  /// Storage has not been read yet.
  Uninitialized,
  NoConsent(PromptStatus),
  Consented(ConsentRecord),
}

impl ConsentState {
  pub fn record(&self) -> Option<&ConsentRecord> {
    match self {
      Self::Consented(record) => Some(record),
      _ => None,
    }
  }

  pub fn is_consented(&self) -> bool { matches!(self, Self::Consented(_)) }

  pub fn prompt_due(&self) -> bool {
    matches!(self, Self::NoConsent(PromptStatus::Due))
  }
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

type Callback = Box<dyn FnMut(&ConsentState)>;

#[derive(Default)]
struct Subscribers {
  next_id:   u64,
  entries:   Vec<(u64, Callback)>,
  notifying: bool,
  /// Ids unsubscribed while their callback was checked out for notification.
  removed:   Vec<u64>,
}

impl Subscribers {
  fn remove(&mut self, id: u64) {
    if let Some(index) = self.entries.iter().position(|(i, _)| *i == id) {
      self.entries.remove(index);
    } else if self.notifying {
      self.removed.push(id);
    }
  }
}

/// Call every subscriber, in subscription order, with `state`.
///
/// Callbacks are taken out of the list while they run, so a callback may
/// subscribe or unsubscribe (itself included) without a double borrow.
fn notify(list: &RefCell<Subscribers>, state: &ConsentState) {
  let mut entries = {
    let mut subscribers = list.borrow_mut();
    subscribers.notifying = true;
    std::mem::take(&mut subscribers.entries)
  };

  for (id, callback) in entries.iter_mut() {
    if list.borrow().removed.contains(id) {
      continue;
    }
    callback(state);
  }

  let mut subscribers = list.borrow_mut();
  let removed = std::mem::take(&mut subscribers.removed);
  entries.retain(|(id, _)| !removed.contains(id));
  let added = std::mem::replace(&mut subscribers.entries, entries);
  subscribers.entries.extend(added);
  subscribers.notifying = false;
}

/// Handle returned by [`ConsentStore::subscribe`].
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe).
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
  id:   u64,
  list: Weak<RefCell<Subscribers>>,
}

impl Subscription {
  /// Stop receiving notifications. A no-op if the store is gone.
  pub fn unsubscribe(self) {
    if let Some(list) = self.list.upgrade() {
      list.borrow_mut().remove(self.id);
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The consent authority for one visitor.
///
/// `E` is the expiring backend holding the record and tracking artifacts;
/// `F` is the non-expiring backend holding the "prompt shown" flag.
pub struct ConsentStore<E: KvBackend, F: KvBackend> {
  expiring:         Durable<E>,
  flags:            Durable<F>,
  codec:            ConsentCodec,
  cleanup:          CleanupPolicy,
  prompt_shown_key: String,
  prompt:           Rc<PromptController>,
  state:            ConsentState,
  subscribers:      Rc<RefCell<Subscribers>>,
}

impl<E: KvBackend, F: KvBackend> ConsentStore<E, F> {
  /// Build an uninitialised store. Nothing is read until
  /// [`initialize`](Self::initialize).
  pub fn new(
    expiring: E,
    flags: F,
    prompt: Rc<PromptController>,
    config: &ConsentConfig,
  ) -> Self {
    Self {
      expiring: Durable::new("expiring", expiring),
      flags: Durable::new("flags", flags),
      codec: ConsentCodec::new(config),
      cleanup: CleanupPolicy::new(config),
      prompt_shown_key: config.prompt_shown_key.clone(),
      prompt,
      state: ConsentState::Uninitialized,
      subscribers: Rc::default(),
    }
  }

  /// Build a store and immediately [`initialize`](Self::initialize) it.
  pub fn open(
    expiring: E,
    flags: F,
    prompt: Rc<PromptController>,
    config: &ConsentConfig,
  ) -> Self {
    let mut store = Self::new(expiring, flags, prompt, config);
    store.initialize();
    store
  }

  /// Read storage and settle into a consented or no-consent state. If the
  /// prompt is due, the registered prompt is asked to show.
  ///
  /// May be called again to pick up changes made by another process or an
  /// expiry that happened while this store was alive.
  pub fn initialize(&mut self) -> &ConsentState {
    let state = match self.codec.read(&self.expiring) {
      Some(record) => ConsentState::Consented(record),
      None if self.prompt_was_shown() => {
        ConsentState::NoConsent(PromptStatus::Suppressed)
      }
      None => ConsentState::NoConsent(PromptStatus::Due),
    };
    tracing::debug!(?state, "consent store initialised");

    self.transition(state);
    if self.state.prompt_due() {
      self.prompt.request_show();
    }
    &self.state
  }

  // ── Queries ─────────────────────────────────────────────────────────────

  pub fn state(&self) -> &ConsentState { &self.state }

  pub fn record(&self) -> Option<&ConsentRecord> { self.state.record() }

  /// Whether `category` is granted. Always `false` without a valid record,
  /// `necessary` included.
  pub fn has_consent(&self, category: Category) -> bool {
    self.record().is_some_and(|record| record.granted(category))
  }

  pub fn should_show_prompt(&self) -> bool { self.state.prompt_due() }

  // ── Mutations ───────────────────────────────────────────────────────────

  /// Save `choices` merged over the defaults, replacing any previous record.
  pub fn save_custom(&mut self, choices: ConsentChoices) -> ConsentRecord {
    if choices.necessary == Some(false) {
      tracing::debug!("necessary category cannot be refused, keeping it");
    }

    let record = choices.into_record(Utc::now(), self.codec.version());
    let record = self.codec.write(&self.expiring, record);
    self.cleanup.apply(&record, &self.expiring);
    self.flags.set(&self.prompt_shown_key, FLAG_SET, None);

    tracing::info!(
      analytics = record.analytics,
      marketing = record.marketing,
      preferences = record.preferences,
      "consent saved"
    );

    self.transition(ConsentState::Consented(record.clone()));
    self.prompt.request_hide();
    record
  }

  pub fn accept_all(&mut self) -> ConsentRecord {
    self.save_custom(ConsentChoices::all())
  }

  pub fn accept_necessary_only(&mut self) -> ConsentRecord {
    self.save_custom(ConsentChoices::necessary_only())
  }

  /// Forget the visitor's consent and surface the prompt again.
  pub fn revoke(&mut self) {
    self.codec.erase(&self.expiring);
    self.flags.delete(&self.prompt_shown_key);
    tracing::info!("consent revoked");

    self.transition(ConsentState::NoConsent(PromptStatus::Due));
    self.prompt.request_show();
  }

  /// Open the prompt on its settings view. Returns the current choices, or
  /// the defaults without consent, as a draft for the settings form.
  pub fn open_settings(&self) -> ConsentChoices {
    let draft = self.record().map(ConsentRecord::choices).unwrap_or_else(|| {
      ConsentChoices::necessary_only().with(Category::Necessary, true)
    });
    self.prompt.request_show_settings();
    draft
  }

  /// Close the prompt. With consent on file this only hides it; without,
  /// closing counts as accepting the necessary category only.
  pub fn dismiss(&mut self) {
    if self.state.is_consented() {
      self.prompt.request_hide();
    } else {
      self.accept_necessary_only();
    }
  }

  // ── Subscriptions ───────────────────────────────────────────────────────

  /// Call `callback` with the new state after every transition.
  pub fn subscribe(
    &self,
    callback: impl FnMut(&ConsentState) + 'static,
  ) -> Subscription {
    let mut subscribers = self.subscribers.borrow_mut();
    let id = subscribers.next_id;
    subscribers.next_id += 1;
    subscribers.entries.push((id, Box::new(callback)));
    Subscription { id, list: Rc::downgrade(&self.subscribers) }
  }

  fn transition(&mut self, state: ConsentState) {
    self.state = state;
    notify(&self.subscribers, &self.state);
  }

  fn prompt_was_shown(&self) -> bool {
    self.flags.get(&self.prompt_shown_key).as_deref() == Some(FLAG_SET)
  }
}
