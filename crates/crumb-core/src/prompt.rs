//! The single registration slot through which the consent prompt is driven.
//!
//! Whatever renders the prompt registers a [`PromptHandle`] with a
//! [`PromptController`]. The store and any other collaborator (a footer
//! "cookie settings" link, say) then ask the controller to show or hide the
//! prompt without knowing how it is drawn.
//!
//! Only one registrant is held at a time. A second registration replaces the
//! first and logs a warning naming the one it displaced; unregistering with a
//! stale id is a no-op, so a late teardown of the old prompt cannot evict its
//! replacement.

use std::{
  cell::{Cell, RefCell},
  fmt,
  rc::Rc,
};

// ─── Handle ──────────────────────────────────────────────────────────────────

/// Display callbacks implemented by a prompt surface.
pub trait PromptHandle {
  fn show(&self);
  fn hide(&self);
  /// Show the prompt opened on its per-category settings view.
  fn show_settings(&self);
}

/// A [`PromptHandle`] assembled from three closures.
pub struct PromptCallbacks {
  pub show:          Box<dyn Fn()>,
  pub hide:          Box<dyn Fn()>,
  pub show_settings: Box<dyn Fn()>,
}

impl PromptHandle for PromptCallbacks {
  fn show(&self) { (self.show)() }

  fn hide(&self) { (self.hide)() }

  fn show_settings(&self) { (self.show_settings)() }
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Identifies one registration with a [`PromptController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl fmt::Display for RegistrationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "prompt#{}", self.0)
  }
}

struct Registrant {
  id:     RegistrationId,
  handle: Rc<dyn PromptHandle>,
}

/// Routes visibility requests to the currently registered prompt.
#[derive(Default)]
pub struct PromptController {
  slot:    RefCell<Option<Registrant>>,
  next_id: Cell<u64>,
}

impl PromptController {
  pub fn new() -> Self { Self::default() }

  /// Register `handle` as the active prompt, replacing any previous one.
  pub fn register(&self, handle: Rc<dyn PromptHandle>) -> RegistrationId {
    let id = RegistrationId(self.next_id.get());
    self.next_id.set(id.0 + 1);

    let displaced = self.slot.replace(Some(Registrant { id, handle }));
    match displaced {
      Some(previous) => tracing::warn!(
        displaced = %previous.id,
        registered = %id,
        "prompt already registered, replacing it"
      ),
      None => tracing::debug!(registered = %id, "prompt registered"),
    }
    id
  }

  /// Remove the registration `id`. Returns `false` if `id` is no longer the
  /// active registration.
  pub fn unregister(&self, id: RegistrationId) -> bool {
    let mut slot = self.slot.borrow_mut();
    if slot.as_ref().is_some_and(|r| r.id == id) {
      *slot = None;
      tracing::debug!(unregistered = %id, "prompt unregistered");
      true
    } else {
      false
    }
  }

  pub fn is_registered(&self) -> bool { self.slot.borrow().is_some() }

  pub fn request_show(&self) {
    match self.handle() {
      Some(handle) => handle.show(),
      None => tracing::warn!("show requested but no prompt is registered"),
    }
  }

  pub fn request_hide(&self) {
    match self.handle() {
      Some(handle) => handle.hide(),
      None => tracing::debug!("hide requested but no prompt is registered"),
    }
  }

  pub fn request_show_settings(&self) {
    match self.handle() {
      Some(handle) => handle.show_settings(),
      None => {
        tracing::warn!("settings requested but no prompt is registered")
      }
    }
  }

  // The slot borrow is released before the handle runs, so a handle may
  // re-register or unregister from inside its own callback.
  fn handle(&self) -> Option<Rc<dyn PromptHandle>> {
    self.slot.borrow().as_ref().map(|r| Rc::clone(&r.handle))
  }
}


#[cfg(test)]
mod tests {
  use super::{testing::RecordingPrompt, *};

  #[test]
  fn requests_forward_to_the_registrant() {
    let controller = PromptController::new();
    let prompt = Rc::new(RecordingPrompt::default());
    controller.register(prompt.clone());

    controller.request_show();
    controller.request_show_settings();
    controller.request_hide();

    assert_eq!(*prompt.calls.borrow(), ["show", "settings", "hide"]);
  }

  #[test]
  fn requests_without_a_registrant_are_dropped() {
    let controller = PromptController::new();
    controller.request_show();
    controller.request_hide();
    controller.request_show_settings();
    assert!(!controller.is_registered());
  }

  #[test]
  fn last_registration_wins() {
    let controller = PromptController::new();
    let first = Rc::new(RecordingPrompt::default());
    let second = Rc::new(RecordingPrompt::default());

    let first_id = controller.register(first.clone());
    let second_id = controller.register(second.clone());
    controller.request_show();

    assert_ne!(first_id, second_id);
    assert!(first.calls.borrow().is_empty());
    assert_eq!(second.count("show"), 1);
  }

  #[test]
  fn stale_unregister_keeps_the_replacement() {
    let controller = PromptController::new();
    let first_id = controller.register(Rc::new(RecordingPrompt::default()));
    let second_id = controller.register(Rc::new(RecordingPrompt::default()));

    assert!(!controller.unregister(first_id));
    assert!(controller.is_registered());
    assert!(controller.unregister(second_id));
    assert!(!controller.is_registered());
  }

  #[test]
  fn callbacks_triple_is_a_handle() {
    let shown = Rc::new(Cell::new(0));
    let counter = Rc::clone(&shown);
    let controller = PromptController::new();
    controller.register(Rc::new(PromptCallbacks {
      show:          Box::new(move || counter.set(counter.get() + 1)),
      hide:          Box::new(|| {}),
      show_settings: Box::new(|| {}),
    }));

    controller.request_show();
    controller.request_show();

    assert_eq!(shown.get(), 2);
  }
}
