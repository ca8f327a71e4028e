//! A prompt surface that reports visibility changes on stderr.

use std::{cell::Cell, fmt};

use crumb_core::PromptHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptView {
  #[default]
  Hidden,
  Banner,
  Settings,
}

impl fmt::Display for PromptView {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Hidden => "hidden",
      Self::Banner => "banner",
      Self::Settings => "settings",
    })
  }
}

/// Tracks what the prompt would be showing; the CLI never draws it.
#[derive(Default)]
pub struct TerminalPrompt {
  view: Cell<PromptView>,
}

impl TerminalPrompt {
  pub fn view(&self) -> PromptView { self.view.get() }

  fn switch(&self, view: PromptView) {
    if self.view.replace(view) != view {
      eprintln!("prompt: {view}");
    }
  }
}

impl PromptHandle for TerminalPrompt {
  fn show(&self) { self.switch(PromptView::Banner) }

  fn hide(&self) { self.switch(PromptView::Hidden) }

  fn show_settings(&self) { self.switch(PromptView::Settings) }
}
