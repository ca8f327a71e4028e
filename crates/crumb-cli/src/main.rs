//! `crumb` — inspect and change the consent recorded in a visitor profile.
//!
//! Reads `crumb.toml` (or the path given with `--config`), opens the SQLite
//! profile it names and drives a consent store against it. The prompt is
//! registered as a terminal surface that only reports what it would show.
//!
//! ```
//! crumb status
//! crumb save --analytics
//! crumb check marketing && load-pixel
//! ```

mod prompt;
mod settings;

use std::{path::PathBuf, process::ExitCode, rc::Rc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use crumb_core::{
  Category, ConsentChoices, ConsentState, ConsentStore, PromptController,
  PromptStatus,
};
use crumb_store_sqlite::{CookieJar, LocalStorage, SqliteProfile};
use prompt::TerminalPrompt;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Consent preference store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "crumb.toml")]
  config: PathBuf,

  /// Profile database; overrides `profile_path` from the config file.
  #[arg(long, value_name = "FILE")]
  profile: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Show the current consent state.
  Status,
  /// Exit successfully only if CATEGORY is granted.
  Check {
    #[arg(value_parser = parse_category)]
    category: Category,
  },
  /// Grant every category.
  AcceptAll,
  /// Grant the necessary category only.
  AcceptNecessary,
  /// Save a custom choice; optional categories not listed are refused.
  Save {
    #[arg(long)]
    analytics:   bool,
    #[arg(long)]
    marketing:   bool,
    #[arg(long)]
    preferences: bool,
  },
  /// Forget the recorded consent so the prompt is shown again.
  Revoke,
  /// Open the settings view and print the choices it would start from.
  Settings,
  /// Close the prompt; without consent this accepts necessary only.
  Dismiss,
  /// List the consent categories.
  Categories,
  /// Delete expired cookies from the profile.
  Purge,
}

fn parse_category(name: &str) -> Result<Category, String> {
  Category::lookup(name).ok_or_else(|| {
    let known: Vec<_> = Category::all().map(|c| c.to_string()).collect();
    format!("unknown category {name:?} (expected one of: {})", known.join(", "))
  })
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<ExitCode> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  if let Command::Categories = cli.command {
    print_categories();
    return Ok(ExitCode::SUCCESS);
  }

  let app = settings::load(&cli.config)?;
  let profile_path =
    settings::expand_tilde(cli.profile.as_deref().unwrap_or(&app.profile_path));
  if let Some(parent) = profile_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let profile = SqliteProfile::open(&profile_path)
    .with_context(|| format!("failed to open profile at {profile_path:?}"))?;

  if let Command::Purge = cli.command {
    let removed = profile.purge_expired().context("failed to purge cookies")?;
    println!("removed {removed} expired cookie(s)");
    return Ok(ExitCode::SUCCESS);
  }

  let jar = profile.cookie_jar(app.cookie_scope.clone());
  let controller = Rc::new(PromptController::new());
  let surface = Rc::new(TerminalPrompt::default());
  let registration = controller.register(surface.clone());

  let mut store: ConsentStore<CookieJar, LocalStorage> = ConsentStore::new(
    jar.clone(),
    profile.local_storage(),
    Rc::clone(&controller),
    &app.consent,
  );
  let subscription = store.subscribe(|state| {
    tracing::debug!(?state, "consent state changed");
  });
  store.initialize();

  let code = match cli.command {
    Command::Status => {
      print_status(&store, &jar, &app.consent.record_key, &surface)?;
      ExitCode::SUCCESS
    }
    Command::Check { category } => {
      let granted = store.has_consent(category);
      println!("{category}: {}", if granted { "granted" } else { "refused" });
      if granted { ExitCode::SUCCESS } else { ExitCode::FAILURE }
    }
    Command::AcceptAll => {
      store.accept_all();
      print_state(store.state());
      ExitCode::SUCCESS
    }
    Command::AcceptNecessary => {
      store.accept_necessary_only();
      print_state(store.state());
      ExitCode::SUCCESS
    }
    Command::Save { analytics, marketing, preferences } => {
      store.save_custom(
        ConsentChoices::default()
          .with(Category::Analytics, analytics)
          .with(Category::Marketing, marketing)
          .with(Category::Preferences, preferences),
      );
      print_state(store.state());
      ExitCode::SUCCESS
    }
    Command::Revoke => {
      store.revoke();
      print_state(store.state());
      ExitCode::SUCCESS
    }
    Command::Settings => {
      let draft = store.open_settings();
      for category in Category::all() {
        let mark = if draft.get(category) { "x" } else { " " };
        println!("[{mark}] {category}");
      }
      ExitCode::SUCCESS
    }
    Command::Dismiss => {
      store.dismiss();
      print_state(store.state());
      ExitCode::SUCCESS
    }
    Command::Categories | Command::Purge => ExitCode::SUCCESS,
  };

  subscription.unsubscribe();
  controller.unregister(registration);
  Ok(code)
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_state(state: &ConsentState) {
  match state {
    ConsentState::Uninitialized => println!("state: uninitialized"),
    ConsentState::NoConsent(PromptStatus::Due) => {
      println!("state: no consent (prompt due)")
    }
    ConsentState::NoConsent(PromptStatus::Suppressed) => {
      println!("state: no consent (prompt suppressed)")
    }
    ConsentState::Consented(record) => {
      println!("state: consented at {}", record.timestamp.to_rfc3339());
      for category in Category::all() {
        let status = if record.granted(category) { "granted" } else { "refused" };
        println!("  {category:<12} {status}");
      }
    }
  }
}

fn print_status(
  store: &ConsentStore<CookieJar, LocalStorage>,
  jar: &CookieJar,
  record_key: &str,
  surface: &TerminalPrompt,
) -> anyhow::Result<()> {
  print_state(store.state());

  if let Some(cookie) = jar.entry(record_key).context("failed to read record")? {
    match cookie.expires_at {
      Some(at) => println!("record expires: {}", at.to_rfc3339()),
      None => println!("record expires: never"),
    }
  }
  println!("prompt: {}", surface.view());

  let cookies = jar.names().context("failed to list cookies")?;
  println!("cookies: {}", cookies.join(", "));
  Ok(())
}

fn print_categories() {
  for category in Category::all() {
    let info = category.info();
    let tag = if info.required { " (always on)" } else { "" };
    println!("{category}{tag}: {}", info.title);
    println!("  {}", info.description);
    println!("  e.g. {}", info.examples);
  }
}
