//! Tests for `SqliteProfile` against in-memory and on-disk databases.

use std::rc::Rc;

use chrono::{TimeDelta, Utc};
use crumb_core::{
  backend::KvBackend,
  Category, ConsentChoices, ConsentConfig, ConsentState, ConsentStore,
  PromptController, PromptStatus,
};

use crate::{CookieScope, SameSite, SqliteProfile};

fn profile() -> SqliteProfile {
  SqliteProfile::open_in_memory().expect("in-memory profile")
}

// ─── Cookie jar ──────────────────────────────────────────────────────────────

#[test]
fn cookie_set_get_delete() {
  let jar = profile().cookie_jar(CookieScope::default());

  jar.set("theme", "dark", Some(TimeDelta::days(1))).unwrap();
  assert_eq!(jar.get("theme").unwrap().as_deref(), Some("dark"));

  jar.set("theme", "light", Some(TimeDelta::days(1))).unwrap();
  assert_eq!(jar.get("theme").unwrap().as_deref(), Some("light"));

  jar.delete("theme").unwrap();
  assert_eq!(jar.get("theme").unwrap(), None);
  jar.delete("theme").unwrap();
}

#[test]
fn cookie_records_scope_attributes() {
  let jar = profile().cookie_jar(CookieScope::default());
  let before = Utc::now();
  jar.set("consent_record", "{}", Some(TimeDelta::days(365))).unwrap();

  let cookie = jar.entry("consent_record").unwrap().unwrap();
  assert_eq!(cookie.path, "/");
  assert_eq!(cookie.same_site, SameSite::Strict);
  assert!(cookie.secure);
  let expires_at = cookie.expires_at.unwrap();
  assert!(expires_at > before + TimeDelta::days(364));
  assert!(expires_at <= Utc::now() + TimeDelta::days(365));
}

#[test]
fn expired_cookie_reads_as_absent_until_purged() {
  let p = profile();
  let jar = p.cookie_jar(CookieScope::default());
  jar.set("stale", "1", Some(TimeDelta::seconds(-5))).unwrap();
  jar.set("fresh", "1", Some(TimeDelta::days(1))).unwrap();
  jar.set("forever", "1", None).unwrap();

  assert_eq!(jar.get("stale").unwrap(), None);
  assert!(jar.entry("stale").unwrap().is_some());
  assert_eq!(jar.names().unwrap(), ["forever", "fresh"]);

  assert_eq!(p.purge_expired().unwrap(), 1);
  assert!(jar.entry("stale").unwrap().is_none());
  assert_eq!(p.purge_expired().unwrap(), 0);
}

#[test]
fn overflowing_ttl_is_clamped_to_the_last_encodable_second() {
  let jar = profile().cookie_jar(CookieScope::default());
  let far = TimeDelta::try_days(100_000_000).unwrap();
  jar.set("consent_record", "{}", Some(far)).unwrap();

  assert_eq!(jar.get("consent_record").unwrap().as_deref(), Some("{}"));
  let cookie = jar.entry("consent_record").unwrap().unwrap();
  assert_eq!(
    cookie.expires_at.unwrap().to_rfc3339(),
    "9999-12-31T23:59:59+00:00"
  );
}

#[test]
fn undecodable_rows_are_left_out_of_names() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("profile.sqlite");
  let jar = SqliteProfile::open(&path)
    .unwrap()
    .cookie_jar(CookieScope::default());
  jar.set("session", "1", None).unwrap();

  let raw = rusqlite::Connection::open(&path).unwrap();
  raw
    .execute(
      "INSERT INTO cookies (name, path, value, expires_at, same_site, secure, updated_at)
       VALUES ('broken', '/', 'x', 'not a date', 'sideways', 1, 'never')",
      [],
    )
    .unwrap();

  assert_eq!(jar.names().unwrap(), ["session"]);
  assert!(jar.entry("broken").is_err());
}

#[test]
fn jars_with_different_paths_do_not_share_entries() {
  let p = profile();
  let site = p.cookie_jar(CookieScope::default());
  let blog = p.cookie_jar(CookieScope {
    path: "/blog".into(),
    same_site: SameSite::Lax,
    secure: false,
  });

  site.set("_ga", "site", None).unwrap();
  blog.set("_ga", "blog", None).unwrap();
  site.delete("_ga").unwrap();

  assert_eq!(site.get("_ga").unwrap(), None);
  assert_eq!(blog.get("_ga").unwrap().as_deref(), Some("blog"));
  assert_eq!(blog.entry("_ga").unwrap().unwrap().same_site, SameSite::Lax);
}

// ─── Local storage ───────────────────────────────────────────────────────────

#[test]
fn local_storage_ignores_ttl() {
  let storage = profile().local_storage();
  storage
    .set("consent_prompt_shown", "true", Some(TimeDelta::seconds(-5)))
    .unwrap();
  assert_eq!(
    storage.get("consent_prompt_shown").unwrap().as_deref(),
    Some("true")
  );

  storage.delete("consent_prompt_shown").unwrap();
  assert_eq!(storage.get("consent_prompt_shown").unwrap(), None);
}

#[test]
fn local_storage_and_cookies_are_separate() {
  let p = profile();
  p.local_storage().set("k", "local", None).unwrap();
  assert_eq!(p.cookie_jar(CookieScope::default()).get("k").unwrap(), None);
}

// ─── Consent store over SQLite ───────────────────────────────────────────────

fn open_store(
  p: &SqliteProfile,
) -> ConsentStore<crate::CookieJar, crate::LocalStorage> {
  ConsentStore::open(
    p.cookie_jar(CookieScope::default()),
    p.local_storage(),
    Rc::new(PromptController::new()),
    &ConsentConfig::default(),
  )
}

#[test]
fn consent_is_written_as_camel_case_json() {
  let p = profile();
  let mut store = open_store(&p);
  store.save_custom(ConsentChoices::default().with(Category::Analytics, true));

  let raw = p
    .cookie_jar(CookieScope::default())
    .get("consent_record")
    .unwrap()
    .unwrap();
  let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
  assert_eq!(json["necessary"], true);
  assert_eq!(json["analytics"], true);
  assert_eq!(json["marketing"], false);
  assert_eq!(json["schemaVersion"], "1.0");
  assert!(json["timestamp"].is_string());
}

#[test]
fn accept_necessary_only_removes_tracking_cookies() {
  let p = profile();
  let jar = p.cookie_jar(CookieScope::default());
  for name in ["_ga", "_gid", "_gat", "_fbp", "_fbc", "session"] {
    jar.set(name, "x", Some(TimeDelta::days(30))).unwrap();
  }

  let mut store = open_store(&p);
  store.accept_necessary_only();

  assert_eq!(jar.names().unwrap(), ["consent_record", "session"]);
}

#[test]
fn consent_survives_reopening_the_profile() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("profile.sqlite");

  {
    let p = SqliteProfile::open(&path).unwrap();
    let mut store = open_store(&p);
    assert!(store.should_show_prompt());
    store.save_custom(ConsentChoices::default().with(Category::Preferences, true));
  }

  let p = SqliteProfile::open(&path).unwrap();
  let store = open_store(&p);
  assert!(store.state().is_consented());
  assert!(store.has_consent(Category::Preferences));
  assert!(!store.has_consent(Category::Analytics));
}

#[test]
fn expired_consent_with_shown_flag_is_suppressed() {
  let p = profile();
  let record = ConsentChoices::all().into_record(Utc::now(), "1.0");
  p.cookie_jar(CookieScope::default())
    .set(
      "consent_record",
      &serde_json::to_string(&record).unwrap(),
      Some(TimeDelta::seconds(-1)),
    )
    .unwrap();
  p.local_storage()
    .set("consent_prompt_shown", "true", None)
    .unwrap();

  let store = open_store(&p);

  assert_eq!(
    store.state(),
    &ConsentState::NoConsent(PromptStatus::Suppressed)
  );
}

#[test]
fn revoke_clears_both_backends() {
  let p = profile();
  let mut store = open_store(&p);
  store.accept_all();
  store.revoke();

  assert_eq!(p.cookie_jar(CookieScope::default()).get("consent_record").unwrap(), None);
  assert_eq!(p.local_storage().get("consent_prompt_shown").unwrap(), None);
  assert_eq!(store.state(), &ConsentState::NoConsent(PromptStatus::Due));
}
