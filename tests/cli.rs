use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

/// Run the binary against an empty home directory so saved settings never leak in.
fn ledgerlens(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ledgerlens").expect("binary exists");
    cmd.env("HOME", home.path())
        .env_remove("LEDGERLENS_BASE_URL")
        .env_remove("LEDGERLENS_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    ledgerlens(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("review").and(contains("analytics")).and(contains("rules")));
}

#[test]
fn categories_prints_fixed_list() {
    let home = TempDir::new().unwrap();
    ledgerlens(&home)
        .arg("categories")
        .assert()
        .success()
        .stdout(contains("Dining Out").and(contains("Food Delivery")));
}

#[test]
fn guide_prints_steps() {
    let home = TempDir::new().unwrap();
    ledgerlens(&home)
        .arg("guide")
        .assert()
        .success()
        .stdout(contains("Process new statements").and(contains("Review and save")));
}

#[test]
fn config_set_url_is_saved() {
    let home = TempDir::new().unwrap();
    ledgerlens(&home)
        .args(["config", "set-url", "http://ledger.test/webhook/"])
        .assert()
        .success();
    assert!(home.path().join(".config/ledgerlens/settings.json").exists());
    ledgerlens(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("http://ledger.test/webhook"));
}

#[test]
fn config_rejects_bad_url() {
    let home = TempDir::new().unwrap();
    ledgerlens(&home)
        .args(["config", "set-url", "ledger.test"])
        .assert()
        .failure()
        .stderr(contains("Error:"));
}

#[test]
fn base_url_flag_overrides_settings() {
    let home = TempDir::new().unwrap();
    ledgerlens(&home)
        .args(["config", "show", "--base-url", "http://other.test/webhook"])
        .assert()
        .success()
        .stdout(contains("http://other.test/webhook"));
}

#[test]
fn unreachable_backend_fails_cleanly() {
    let home = TempDir::new().unwrap();
    ledgerlens(&home)
        .args(["pending", "--base-url", "http://127.0.0.1:9/webhook"])
        .assert()
        .failure()
        .stderr(contains("Error:"));
}

#[test]
fn categorize_rejects_unknown_category_offline() {
    let home = TempDir::new().unwrap();
    ledgerlens(&home)
        .args(["categorize", "3", "--category", "Nonsense", "--base-url", "http://127.0.0.1:9/webhook"])
        .assert()
        .failure()
        .stderr(contains("Error:"));
}
