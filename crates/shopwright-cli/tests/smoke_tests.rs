//! Smoke tests for the shopwright CLI
//!
//! None of these launch a browser: they cover help output, listing and
//! every path that must fail before Chromium starts.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const VARIABLES: [&str; 5] = [
    "BASE_URL",
    "TEST_EMAIL",
    "TEST_PASSWORD",
    "TEST_USER_NAME",
    "TEST_USER_LASTNAME",
];

/// Command with a clean environment, run from an empty directory so no
/// `.env` is picked up
fn shopwright(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shopwright").expect("shopwright binary should exist");
    cmd.current_dir(dir.path());
    for var in VARIABLES {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

fn with_fixture(cmd: &mut Command) -> &mut Command {
    cmd.env("BASE_URL", "https://demo.shop.test")
        .env("TEST_EMAIL", "fixture.user@example.com")
        .env("TEST_PASSWORD", "FixturePass123")
        .env("TEST_USER_NAME", "Fixture")
        .env("TEST_USER_LASTNAME", "User")
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("check-env"));
}

#[test]
fn test_no_args_fails() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir).assert().failure();
}

#[test]
fn test_run_help_lists_flags() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir)
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--include-unverified"))
        .stdout(predicate::str::contains("--case-timeout-ms"));
}

// ============================================================================
// list
// ============================================================================

#[test]
fn test_list_cases() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir)
        .args(["list", "--suite", "register"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "register: should show error if passwords do not match",
        ))
        .stdout(predicate::str::contains("login:").not());
}

#[test]
fn test_list_unverified() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir)
        .args(["list", "--include-unverified"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[unverified]"));
}

#[test]
fn test_list_locators() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir)
        .args(["list", "--locators"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LoginPage (/login)"))
        .stdout(predicate::str::contains("confirm_password_error"));
}

// ============================================================================
// check-env
// ============================================================================

#[test]
fn test_check_env_reports_every_missing_variable() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir)
        .arg("check-env")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("BASE_URL"))
        .stderr(predicate::str::contains("TEST_USER_LASTNAME"));
}

#[test]
fn test_check_env_blank_counts_as_missing() {
    let dir = TempDir::new().unwrap();
    let mut cmd = shopwright(&dir);
    with_fixture(&mut cmd).env("TEST_PASSWORD", "  ");
    cmd.arg("check-env")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("TEST_PASSWORD"))
        .stderr(predicate::str::contains("BASE_URL").not());
}

#[test]
fn test_check_env_ok() {
    let dir = TempDir::new().unwrap();
    let mut cmd = shopwright(&dir);
    with_fixture(&mut cmd)
        .arg("check-env")
        .assert()
        .success()
        .stdout(predicate::str::contains("environment OK"))
        .stdout(predicate::str::contains("FixturePass123").not());
}

#[test]
fn test_check_env_reads_dotenv() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "BASE_URL=https://demo.shop.test\nTEST_EMAIL=a@example.com\nTEST_PASSWORD=secret1\n\
         TEST_USER_NAME=Ana\nTEST_USER_LASTNAME=Gomez\n",
    )
    .unwrap();
    shopwright(&dir)
        .arg("check-env")
        .assert()
        .success()
        .stdout(predicate::str::contains("a@example.com"));
}

// ============================================================================
// run: failures before any browser starts
// ============================================================================

#[test]
fn test_run_without_fixture_fails_early() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir)
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("BASE_URL"));
}

#[test]
fn test_run_with_unmatched_filter_fails_early() {
    let dir = TempDir::new().unwrap();
    let mut cmd = shopwright(&dir);
    with_fixture(&mut cmd)
        .args(["run", "--filter", "no such case"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no case matches"));
}

#[test]
fn test_run_rejects_unknown_suite() {
    let dir = TempDir::new().unwrap();
    shopwright(&dir)
        .args(["run", "--suite", "checkout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("checkout"));
}
