//! Integration tests for signup, login, logout, and session gating via CLI.

use predicates::prelude::*;

mod common;
use common::{TestEnv, stdout_json};

// === Signup ===

#[test]
fn test_signup_creates_account_and_signs_in() {
    let env = TestEnv::new();

    let output = env
        .td()
        .args([
            "signup",
            "--email",
            "alice@example.com",
            "--password",
            "hunter22",
            "--username",
            "alice",
            "--role",
            "admin",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["username"], "alice");
    assert_eq!(json["role"], "admin");
    assert_eq!(json["redirect"], "/admin-dashboard");
    assert!(json["id"].as_str().unwrap().starts_with("uid-"));
}

#[test]
fn test_signup_rejects_unknown_role() {
    let env = TestEnv::new();

    env.td()
        .args([
            "signup",
            "--email",
            "x@example.com",
            "--password",
            "hunter22",
            "--username",
            "x",
            "--role",
            "manager",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown role"));
}

#[test]
fn test_signup_rejects_short_password() {
    let env = TestEnv::new();

    env.td()
        .args([
            "signup",
            "--email",
            "x@example.com",
            "--password",
            "abc",
            "--username",
            "x",
            "--role",
            "teammate",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_signup_rejects_duplicate_email() {
    let env = TestEnv::new();
    env.signup("alice@example.com", "alice", "admin");

    env.td()
        .args([
            "signup",
            "--email",
            "alice@example.com",
            "--password",
            "hunter22",
            "--username",
            "alice2",
            "--role",
            "teammate",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already in use"));
}

// === Login / logout ===

#[test]
fn test_login_redirects_by_role() {
    let env = TestEnv::new();
    env.signup("bob@example.com", "bob", "teammate");
    env.signup("alice@example.com", "alice", "admin");

    let output = env
        .td()
        .args(["login", "--email", "bob@example.com", "--password", "hunter22"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["redirect"], "/teammate-dashboard");

    let output = env
        .td()
        .args(["login", "--email", "alice@example.com", "--password", "hunter22"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["redirect"], "/admin-dashboard");
}

#[test]
fn test_login_wrong_password_fails() {
    let env = TestEnv::new();
    env.signup("alice@example.com", "alice", "admin");

    env.td()
        .args(["login", "--email", "alice@example.com", "--password", "wrongpw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid email or password"));
}

#[test]
fn test_session_persists_across_invocations() {
    let env = TestEnv::new();
    env.signup("alice@example.com", "alice", "admin");

    // A separate invocation restores the session from disk.
    let output = env.td().arg("whoami").output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["state"], "signed_in");
    assert_eq!(json["username"], "alice");
    assert_eq!(json["role"], "admin");
}

#[test]
fn test_logout_clears_session() {
    let env = TestEnv::new();
    env.signup("alice@example.com", "alice", "admin");

    env.td().arg("logout").assert().success();

    let output = env.td().arg("whoami").output().unwrap();
    assert_eq!(stdout_json(&output)["state"], "signed_out");
}

// === Gating ===

#[test]
fn test_protected_commands_require_login() {
    let env = TestEnv::new();

    env.td()
        .arg("dashboard")
        .assert()
        .failure()
        .stderr(predicate::str::contains("td login"));

    env.td()
        .args(["task", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("td login"));

    env.td()
        .args(["project", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("td login"));
}

#[test]
fn test_dashboard_redirects_by_role() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    env.create_task("triage", &teammate_id);

    // Admin sees the admin dashboard with the teammate roster.
    let output = env.td().arg("dashboard").output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["route"], "/admin-dashboard");
    assert_eq!(json["admin"]["teammates"].as_array().unwrap().len(), 1);
    assert_eq!(json["admin"]["tasks"].as_array().unwrap().len(), 1);

    // Teammate gets their own dashboard with a greeting and their tasks.
    env.login("bob@example.com");
    let output = env.td().arg("dashboard").output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["route"], "/teammate-dashboard");
    assert_eq!(json["teammate"]["greeting"], "bob");
    assert_eq!(json["teammate"]["tasks"].as_array().unwrap().len(), 1);
}

#[test]
fn test_human_output_for_whoami() {
    let env = TestEnv::new();
    env.signup("alice@example.com", "alice", "admin");

    env.td()
        .args(["whoami", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as alice"));
}
