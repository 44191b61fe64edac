//! Common test utilities for taskdeck integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/taskdeck/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with an isolated data directory.
///
/// The `td()` method returns a `Command` that sets `TD_DATA_DIR`
/// per-invocation, making tests parallel-safe. The data directory holds
/// the store, credentials, and the session token, so a `login` in one
/// command is visible to the next one in the same env.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an isolated data directory.
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the td binary with isolated data directory.
    pub fn td(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_td"));
        cmd.env("TD_DATA_DIR", self.data_dir.path());
        cmd
    }

    /// Sign up an account and return its principal id. Leaves that
    /// account signed in.
    pub fn signup(&self, email: &str, username: &str, role: &str) -> String {
        let output = self
            .td()
            .args([
                "signup",
                "--email",
                email,
                "--password",
                "hunter22",
                "--username",
                username,
                "--role",
                role,
            ])
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "signup failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        json["id"].as_str().unwrap().to_string()
    }

    /// Sign in as an existing account.
    pub fn login(&self, email: &str) {
        self.td()
            .args(["login", "--email", email, "--password", "hunter22"])
            .assert()
            .success();
    }

    /// Sign up an admin and a teammate, leaving the admin signed in.
    /// Returns (admin_id, teammate_id).
    pub fn admin_and_teammate(&self) -> (String, String) {
        let teammate_id = self.signup("bob@example.com", "bob", "teammate");
        let admin_id = self.signup("alice@example.com", "alice", "admin");
        (admin_id, teammate_id)
    }

    /// Create a task as the currently signed-in admin; returns the task id.
    pub fn create_task(&self, name: &str, assignee: &str) -> String {
        let output = self
            .td()
            .args([
                "task",
                "create",
                "--name",
                name,
                "--description",
                "a test task",
                "--assignee",
                assignee,
                "--due",
                "2026-12-31",
            ])
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "task create failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        json["id"].as_str().unwrap().to_string()
    }
}

/// Parse a command's stdout as JSON.
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|_| {
        panic!(
            "stdout is not JSON: {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}
