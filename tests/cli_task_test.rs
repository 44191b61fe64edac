//! Integration tests for task commands via CLI: create, list, toggle,
//! progress, and confirmation-gated delete, including role gating.

use predicates::prelude::*;

mod common;
use common::{TestEnv, stdout_json};

// === Create ===

#[test]
fn test_task_create_assigns_to_teammate() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();

    let output = env
        .td()
        .args([
            "task",
            "create",
            "--name",
            "Write release notes",
            "--description",
            "for the 1.2 release",
            "--assignee",
            &teammate_id,
            "--due",
            "2026-10-01",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["taskName"], "Write release notes");
    assert_eq!(json["assignedTo"], teammate_id.as_str());
    assert_eq!(json["completed"], false);
    assert_eq!(json["progress"], 0);
    assert_eq!(json["dueDate"], "2026-10-01");
    assert!(json["id"].as_str().unwrap().starts_with("td-"));
}

#[test]
fn test_task_create_requires_admin() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    env.login("bob@example.com");

    env.td()
        .args([
            "task",
            "create",
            "--name",
            "sneaky",
            "--description",
            "should not work",
            "--assignee",
            &teammate_id,
            "--due",
            "2026-10-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthorized access"));
}

#[test]
fn test_task_create_rejects_bad_input() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();

    // Empty name
    env.td()
        .args([
            "task", "create", "--name", "", "--description", "d", "--assignee", &teammate_id,
            "--due", "2026-10-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("name"));

    // Malformed due date
    env.td()
        .args([
            "task", "create", "--name", "n", "--description", "d", "--assignee", &teammate_id,
            "--due", "next tuesday",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("due date"));

    // Unknown assignee
    env.td()
        .args([
            "task", "create", "--name", "n", "--description", "d", "--assignee", "uid-missing",
            "--due", "2026-10-01",
        ])
        .assert()
        .failure();
}

#[test]
fn test_task_create_updates_assignment_list() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    let task_id = env.create_task("first", &teammate_id);

    // The teammate's own list shows the new task.
    env.login("bob@example.com");
    let output = env.td().args(["task", "list"]).output().unwrap();
    let json = stdout_json(&output);
    let tasks = json["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], task_id.as_str());
}

// === List scoping ===

#[test]
fn test_task_list_scoped_by_role() {
    let env = TestEnv::new();
    let carol_id = env.signup("carol@example.com", "carol", "teammate");
    let (_admin, bob_id) = env.admin_and_teammate();
    env.create_task("for bob", &bob_id);
    env.create_task("for carol", &carol_id);

    // Admin sees both, with assignee names joined in.
    let output = env.td().args(["task", "list"]).output().unwrap();
    let json = stdout_json(&output);
    let tasks = json["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    let names: Vec<&str> = tasks
        .iter()
        .map(|t| t["assigneeName"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"bob"));
    assert!(names.contains(&"carol"));

    // Bob sees only his own.
    env.login("bob@example.com");
    let output = env.td().args(["task", "list"]).output().unwrap();
    let json = stdout_json(&output);
    let tasks = json["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["taskName"], "for bob");
}

// === Toggle ===

#[test]
fn test_task_toggle_flips_completion_and_progress() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    let task_id = env.create_task("toggle me", &teammate_id);

    let output = env.td().args(["task", "toggle", &task_id]).output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["completed"], true);
    assert_eq!(json["progress"], 100);

    // Toggling back resets progress to zero.
    let output = env.td().args(["task", "toggle", &task_id]).output().unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["completed"], false);
    assert_eq!(json["progress"], 0);
}

#[test]
fn test_task_toggle_requires_admin() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    let task_id = env.create_task("no touching", &teammate_id);

    env.login("bob@example.com");
    env.td()
        .args(["task", "toggle", &task_id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthorized access"));
}

// === Progress ===

#[test]
fn test_task_progress_at_100_completes() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    let task_id = env.create_task("progressive", &teammate_id);

    env.login("bob@example.com");
    let output = env
        .td()
        .args(["task", "progress", &task_id, "40"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["progress"], 40);
    assert_eq!(json["completed"], false);

    let output = env
        .td()
        .args(["task", "progress", &task_id, "100"])
        .output()
        .unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["progress"], 100);
    assert_eq!(json["completed"], true);
}

#[test]
fn test_task_progress_rejects_over_100() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    let task_id = env.create_task("bounded", &teammate_id);

    env.td()
        .args(["task", "progress", &task_id, "101"])
        .assert()
        .failure();
}

#[test]
fn test_teammate_cannot_move_someone_elses_task() {
    let env = TestEnv::new();
    let carol_id = env.signup("carol@example.com", "carol", "teammate");
    let (_admin, _bob_id) = env.admin_and_teammate();
    let task_id = env.create_task("carols task", &carol_id);

    env.login("bob@example.com");
    env.td()
        .args(["task", "progress", &task_id, "50"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthorized access"));
}

// === Delete ===

#[test]
fn test_task_delete_without_yes_leaves_task() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    let task_id = env.create_task("deletable", &teammate_id);

    let output = env.td().args(["task", "delete", &task_id]).output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["deleted"], false);

    // The task is still there.
    let output = env.td().args(["task", "list"]).output().unwrap();
    assert_eq!(stdout_json(&output)["tasks"].as_array().unwrap().len(), 1);
}

#[test]
fn test_task_delete_with_yes_removes_task() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    let task_id = env.create_task("doomed", &teammate_id);

    let output = env
        .td()
        .args(["task", "delete", &task_id, "--yes"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["deleted"], true);

    let output = env.td().args(["task", "list"]).output().unwrap();
    assert_eq!(stdout_json(&output)["tasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_task_delete_requires_admin() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    let task_id = env.create_task("protected", &teammate_id);

    env.login("bob@example.com");
    env.td()
        .args(["task", "delete", &task_id, "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthorized access"));
}

// === Output formats ===

#[test]
fn test_task_list_human_output() {
    let env = TestEnv::new();
    let (_admin, teammate_id) = env.admin_and_teammate();
    env.create_task("readable", &teammate_id);

    env.td()
        .args(["task", "list", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("readable"))
        .stdout(predicate::str::contains("bob"));
}
