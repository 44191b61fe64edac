//! Read-only view models joining live snapshots with user records.
//!
//! Views tolerate foreign-key misses: a referenced user that is deleted
//! or not yet loaded renders as a placeholder, never a failed view. Boards
//! track the sequence of the last applied snapshot and refuse to go
//! backwards, which is what makes slow join hydration safe.

use std::collections::HashMap;

use serde::Serialize;

use crate::auth::Principal;
use crate::live::{Snapshot, hydrate_usernames};
use crate::models::{PROJECTS, Project, Role, TASKS, Task, USERS, UserRecord};
use crate::store::{DocumentStore, Predicate};
use crate::Result;

/// Placeholder for a task assignee with no resolvable user record.
pub const UNKNOWN_USER: &str = "Unknown User";
/// Placeholder for a project teammate with no resolvable user record.
pub const UNNAMED_USER: &str = "Unnamed User";

/// One task joined with its assignee's username.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    #[serde(flatten)]
    pub task: Task,
    pub assignee_name: String,
}

/// Live task list with joined usernames.
#[derive(Debug, Default, Serialize)]
pub struct TaskBoard {
    pub rows: Vec<TaskRow>,
    /// Sequence of the applied snapshot; `None` until the first apply
    pub last_seq: Option<u64>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the board with a snapshot's contents.
    ///
    /// Returns `false` without touching the board if the snapshot is not
    /// newer than what is already applied: the last-snapshot-wins check
    /// that keeps a late-resolving join from clobbering newer state.
    pub fn apply(&mut self, snapshot: &Snapshot, names: &HashMap<String, String>) -> Result<bool> {
        if self.last_seq.is_some_and(|applied| snapshot.seq <= applied) {
            return Ok(false);
        }
        let tasks: Vec<Task> = snapshot.decode()?;
        self.rows = tasks
            .into_iter()
            .map(|task| {
                let assignee_name = names
                    .get(&task.assigned_to)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER.to_string());
                TaskRow { task, assignee_name }
            })
            .collect();
        self.last_seq = Some(snapshot.seq);
        Ok(true)
    }

    /// Hydrate usernames for a snapshot (one batched read) and apply it.
    pub async fn apply_joined<S: DocumentStore>(
        &mut self,
        store: &S,
        snapshot: &Snapshot,
    ) -> Result<bool> {
        let tasks: Vec<Task> = snapshot.decode()?;
        let names =
            hydrate_usernames(store, tasks.iter().map(|t| t.assigned_to.as_str())).await?;
        self.apply(snapshot, &names)
    }
}

/// One project joined with its teammates' usernames, in roster order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRow {
    #[serde(flatten)]
    pub project: Project,
    pub teammate_names: Vec<String>,
}

/// Load the project list with joined teammate names (pull-on-mount).
pub async fn project_board<S: DocumentStore>(store: &S) -> Result<Vec<ProjectRow>> {
    let documents = store.query(PROJECTS, &Predicate::All).await?;
    let projects: Vec<Project> = documents.iter().map(|d| d.decode()).collect::<Result<_>>()?;

    let names = hydrate_usernames(
        store,
        projects.iter().flat_map(|p| p.teammates.iter().map(String::as_str)),
    )
    .await?;

    Ok(projects
        .into_iter()
        .map(|project| {
            let teammate_names = project
                .teammates
                .iter()
                .map(|id| {
                    names
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| UNNAMED_USER.to_string())
                })
                .collect();
            ProjectRow { project, teammate_names }
        })
        .collect())
}

/// Admin dashboard: the full task list plus the teammate roster.
///
/// Tasks come from a one-shot query here (the CLI re-mounts per command);
/// a long-lived consumer feeds the same `TaskBoard` from a `LiveQuery`.
#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub tasks: Vec<TaskRow>,
    pub teammates: Vec<UserRecord>,
}

impl AdminDashboard {
    pub async fn load<S: DocumentStore>(store: &S) -> Result<Self> {
        let teammates: Vec<UserRecord> = store
            .query(USERS, &Predicate::field_equals("role", "teammate"))
            .await?
            .iter()
            .map(|d| d.decode())
            .collect::<Result<_>>()?;

        let documents = store.query(TASKS, &Predicate::All).await?;
        let tasks: Vec<Task> = documents.iter().map(|d| d.decode()).collect::<Result<_>>()?;
        let names: HashMap<String, String> = teammates
            .iter()
            .map(|t| (t.id.clone(), t.username.clone()))
            .collect();

        let tasks = tasks
            .into_iter()
            .map(|task| {
                let assignee_name = names
                    .get(&task.assigned_to)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER.to_string());
                TaskRow { task, assignee_name }
            })
            .collect();

        Ok(Self { tasks, teammates })
    }
}

/// Teammate dashboard: a greeting plus the principal's own tasks.
#[derive(Debug, Serialize)]
pub struct TeammateDashboard {
    pub greeting: String,
    pub tasks: Vec<TaskRow>,
}

impl TeammateDashboard {
    pub async fn load<S: DocumentStore>(store: &S, principal: &Principal) -> Result<Self> {
        let greeting = principal
            .display_name
            .clone()
            .unwrap_or_else(|| "Teammate".to_string());

        let documents = store
            .query(
                TASKS,
                &Predicate::field_equals("assignedTo", principal.id.as_str()),
            )
            .await?;
        let tasks: Vec<Task> = documents.iter().map(|d| d.decode()).collect::<Result<_>>()?;
        let name = principal
            .display_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        let tasks = tasks
            .into_iter()
            .map(|task| TaskRow {
                task,
                assignee_name: name.clone(),
            })
            .collect();

        Ok(Self { greeting, tasks })
    }
}

/// Scope for a role-dependent task query: admins see everything,
/// teammates see their own assignments.
pub fn task_scope(role: Role, principal: &Principal) -> Predicate {
    match role {
        Role::Admin => Predicate::All,
        Role::Teammate => Predicate::field_equals("assignedTo", principal.id.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, doc_body};
    use crate::test_utils::TestEnv;
    use serde_json::json;

    fn snapshot(seq: u64, docs: Vec<Document>) -> Snapshot {
        Snapshot { seq, documents: docs }
    }

    fn task_doc(id: &str, assignee: &str) -> Document {
        Document {
            id: id.to_string(),
            data: json!({
                "taskName": "Write report",
                "description": "Quarterly numbers",
                "assignedTo": assignee,
                "completed": false,
                "progress": 0,
            }),
        }
    }

    #[test]
    fn missing_assignee_renders_placeholder() {
        let mut board = TaskBoard::new();
        let names = HashMap::new();
        let applied = board
            .apply(&snapshot(0, vec![task_doc("td-1", "ghost")]), &names)
            .unwrap();
        assert!(applied);
        assert_eq!(board.rows[0].assignee_name, UNKNOWN_USER);
    }

    #[test]
    fn stale_snapshot_is_rejected() {
        let mut board = TaskBoard::new();
        let mut names = HashMap::new();
        names.insert("u1".to_string(), "alice".to_string());

        board
            .apply(&snapshot(2, vec![task_doc("td-2", "u1")]), &names)
            .unwrap();
        assert_eq!(board.rows.len(), 1);

        // A snapshot from before the applied one must not clobber it.
        let applied = board
            .apply(
                &snapshot(1, vec![task_doc("td-1", "u1"), task_doc("td-0", "u1")]),
                &names,
            )
            .unwrap();
        assert!(!applied);
        assert_eq!(board.rows.len(), 1);
        assert_eq!(board.rows[0].task.id, "td-2");
        assert_eq!(board.last_seq, Some(2));
    }

    #[test]
    fn each_snapshot_replaces_the_whole_board() {
        let mut board = TaskBoard::new();
        let names = HashMap::new();
        board
            .apply(&snapshot(0, vec![task_doc("td-1", "u1")]), &names)
            .unwrap();
        board
            .apply(&snapshot(1, vec![task_doc("td-9", "u2")]), &names)
            .unwrap();
        assert_eq!(board.rows.len(), 1);
        assert_eq!(board.rows[0].task.id, "td-9");
    }

    #[tokio::test]
    async fn admin_dashboard_joins_teammate_names() {
        let env = TestEnv::new();
        let store = env.store();
        let alice = UserRecord::new("u1".into(), "alice".into(), "a@x".into(), Role::Teammate);
        store.put(USERS, "u1", doc_body(&alice).unwrap()).await.unwrap();
        store
            .put(TASKS, "td-1", task_doc("td-1", "u1").data)
            .await
            .unwrap();
        store
            .put(TASKS, "td-2", task_doc("td-2", "gone").data)
            .await
            .unwrap();

        let dashboard = AdminDashboard::load(&store).await.unwrap();
        assert_eq!(dashboard.teammates.len(), 1);
        assert_eq!(dashboard.tasks.len(), 2);
        assert_eq!(dashboard.tasks[0].assignee_name, "alice");
        assert_eq!(dashboard.tasks[1].assignee_name, UNKNOWN_USER);
    }

    #[tokio::test]
    async fn teammate_dashboard_scopes_to_own_tasks() {
        let env = TestEnv::new();
        let store = env.store();
        store
            .put(TASKS, "td-1", task_doc("td-1", "u1").data)
            .await
            .unwrap();
        store
            .put(TASKS, "td-2", task_doc("td-2", "u2").data)
            .await
            .unwrap();

        let principal = Principal {
            id: "u1".to_string(),
            display_name: Some("alice".to_string()),
            email: None,
        };
        let dashboard = TeammateDashboard::load(&store, &principal).await.unwrap();
        assert_eq!(dashboard.greeting, "alice");
        assert_eq!(dashboard.tasks.len(), 1);
        assert_eq!(dashboard.tasks[0].task.id, "td-1");
    }

    #[tokio::test]
    async fn project_board_substitutes_unnamed_user() {
        let env = TestEnv::new();
        let store = env.store();
        let alice = UserRecord::new("u1".into(), "alice".into(), "a@x".into(), Role::Teammate);
        store.put(USERS, "u1", doc_body(&alice).unwrap()).await.unwrap();
        store
            .put(
                PROJECTS,
                "td-p1",
                json!({"title": "Apollo", "description": "d", "teammates": ["u1", "ghost"], "progress": 0}),
            )
            .await
            .unwrap();

        let rows = project_board(&store).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].teammate_names, vec!["alice", UNNAMED_USER]);
    }
}
