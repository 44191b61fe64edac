//! Mutation operations for tasks and projects.
//!
//! Every operation validates locally first, so a `Validation` error never
//! reaches the store, then issues its write(s). Success is relative to
//! the write's acknowledgment only: the initiating view refreshes through
//! its live subscription, never through a return value.
//!
//! The completion invariant is enforced uniformly here: progress is the
//! source of truth and `completed == (progress == 100)` on every path.

use chrono::NaiveDate;
use serde_json::json;
use tracing::info;

use crate::models::{
    MAX_PROJECT_TEAMMATES, PROJECTS, Project, Role, TASKS, Task, USERS, UserRecord, new_doc_id,
};
use crate::store::{DocumentStore, doc_body};
use crate::{Error, Result};

/// Input for `create_task`.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Task name (required, non-empty)
    pub name: String,
    /// Detailed description (required, non-empty)
    pub description: String,
    /// User id of the teammate to assign (required)
    pub assignee: String,
    /// Due date (required at creation)
    pub due_date: Option<NaiveDate>,
}

/// Input for `create_project`.
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Project title (required, non-empty)
    pub title: String,
    /// Detailed description (required, non-empty)
    pub description: String,
    /// Teammate user ids, 1..=5, first is the primary
    pub teammates: Vec<String>,
}

/// Look up a user and demand the Teammate role.
async fn require_teammate<S: DocumentStore>(store: &S, user_id: &str) -> Result<UserRecord> {
    let doc = store
        .get(USERS, user_id)
        .await?
        .ok_or_else(|| Error::not_found(USERS, user_id))?;
    let record: UserRecord = doc.decode()?;
    if record.role != Role::Teammate {
        return Err(Error::Validation(format!(
            "user {} is not a teammate",
            record.username
        )));
    }
    Ok(record)
}

/// Create a task and register it on the assignee's task list.
///
/// Two writes form one logical unit without a transaction: if the
/// task-list append fails after the task was created, the result is a
/// `PartialWrite` naming both halves so the inconsistency is detectable.
pub async fn create_task<S: DocumentStore>(store: &S, input: NewTask) -> Result<Task> {
    if input.name.trim().is_empty() {
        return Err(Error::Validation("task name must not be empty".to_string()));
    }
    if input.description.trim().is_empty() {
        return Err(Error::Validation(
            "task description must not be empty".to_string(),
        ));
    }
    if input.assignee.trim().is_empty() {
        return Err(Error::Validation("no assignee selected".to_string()));
    }
    let Some(due_date) = input.due_date else {
        return Err(Error::Validation("no due date selected".to_string()));
    };

    require_teammate(store, &input.assignee).await?;

    let task = Task::new(
        new_doc_id(),
        input.name,
        input.description,
        input.assignee,
        Some(due_date),
    );
    store.put(TASKS, &task.id, doc_body(&task)?).await?;

    if let Err(e) = store
        .append_to_array(USERS, &task.assigned_to, "tasksAssigned", json!(task.id))
        .await
    {
        return Err(Error::PartialWrite {
            completed: format!("task create {}", task.id),
            failed: format!("assignee task-list append ({e})"),
        });
    }

    info!(task = %task.id, assignee = %task.assigned_to, "task created");
    Ok(task)
}

/// Flip a task's completion, keeping progress in lockstep (100 or 0).
pub async fn toggle_task_completion<S: DocumentStore>(
    store: &S,
    task_id: &str,
    currently_completed: bool,
) -> Result<()> {
    let completed = !currently_completed;
    store
        .update(
            TASKS,
            task_id,
            json!({
                "completed": completed,
                "progress": if completed { 100 } else { 0 },
            }),
        )
        .await?;
    info!(task = task_id, completed, "task completion toggled");
    Ok(())
}

/// Set a task's progress; completion is derived, never set independently.
pub async fn update_task_progress<S: DocumentStore>(
    store: &S,
    task_id: &str,
    progress: u8,
) -> Result<()> {
    if progress > 100 {
        return Err(Error::Validation(format!(
            "progress must be 0-100, got {progress}"
        )));
    }
    store
        .update(
            TASKS,
            task_id,
            json!({
                "progress": progress,
                "completed": progress == 100,
            }),
        )
        .await?;
    info!(task = task_id, progress, "task progress updated");
    Ok(())
}

/// A delete that has been requested but not yet confirmed.
///
/// The confirmation step is part of the delete contract: `delete_task`
/// only accepts a `DeleteConfirmation`, and the only way to obtain one is
/// to `confirm()` a request. Dropping the request deletes nothing.
#[derive(Debug)]
pub struct DeleteRequest {
    task_id: String,
}

/// Proof that the caller confirmed a specific delete.
#[derive(Debug)]
pub struct DeleteConfirmation {
    task_id: String,
}

impl DeleteRequest {
    /// Start a delete flow for a task.
    pub fn new(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
        }
    }

    /// The task this request targets.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Confirm the delete.
    pub fn confirm(self) -> DeleteConfirmation {
        DeleteConfirmation {
            task_id: self.task_id,
        }
    }
}

/// Delete a task after confirmation.
pub async fn delete_task<S: DocumentStore>(
    store: &S,
    confirmation: DeleteConfirmation,
) -> Result<()> {
    store.delete(TASKS, &confirmation.task_id).await?;
    info!(task = %confirmation.task_id, "task deleted");
    Ok(())
}

/// Create a project with a fixed teammate roster.
pub async fn create_project<S: DocumentStore>(store: &S, input: NewProject) -> Result<Project> {
    if input.title.trim().is_empty() {
        return Err(Error::Validation(
            "project title must not be empty".to_string(),
        ));
    }
    if input.description.trim().is_empty() {
        return Err(Error::Validation(
            "project description must not be empty".to_string(),
        ));
    }
    if input.teammates.is_empty() {
        return Err(Error::Validation(
            "a project needs at least one teammate".to_string(),
        ));
    }
    if input.teammates.len() > MAX_PROJECT_TEAMMATES {
        return Err(Error::Validation(format!(
            "a project takes at most {MAX_PROJECT_TEAMMATES} teammates"
        )));
    }
    for (i, id) in input.teammates.iter().enumerate() {
        if input.teammates[..i].contains(id) {
            return Err(Error::Validation(format!("duplicate teammate: {id}")));
        }
    }
    for id in &input.teammates {
        require_teammate(store, id).await?;
    }

    let project = Project {
        id: new_doc_id(),
        title: input.title,
        description: input.description,
        teammates: input.teammates,
        progress: 0,
    };
    store.put(PROJECTS, &project.id, doc_body(&project)?).await?;
    info!(project = %project.id, teammates = project.teammates.len(), "project created");
    Ok(project)
}

/// Refilter secondary teammate selections after the primary changed.
///
/// Pure function of the selection state: the new primary and any
/// duplicates are removed, order otherwise preserved.
pub fn refilter_secondary(primary: &str, secondary: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(secondary.len());
    for id in secondary {
        if id != primary && !kept.contains(id) {
            kept.push(id.clone());
        }
    }
    kept
}
