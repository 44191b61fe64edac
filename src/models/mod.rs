//! Data models for taskdeck entities.
//!
//! This module defines the core data structures:
//! - `Role` - Authorization level attached to a user record
//! - `UserRecord` - Account document in the `users` collection
//! - `Project` - Project document with a fixed teammate roster
//! - `Task` - Work item assigned to exactly one teammate
//!
//! Field names serialize in the persisted camelCase layout
//! (`taskName`, `assignedTo`, `tasksAssigned`, `dueDate`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name of the users collection in the document store.
pub const USERS: &str = "users";
/// Name of the projects collection in the document store.
pub const PROJECTS: &str = "projects";
/// Name of the tasks collection in the document store.
pub const TASKS: &str = "tasks";

/// Maximum number of teammates on a project (first entry is the primary).
pub const MAX_PROJECT_TEAMMATES: usize = 5;

/// Authorization role attached to a user record.
///
/// The role lives on the `users` document, never on the auth principal:
/// an authenticated account with no user record has no role at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Teammate,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Teammate => write!(f, "teammate"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teammate" => Ok(Role::Teammate),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Account document stored in the `users` collection.
///
/// `id` equals the auth principal id, which is what ties a signed-in
/// session to its role. `tasks_assigned` is append-only; entries are added
/// through the store's array-append primitive when tasks are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Principal id from the auth provider
    pub id: String,

    /// Display handle shown in joined views
    pub username: String,

    /// Contact email (mirrors the auth credential)
    pub email: String,

    /// Authorization role
    pub role: Role,

    /// Ids of tasks assigned to this user (append-only)
    #[serde(default)]
    pub tasks_assigned: Vec<String>,
}

impl UserRecord {
    /// Create a new user record for a principal.
    pub fn new(id: String, username: String, email: String, role: Role) -> Self {
        Self {
            id,
            username,
            email,
            role,
            tasks_assigned: Vec::new(),
        }
    }
}

/// A project tracked by taskdeck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier (e.g., "td-a1b2c3d4")
    pub id: String,

    /// Project title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Teammate user ids, 1..=5 entries, first is the primary
    pub teammates: Vec<String>,

    /// Progress percentage (0-100)
    #[serde(default)]
    pub progress: u8,
}

/// A work item assigned to exactly one teammate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier (e.g., "td-a1b2c3d4")
    pub id: String,

    /// Task name
    pub task_name: String,

    /// Detailed description
    pub description: String,

    /// User id of the single assignee
    pub assigned_to: String,

    /// Completion flag; always equals `progress == 100`
    #[serde(default)]
    pub completed: bool,

    /// Progress percentage (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Due date, set at creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl Task {
    /// Create a new, not-yet-started task for an assignee.
    pub fn new(
        id: String,
        task_name: String,
        description: String,
        assigned_to: String,
        due_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            task_name,
            description,
            assigned_to,
            completed: false,
            progress: 0,
            due_date,
        }
    }
}

/// Generate a short document id with the `td-` prefix.
pub fn new_doc_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("td-{}", &uuid[..8])
}
