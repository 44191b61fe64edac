//! Command implementations for the taskdeck CLI.
//!
//! Each command opens the app context (store + session), runs the
//! session restore, resolves the role, and puts its route through the
//! access gate before touching anything. Results serialize to JSON by
//! default or render as human-readable text with `-H`.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::auth::{LocalAuthProvider, Principal};
use crate::config::OutputFormat;
use crate::gate::GateDecision;
use crate::live::LiveQuery;
use crate::models::{Role, TASKS, Task};
use crate::ops::{self, DeleteRequest, NewProject, NewTask};
use crate::routes::{Route, RouteOutcome, resolve as resolve_route};
use crate::session::{RoleState, Session, SessionState};
use crate::store::{DocumentStore, LocalStore};
use crate::views::{
    AdminDashboard, ProjectRow, TaskBoard, TaskRow, TeammateDashboard, project_board, task_scope,
};
use crate::{Error, Result};

/// Everything a command needs: the store and a restored session.
pub struct AppContext {
    pub store: LocalStore,
    pub session: Session<LocalAuthProvider>,
}

impl AppContext {
    /// Open the context for a data directory and run the initial session
    /// check; no gate decision happens while the session is pending.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        let store = LocalStore::open(data_dir)?;
        let provider = Arc::new(LocalAuthProvider::open(data_dir)?);
        let session = Session::new(provider);
        session.restore().await?;
        Ok(Self { store, session })
    }

    /// Resolve the current role state (a no-op when signed out).
    async fn role_state(&self) -> Result<RoleState> {
        match self.session.state() {
            SessionState::SignedIn(principal) => {
                self.session.roles().resolve(&self.store, &principal).await
            }
            _ => Ok(RoleState::Pending),
        }
    }

    /// Gate a route; on allow, hand back the principal, resolved role,
    /// and the (possibly redirected) route.
    async fn mount(&self, route: Route) -> Result<(Principal, Role, Route)> {
        let session_state = self.session.state();
        let role_state = self.role_state().await?;
        debug!(?route, "gating route");

        match resolve_route(route, &session_state, &role_state) {
            RouteOutcome::Mount(target) => {
                let principal = session_state
                    .principal()
                    .cloned()
                    .ok_or(Error::NotSignedIn)?;
                let RoleState::Resolved(role) = role_state else {
                    return Err(Error::RoleUnresolved);
                };
                Ok((principal, role, target))
            }
            RouteOutcome::Refused(GateDecision::RedirectLogin) => Err(Error::NotSignedIn),
            RouteOutcome::Refused(GateDecision::Unauthorized) => Err(Error::Unauthorized),
            RouteOutcome::Refused(GateDecision::RoleUnresolved) => Err(Error::RoleUnresolved),
            RouteOutcome::Refused(_) => Err(Error::SessionPending),
        }
    }
}

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult: Serialize {
    /// Serialize to JSON string.
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Print a command result in the selected format.
pub fn output<T: CommandResult>(result: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", result.to_json()),
        OutputFormat::Human => println!("{}", result.to_human()),
    }
}

// === Session commands ===

#[derive(Debug, Serialize)]
pub struct SignupResult {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub redirect: String,
}

impl CommandResult for SignupResult {
    fn to_human(&self) -> String {
        format!(
            "Signed up {} as {} ({})\nGo to: {}",
            self.username, self.role, self.id, self.redirect
        )
    }
}

pub async fn signup(
    ctx: &AppContext,
    email: &str,
    password: &str,
    username: &str,
    role: &str,
) -> Result<SignupResult> {
    let role: Role = role.parse().map_err(Error::Validation)?;
    let principal = ctx
        .session
        .sign_up(&ctx.store, email, password, username, role)
        .await?;
    Ok(SignupResult {
        id: principal.id,
        username: username.to_string(),
        role,
        redirect: dashboard_path(role),
    })
}

#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub id: String,
    pub role: Role,
    pub redirect: String,
}

impl CommandResult for LoginResult {
    fn to_human(&self) -> String {
        format!("Signed in as {} ({})\nGo to: {}", self.id, self.role, self.redirect)
    }
}

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<LoginResult> {
    let principal = ctx.session.sign_in(email, password).await?;
    // Role resolves immediately after sign-in to pick the redirect; an
    // account with no role record is a visible error, not a guess.
    let role = ctx
        .session
        .roles()
        .require(&ctx.store, &principal)
        .await?;
    Ok(LoginResult {
        id: principal.id,
        role,
        redirect: dashboard_path(role),
    })
}

#[derive(Debug, Serialize)]
pub struct LogoutResult {
    pub signed_out: bool,
}

impl CommandResult for LogoutResult {
    fn to_human(&self) -> String {
        "Signed out".to_string()
    }
}

pub async fn logout(ctx: &AppContext) -> Result<LogoutResult> {
    ctx.session.sign_out().await;
    Ok(LogoutResult { signed_out: true })
}

#[derive(Debug, Serialize)]
pub struct WhoamiResult {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl CommandResult for WhoamiResult {
    fn to_human(&self) -> String {
        match self.state.as_str() {
            "signed_in" => format!(
                "Signed in as {} (role: {})",
                self.username
                    .as_deref()
                    .or(self.id.as_deref())
                    .unwrap_or("?"),
                self.role.as_deref().unwrap_or("unresolved")
            ),
            "pending" => "Session check pending".to_string(),
            _ => "Not signed in".to_string(),
        }
    }
}

/// Diagnostic view of the session; deliberately not gated.
pub async fn whoami(ctx: &AppContext) -> Result<WhoamiResult> {
    match ctx.session.state() {
        SessionState::Pending => Ok(WhoamiResult {
            state: "pending".to_string(),
            id: None,
            username: None,
            role: None,
        }),
        SessionState::SignedOut => Ok(WhoamiResult {
            state: "signed_out".to_string(),
            id: None,
            username: None,
            role: None,
        }),
        SessionState::SignedIn(principal) => {
            let role = match ctx.role_state().await? {
                RoleState::Resolved(role) => Some(role.to_string()),
                RoleState::Missing => Some("unresolved".to_string()),
                RoleState::Pending => None,
            };
            Ok(WhoamiResult {
                state: "signed_in".to_string(),
                id: Some(principal.id),
                username: principal.display_name,
                role,
            })
        }
    }
}

// === Dashboard ===

#[derive(Debug, Serialize)]
pub struct DashboardResult {
    pub route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminDashboard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teammate: Option<TeammateDashboard>,
}

impl CommandResult for DashboardResult {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("== {} ==", self.route)];
        if let Some(admin) = &self.admin {
            lines.push(format!("Teammates: {}", admin.teammates.len()));
            lines.push("Assigned tasks:".to_string());
            for row in &admin.tasks {
                lines.push(human_task_line(row));
            }
        }
        if let Some(teammate) = &self.teammate {
            lines.push(format!("Hello, {}", teammate.greeting));
            lines.push("Your tasks:".to_string());
            for row in &teammate.tasks {
                lines.push(human_task_line(row));
            }
        }
        lines.join("\n")
    }
}

/// `Home`: role-based redirect to the matching dashboard.
pub async fn dashboard(ctx: &AppContext) -> Result<DashboardResult> {
    let (principal, _role, target) = ctx.mount(Route::Home).await?;
    match target {
        Route::AdminDashboard => Ok(DashboardResult {
            route: "/admin-dashboard".to_string(),
            admin: Some(AdminDashboard::load(&ctx.store).await?),
            teammate: None,
        }),
        Route::TeammateDashboard => Ok(DashboardResult {
            route: "/teammate-dashboard".to_string(),
            admin: None,
            teammate: Some(TeammateDashboard::load(&ctx.store, &principal).await?),
        }),
        // Home only redirects to a dashboard.
        _ => Err(Error::Unauthorized),
    }
}

// === Task commands ===

#[derive(Debug, Serialize)]
pub struct TaskCreateResult {
    #[serde(flatten)]
    pub task: Task,
}

impl CommandResult for TaskCreateResult {
    fn to_human(&self) -> String {
        format!(
            "Created task {} ({}) assigned to {}",
            self.task.id, self.task.task_name, self.task.assigned_to
        )
    }
}

pub async fn task_create(
    ctx: &AppContext,
    name: &str,
    description: &str,
    assignee: &str,
    due: &str,
) -> Result<TaskCreateResult> {
    ctx.mount(Route::AdminDashboard).await?;
    let due_date = NaiveDate::parse_from_str(due, "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("bad due date (want YYYY-MM-DD): {due}")))?;
    let task = ops::create_task(
        &ctx.store,
        NewTask {
            name: name.to_string(),
            description: description.to_string(),
            assignee: assignee.to_string(),
            due_date: Some(due_date),
        },
    )
    .await?;
    Ok(TaskCreateResult { task })
}

#[derive(Debug, Serialize)]
pub struct TaskListResult {
    pub role: Role,
    pub tasks: Vec<TaskRow>,
}

impl CommandResult for TaskListResult {
    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return match self.role {
                Role::Admin => "No tasks available".to_string(),
                Role::Teammate => "No tasks assigned to you".to_string(),
            };
        }
        self.tasks.iter().map(human_task_line).collect::<Vec<_>>().join("\n")
    }
}

/// Role-scoped task list: admins see everything, teammates their own.
pub async fn task_list(ctx: &AppContext) -> Result<TaskListResult> {
    let (principal, role, _) = ctx.mount(Route::Tasks).await?;
    let documents = ctx
        .store
        .query(TASKS, &task_scope(role, &principal))
        .await?;
    let snapshot = crate::live::Snapshot { seq: 0, documents };
    let mut board = TaskBoard::new();
    board.apply_joined(&ctx.store, &snapshot).await?;
    Ok(TaskListResult {
        role,
        tasks: board.rows,
    })
}

#[derive(Debug, Serialize)]
pub struct TaskUpdateResult {
    pub id: String,
    pub completed: bool,
    pub progress: u8,
}

impl CommandResult for TaskUpdateResult {
    fn to_human(&self) -> String {
        format!(
            "Task {}: progress {}%, {}",
            self.id,
            self.progress,
            if self.completed { "completed" } else { "incomplete" }
        )
    }
}

async fn read_task(ctx: &AppContext, id: &str) -> Result<Task> {
    ctx.store
        .get(TASKS, id)
        .await?
        .ok_or_else(|| Error::not_found(TASKS, id))?
        .decode()
}

pub async fn task_toggle(ctx: &AppContext, id: &str) -> Result<TaskUpdateResult> {
    ctx.mount(Route::AdminDashboard).await?;
    let task = read_task(ctx, id).await?;
    ops::toggle_task_completion(&ctx.store, id, task.completed).await?;
    let task = read_task(ctx, id).await?;
    Ok(TaskUpdateResult {
        id: task.id,
        completed: task.completed,
        progress: task.progress,
    })
}

pub async fn task_progress(ctx: &AppContext, id: &str, percent: u8) -> Result<TaskUpdateResult> {
    let (principal, role, _) = ctx.mount(Route::Tasks).await?;
    let task = read_task(ctx, id).await?;
    // Teammates may only move their own tasks.
    if role == Role::Teammate && task.assigned_to != principal.id {
        return Err(Error::Unauthorized);
    }
    ops::update_task_progress(&ctx.store, id, percent).await?;
    let task = read_task(ctx, id).await?;
    Ok(TaskUpdateResult {
        id: task.id,
        completed: task.completed,
        progress: task.progress,
    })
}

#[derive(Debug, Serialize)]
pub struct TaskDeleteResult {
    pub id: String,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CommandResult for TaskDeleteResult {
    fn to_human(&self) -> String {
        if self.deleted {
            format!("Deleted task {}", self.id)
        } else {
            format!(
                "Not deleted. {}",
                self.hint.as_deref().unwrap_or("Confirmation required")
            )
        }
    }
}

/// Delete is confirmation-gated: without `--yes` nothing is written.
pub async fn task_delete(ctx: &AppContext, id: &str, yes: bool) -> Result<TaskDeleteResult> {
    ctx.mount(Route::AdminDashboard).await?;
    let request = DeleteRequest::new(id);
    if !yes {
        return Ok(TaskDeleteResult {
            id: request.task_id().to_string(),
            deleted: false,
            hint: Some("re-run with --yes to confirm".to_string()),
        });
    }
    ops::delete_task(&ctx.store, request.confirm()).await?;
    Ok(TaskDeleteResult {
        id: id.to_string(),
        deleted: true,
        hint: None,
    })
}

#[derive(Debug, Serialize)]
pub struct TaskWatchResult {
    pub snapshots_seen: u64,
}

impl CommandResult for TaskWatchResult {
    fn to_human(&self) -> String {
        format!("Watched {} snapshot(s)", self.snapshots_seen)
    }
}

/// Watch the role-scoped task list live, printing one full snapshot per
/// change. Runs until Ctrl+C or `count` snapshots.
pub async fn task_watch(
    ctx: &AppContext,
    count: Option<u64>,
    format: OutputFormat,
) -> Result<TaskWatchResult> {
    let (principal, role, _) = ctx.mount(Route::Tasks).await?;
    let mut query =
        LiveQuery::subscribe(&ctx.store, TASKS, task_scope(role, &principal)).await?;

    let mut seen = 0u64;
    let mut board = TaskBoard::new();
    loop {
        let snapshot = tokio::select! {
            snapshot = query.latest_snapshot() => snapshot,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(snapshot) = snapshot else { break };

        if board.apply_joined(&ctx.store, &snapshot).await? {
            seen += 1;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string(&serde_json::json!({
                        "seq": snapshot.seq,
                        "tasks": board.rows,
                    }))?
                ),
                OutputFormat::Human => {
                    println!("-- snapshot #{} ({} tasks)", snapshot.seq, board.rows.len());
                    for row in &board.rows {
                        println!("{}", human_task_line(row));
                    }
                }
            }
        }

        if count.is_some_and(|limit| seen >= limit) {
            break;
        }
    }
    query.unsubscribe();
    Ok(TaskWatchResult { snapshots_seen: seen })
}

// === Project commands ===

#[derive(Debug, Serialize)]
pub struct ProjectCreateResult {
    pub id: String,
    pub title: String,
    pub teammates: Vec<String>,
}

impl CommandResult for ProjectCreateResult {
    fn to_human(&self) -> String {
        format!(
            "Created project {} ({}) with {} teammate(s)",
            self.id,
            self.title,
            self.teammates.len()
        )
    }
}

pub async fn project_create(
    ctx: &AppContext,
    title: &str,
    description: &str,
    teammates: Vec<String>,
) -> Result<ProjectCreateResult> {
    ctx.mount(Route::AdminDashboard).await?;
    let project = ops::create_project(
        &ctx.store,
        NewProject {
            title: title.to_string(),
            description: description.to_string(),
            teammates,
        },
    )
    .await?;
    Ok(ProjectCreateResult {
        id: project.id,
        title: project.title,
        teammates: project.teammates,
    })
}

#[derive(Debug, Serialize)]
pub struct ProjectListResult {
    pub projects: Vec<ProjectRow>,
}

impl CommandResult for ProjectListResult {
    fn to_human(&self) -> String {
        if self.projects.is_empty() {
            return "No projects".to_string();
        }
        self.projects
            .iter()
            .map(|row| {
                format!(
                    "{} {} [{}%] - {}",
                    row.project.id,
                    row.project.title,
                    row.project.progress,
                    row.teammate_names.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub async fn project_list(ctx: &AppContext) -> Result<ProjectListResult> {
    ctx.mount(Route::Projects).await?;
    Ok(ProjectListResult {
        projects: project_board(&ctx.store).await?,
    })
}

fn dashboard_path(role: Role) -> String {
    match role {
        Role::Admin => "/admin-dashboard".to_string(),
        Role::Teammate => "/teammate-dashboard".to_string(),
    }
}

fn human_task_line(row: &TaskRow) -> String {
    let status = if row.task.completed {
        "completed".to_string()
    } else {
        format!("{}%", row.task.progress)
    };
    let due = row
        .task
        .due_date
        .map(|d| format!(", due {d}"))
        .unwrap_or_default();
    format!(
        "{} {} - {} (assigned to {}{}, {})",
        row.task.id, row.task.task_name, row.task.description, row.assignee_name, due, status
    )
}
