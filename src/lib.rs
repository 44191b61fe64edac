//! Taskdeck - a role-gated team task tracker.
//!
//! This library provides the core functionality for the `td` CLI tool:
//! identity sessions, role resolution, access gating, live collection
//! subscriptions, and the task/project mutation operations. The CLI is a
//! thin rendering surface; everything stateful lives here.

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod gate;
pub mod live;
pub mod models;
pub mod ops;
pub mod routes;
pub mod session;
pub mod store;
pub mod views;


/// Library-level error type for taskdeck operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Auth(#[from] crate::auth::AuthError),

    #[error("Not signed in: run `td login` first")]
    NotSignedIn,

    #[error("Session check still pending; try again")]
    SessionPending,

    #[error("Signed in, but no role record exists for this account")]
    RoleUnresolved,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Partial write: {completed} succeeded but {failed} failed")]
    PartialWrite {
        /// Description of the step that committed (e.g. "task create td-1234")
        completed: String,
        /// Description of the step that did not
        failed: String,
    },
}

impl Error {
    /// Construct a `NotFound` for a collection/id pair.
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result type alias for taskdeck operations.
pub type Result<T> = std::result::Result<T, Error>;
