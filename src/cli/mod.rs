//! CLI argument definitions for taskdeck.

use clap::{Parser, Subcommand};

/// Taskdeck - a role-gated team task tracker.
///
/// Sign up or log in first; what you can see and change depends on your
/// role (admin or teammate).
#[derive(Parser, Debug)]
#[command(name = "td")]
#[command(author, version, about = "A role-gated team task tracker", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Data directory for the local store and session state.
    /// Can also be set via TD_DATA_DIR environment variable.
    #[arg(short = 'D', long = "data-dir", global = true, env = "TD_DATA_DIR")]
    pub data_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account and sign in
    Signup {
        /// Email address
        #[arg(long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(long)]
        password: String,

        /// Display handle shown to other users
        #[arg(long)]
        username: String,

        /// Role: "admin" or "teammate"
        #[arg(long)]
        role: String,
    },

    /// Sign in with an existing account
    Login {
        /// Email address
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show the current session and role
    Whoami,

    /// Open your dashboard (redirects by role)
    Dashboard,

    /// Task management commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task and assign it to a teammate (admin only)
    Create {
        /// Task name
        #[arg(long)]
        name: String,

        /// Detailed description
        #[arg(long)]
        description: String,

        /// User id of the teammate to assign
        #[arg(long)]
        assignee: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,
    },

    /// List tasks (admins see all, teammates see their own)
    List,

    /// Toggle a task's completion (admin only)
    Toggle {
        /// Task id (e.g., td-a1b2c3d4)
        id: String,
    },

    /// Set a task's progress percentage
    Progress {
        /// Task id
        id: String,

        /// Progress (0-100); 100 marks the task completed
        percent: u8,
    },

    /// Delete a task (admin only; requires --yes)
    Delete {
        /// Task id
        id: String,

        /// Confirm the delete; without this flag nothing is deleted
        #[arg(long)]
        yes: bool,
    },

    /// Watch your task list live, printing a snapshot per change
    Watch {
        /// Stop after this many snapshots (default: run until Ctrl+C)
        #[arg(long)]
        count: Option<u64>,
    },
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project with 1-5 teammates (admin only)
    Create {
        /// Project title
        #[arg(long)]
        title: String,

        /// Detailed description
        #[arg(long)]
        description: String,

        /// Teammate user id; repeat for up to five, first is the primary
        #[arg(long = "teammate")]
        teammates: Vec<String>,
    },

    /// List projects with their teammate rosters
    List,
}
