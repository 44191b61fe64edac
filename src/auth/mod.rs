//! Auth provider boundary.
//!
//! The auth provider verifies credentials and issues principals; it knows
//! nothing about roles. The rest of the crate programs against the
//! `AuthProvider` trait; `local::LocalAuthProvider` is the shipped
//! implementation (credential records in SQLite, persisted session token).

pub mod local;

pub use local::LocalAuthProvider;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Errors reported by the auth provider.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email unknown or password mismatch; the two are deliberately not
    /// distinguished to the caller.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Signup with an email that already has a credential record
    #[error("Email is already in use")]
    EmailInUse,

    /// Signup with a password shorter than `MIN_PASSWORD_LEN`
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    /// Anything else the provider reports
    #[error("Auth provider error: {0}")]
    Unknown(String),
}

/// Authenticated identity handle, independent of authorization role.
///
/// Exactly zero or one principal is live per client at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique id issued by the provider; doubles as the users-record key
    pub id: String,

    /// Optional display name captured at signup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Email the principal authenticated with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Contract for the external authentication provider.
///
/// `session_changes` delivers the current principal (or none) whenever the
/// provider's session state changes, including the initial restore.
pub trait AuthProvider: Send + Sync + 'static {
    /// Verify credentials and make the principal live.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = std::result::Result<Principal, AuthError>> + Send;

    /// Create a credential record and sign the new principal in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> impl Future<Output = std::result::Result<Principal, AuthError>> + Send;

    /// End the provider-side session. Local state is cleared by the caller
    /// before this resolves.
    fn sign_out(&self) -> impl Future<Output = std::result::Result<(), AuthError>> + Send;

    /// Initial check on process start: report whether a previous session
    /// persists.
    fn restore(
        &self,
    ) -> impl Future<Output = std::result::Result<Option<Principal>, AuthError>> + Send;

    /// Observe session changes, including the initial state.
    fn session_changes(&self) -> watch::Receiver<Option<Principal>>;
}
