//! Identity session state machine.
//!
//! A `Session` wraps the auth provider and tracks the lifecycle
//! signed-out → pending → signed-in. It is an explicitly constructed
//! object passed by handle, not ambient global state. The session owns the
//! role resolver so the role cache cannot outlive the sign-in it belongs
//! to.
//!
//! `Pending` exists only between construction and the initial `restore()`
//! call; no gate decision may be rendered as allow/deny while pending.

pub mod role;

pub use role::{RoleResolver, RoleState};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::auth::{AuthProvider, Principal};
use crate::models::{Role, USERS, UserRecord};
use crate::store::{DocumentStore, doc_body};
use crate::{Error, Result};

/// Lifecycle state of the identity session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Initial check not yet run; neither signed in nor out
    Pending,
    /// No live principal
    SignedOut,
    /// A principal is live
    SignedIn(Principal),
}

impl SessionState {
    /// The live principal, if signed in.
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionState::SignedIn(principal) => Some(principal),
            _ => None,
        }
    }
}

/// Identity session over an auth provider.
pub struct Session<A: AuthProvider> {
    provider: Arc<A>,
    state: watch::Sender<SessionState>,
    roles: RoleResolver,
}

impl<A: AuthProvider> Session<A> {
    /// Construct a session; state is `Pending` until `restore()` runs.
    pub fn new(provider: Arc<A>) -> Self {
        let (state, _) = watch::channel(SessionState::Pending);
        Self {
            provider,
            state,
            roles: RoleResolver::new(),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe state transitions.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The session's role resolver.
    pub fn roles(&self) -> &RoleResolver {
        &self.roles
    }

    /// Run the provider's initial session check and leave `Pending`.
    pub async fn restore(&self) -> Result<SessionState> {
        let state = match self.provider.restore().await? {
            Some(principal) => SessionState::SignedIn(principal),
            None => SessionState::SignedOut,
        };
        self.state.send_replace(state.clone());
        debug!(state = ?discriminant_name(&state), "session restored");
        Ok(state)
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Principal> {
        // A fresh sign-in gets a fresh role resolution.
        self.roles.invalidate().await;
        let principal = self.provider.sign_in(email, password).await?;
        self.state.send_replace(SessionState::SignedIn(principal.clone()));
        Ok(principal)
    }

    /// Create an account: a provider principal plus its `users` record, as
    /// one logical unit.
    ///
    /// If the second step fails the principal still exists with no role
    /// record; that inconsistency is surfaced as `PartialWrite`, and the
    /// session is left signed in so the caller can see the split state.
    pub async fn sign_up<S: DocumentStore>(
        &self,
        store: &S,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
    ) -> Result<Principal> {
        if username.trim().is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }

        self.roles.invalidate().await;
        let principal = self.provider.sign_up(email, password, Some(username)).await?;
        self.state.send_replace(SessionState::SignedIn(principal.clone()));

        let record = UserRecord::new(
            principal.id.clone(),
            username.to_string(),
            email.to_string(),
            role,
        );
        let body = doc_body(&record)?;
        if let Err(e) = store.put(USERS, &principal.id, body).await {
            warn!(principal = %principal.id, error = %e, "users record write failed after signup");
            return Err(Error::PartialWrite {
                completed: format!("auth principal {}", principal.id),
                failed: "users record create".to_string(),
            });
        }
        Ok(principal)
    }

    /// Sign out. Local principal and role cache are cleared synchronously,
    /// before the provider's own acknowledgment; a provider-side failure is
    /// logged, never resurfaced as a live session.
    pub async fn sign_out(&self) {
        self.state.send_replace(SessionState::SignedOut);
        self.roles.invalidate().await;
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "provider sign-out failed; local session already cleared");
        }
    }
}

fn discriminant_name(state: &SessionState) -> &'static str {
    match state {
        SessionState::Pending => "pending",
        SessionState::SignedOut => "signed_out",
        SessionState::SignedIn(_) => "signed_in",
    }
}
