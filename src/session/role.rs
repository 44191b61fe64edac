//! Role resolution and per-session caching.
//!
//! A principal's role lives on its `users` record. The resolver performs
//! exactly one lookup per sign-in and caches the outcome until the session
//! ends; an absent record resolves to `Missing`, never to a default role.

use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::Principal;
use crate::models::{Role, USERS, UserRecord};
use crate::store::DocumentStore;
use crate::{Error, Result};

/// Authorization state of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    /// No lookup has completed yet
    Pending,
    /// Role record found
    Resolved(Role),
    /// Principal is authenticated but has no users record; this is a
    /// visible error state, distinct from both Pending and any role
    Missing,
}

/// Resolves and caches the session's role.
pub struct RoleResolver {
    cache: Mutex<RoleState>,
}

impl RoleResolver {
    /// New resolver with nothing resolved yet.
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(RoleState::Pending),
        }
    }

    /// The cached state without triggering a lookup.
    pub async fn cached(&self) -> RoleState {
        *self.cache.lock().await
    }

    /// Resolve the role for a principal, fetching at most once per session.
    ///
    /// Holding the cache lock across the fetch is what guarantees the
    /// single-lookup contract under concurrent callers.
    pub async fn resolve<S: DocumentStore>(
        &self,
        store: &S,
        principal: &Principal,
    ) -> Result<RoleState> {
        let mut cache = self.cache.lock().await;
        if *cache != RoleState::Pending {
            return Ok(*cache);
        }

        let state = match store.get(USERS, &principal.id).await? {
            Some(doc) => {
                let record: UserRecord = doc.decode()?;
                debug!(principal = %principal.id, role = %record.role, "role resolved");
                RoleState::Resolved(record.role)
            }
            None => {
                debug!(principal = %principal.id, "no role record found");
                RoleState::Missing
            }
        };
        *cache = state;
        Ok(state)
    }

    /// Resolve and demand a role; `Missing` becomes `RoleUnresolved`.
    pub async fn require<S: DocumentStore>(
        &self,
        store: &S,
        principal: &Principal,
    ) -> Result<Role> {
        match self.resolve(store, principal).await? {
            RoleState::Resolved(role) => Ok(role),
            RoleState::Missing | RoleState::Pending => Err(Error::RoleUnresolved),
        }
    }

    /// Drop the cached role (sign-out, or a new sign-in).
    pub async fn invalidate(&self) {
        *self.cache.lock().await = RoleState::Pending;
    }
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new()
    }
}
