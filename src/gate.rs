//! Access gate: pure admission decisions for protected views.
//!
//! `decide` has no side effects and is safe to call repeatedly. It never
//! grants access while either the session or the role is unresolved, and
//! it keeps "not logged in" (redirect) distinguishable from "logged in as
//! the wrong role" (denial) and from "logged in with no role record".

use crate::models::Role;
use crate::session::{RoleState, SessionState};

/// Outcome of a gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Mount the protected view
    Allow,
    /// No live principal: go to the login view
    RedirectLogin,
    /// Wrong role: render a denial, do not redirect
    Unauthorized,
    /// Authenticated but no role record exists; renders distinctly from
    /// `Unauthorized`
    RoleUnresolved,
    /// Session or role resolution has not finished; show a neutral
    /// loading state, never protected content and never a false redirect
    Pending,
}

/// Decide admission for a view requiring `required` role.
pub fn decide(session: &SessionState, role: &RoleState, required: Role) -> GateDecision {
    match session {
        SessionState::Pending => GateDecision::Pending,
        SessionState::SignedOut => GateDecision::RedirectLogin,
        SessionState::SignedIn(_) => match role {
            RoleState::Pending => GateDecision::Pending,
            RoleState::Missing => GateDecision::RoleUnresolved,
            RoleState::Resolved(r) if *r == required => GateDecision::Allow,
            RoleState::Resolved(_) => GateDecision::Unauthorized,
        },
    }
}
