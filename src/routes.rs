//! Logical route surface and per-route admission.
//!
//! Routes are logical views, not literal paths; the CLI maps commands onto
//! them. Each protected route invokes the gate before anything mounts.
//! `Home` is the role-based redirect: it resolves to the dashboard
//! matching the session's role.

use crate::gate::{self, GateDecision};
use crate::models::Role;
use crate::session::{RoleState, SessionState};

/// The application's view surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Home,
    AdminDashboard,
    TeammateDashboard,
    Projects,
    Tasks,
}

/// Outcome of resolving a route against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Mount the (possibly redirected) route
    Mount(Route),
    /// Gate refused; carries the decision for rendering
    Refused(GateDecision),
}

impl Route {
    /// The role a route requires, if it is role-specific.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::AdminDashboard => Some(Role::Admin),
            Route::TeammateDashboard => Some(Role::Teammate),
            Route::Login | Route::Signup | Route::Home | Route::Projects | Route::Tasks => None,
        }
    }

    /// Whether the route is public (no session required).
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Signup)
    }
}

/// Resolve a route for the current session and role state.
///
/// Role-specific routes go through the gate with their required role.
/// Routes open to any resolved role (`Projects`, `Tasks`) gate on the
/// session's own role, so the only refusals they can produce are
/// redirect/pending/role-unresolved, never a wrong-role denial. `Home`
/// redirects to the dashboard matching the resolved role.
pub fn resolve(route: Route, session: &SessionState, role: &RoleState) -> RouteOutcome {
    if route.is_public() {
        return RouteOutcome::Mount(route);
    }

    let target = match (route, role) {
        (Route::Home, RoleState::Resolved(Role::Admin)) => Route::AdminDashboard,
        (Route::Home, RoleState::Resolved(Role::Teammate)) => Route::TeammateDashboard,
        _ => route,
    };

    let required = match target.required_role() {
        Some(required) => required,
        // Any-role route: demand the session's own resolved role.
        None => match role {
            RoleState::Resolved(own) => *own,
            // Gate handles pending/missing uniformly below; the required
            // role is irrelevant on those paths.
            _ => Role::Teammate,
        },
    };

    match gate::decide(session, role, required) {
        GateDecision::Allow => RouteOutcome::Mount(target),
        refused => RouteOutcome::Refused(refused),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;

    fn signed_in() -> SessionState {
        SessionState::SignedIn(Principal {
            id: "uid-1".to_string(),
            display_name: None,
            email: None,
        })
    }

    #[test]
    fn public_routes_mount_without_a_session() {
        for route in [Route::Login, Route::Signup] {
            assert_eq!(
                resolve(route, &SessionState::SignedOut, &RoleState::Pending),
                RouteOutcome::Mount(route)
            );
        }
    }

    #[test]
    fn home_redirects_by_role() {
        assert_eq!(
            resolve(Route::Home, &signed_in(), &RoleState::Resolved(Role::Admin)),
            RouteOutcome::Mount(Route::AdminDashboard)
        );
        assert_eq!(
            resolve(
                Route::Home,
                &signed_in(),
                &RoleState::Resolved(Role::Teammate)
            ),
            RouteOutcome::Mount(Route::TeammateDashboard)
        );
    }

    #[test]
    fn dashboards_deny_the_wrong_role() {
        assert_eq!(
            resolve(
                Route::AdminDashboard,
                &signed_in(),
                &RoleState::Resolved(Role::Teammate)
            ),
            RouteOutcome::Refused(GateDecision::Unauthorized)
        );
    }

    #[test]
    fn any_role_routes_mount_for_both_roles() {
        for role in [Role::Admin, Role::Teammate] {
            assert_eq!(
                resolve(Route::Tasks, &signed_in(), &RoleState::Resolved(role)),
                RouteOutcome::Mount(Route::Tasks)
            );
            assert_eq!(
                resolve(Route::Projects, &signed_in(), &RoleState::Resolved(role)),
                RouteOutcome::Mount(Route::Projects)
            );
        }
    }

    #[test]
    fn protected_routes_redirect_when_signed_out() {
        for route in [
            Route::Home,
            Route::AdminDashboard,
            Route::TeammateDashboard,
            Route::Tasks,
            Route::Projects,
        ] {
            assert_eq!(
                resolve(route, &SessionState::SignedOut, &RoleState::Pending),
                RouteOutcome::Refused(GateDecision::RedirectLogin)
            );
        }
    }

    #[test]
    fn missing_role_record_refuses_every_protected_route() {
        for route in [Route::Home, Route::AdminDashboard, Route::Tasks] {
            assert_eq!(
                resolve(route, &signed_in(), &RoleState::Missing),
                RouteOutcome::Refused(GateDecision::RoleUnresolved)
            );
        }
    }
}
