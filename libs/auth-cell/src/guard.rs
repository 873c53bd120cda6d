use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::AuthService;

pub const LOGIN_PATH: &str = "/auth/login";
pub const ACCESS_DENIED_PATH: &str = "/access-denied";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectTo(String),
}

/// Roles a route admits, declared alongside the route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAccess {
    pub required_roles: Vec<String>,
}

impl RouteAccess {
    pub fn roles(roles: &[&str]) -> Self {
        Self {
            required_roles: roles.iter().map(|role| role.to_string()).collect(),
        }
    }

    pub fn permits(&self, role: &str) -> bool {
        self.required_roles.iter().any(|required| required == role)
    }
}

pub fn can_activate(auth: &AuthService, access: &RouteAccess) -> GuardDecision {
    can_activate_at(auth, access, Utc::now())
}

pub fn can_activate_at(auth: &AuthService, access: &RouteAccess, now: DateTime<Utc>) -> GuardDecision {
    if !auth.is_authenticated_at(now) {
        return GuardDecision::RedirectTo(LOGIN_PATH.to_string());
    }

    match auth.get_user_role() {
        Some(role) if access.permits(&role) => GuardDecision::Allow,
        _ => GuardDecision::RedirectTo(ACCESS_DENIED_PATH.to_string()),
    }
}

/// Where a freshly signed-in user lands.
pub fn landing_path(role: Option<&str>) -> &'static str {
    match role.map(str::to_lowercase).as_deref() {
        Some("admin") => "/admin/dashboard",
        Some("manager") => "/manager/dashboard",
        Some("employe") => "/employe/dashboard",
        _ => LOGIN_PATH,
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    auth: Arc<AuthService>,
    access: Arc<RouteAccess>,
}

impl RouteGuard {
    pub fn new(auth: Arc<AuthService>, access: RouteAccess) -> Self {
        Self {
            auth,
            access: Arc::new(access),
        }
    }

    pub fn decide(&self) -> GuardDecision {
        can_activate(&self.auth, &self.access)
    }
}

// Evaluated on every request, never cached between navigations.
pub async fn guard_middleware(
    State(guard): State<RouteGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match guard.decide() {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::RedirectTo(path) => {
            debug!("Guard redirecting {} to {}", request.uri(), path);
            Redirect::to(&path).into_response()
        }
    }
}

/// Puts every route of `router` behind the guard.
pub fn protect<S>(router: Router<S>, guard: RouteGuard) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(guard, guard_middleware))
}
