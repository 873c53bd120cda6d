use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use auth_cell::{auth_routes, protect, AuthService, RouteAccess, RouteGuard, ACCESS_DENIED_PATH, LOGIN_PATH};

/// Sections of the portal and the roles admitted to each.
const SECTIONS: [(&str, &str); 3] = [
    ("/admin", "admin"),
    ("/manager", "manager"),
    ("/employe", "employe"),
];

pub fn create_router(auth: Arc<AuthService>) -> Router {
    let mut router = Router::new()
        .route("/", get(|| async { Redirect::to(LOGIN_PATH) }))
        .nest("/auth", auth_routes(auth.clone()))
        .route(ACCESS_DENIED_PATH, get(access_denied));

    for (prefix, role) in SECTIONS {
        router = router.nest(prefix, section_routes(auth.clone(), role));
    }

    router.fallback(not_found)
}

fn section_routes(auth: Arc<AuthService>, role: &'static str) -> Router {
    let guard = RouteGuard::new(auth.clone(), RouteAccess::roles(&[role]));
    let routes = Router::new()
        .route("/dashboard", get(move |state: State<Arc<AuthService>>| dashboard(state, role)))
        .with_state(auth);

    protect(routes, guard)
}

// Screens are rendered by the front-end; the shell only confirms who is in.
async fn dashboard(State(auth): State<Arc<AuthService>>, section: &'static str) -> Json<Value> {
    Json(json!({
        "section": section,
        "user": auth.get_current_user(),
    }))
}

async fn access_denied() -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Access denied" })),
    )
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Page not found" })),
    )
}
