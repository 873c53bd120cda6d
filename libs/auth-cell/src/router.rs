use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::services::AuthService;

pub fn auth_routes(state: Arc<AuthService>) -> Router {
    Router::new()
        .route("/login", get(handlers::login_screen).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/session", get(handlers::session))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password", post(handlers::reset_password))
        .route("/change-password", post(handlers::change_password))
        .with_state(state)
}
