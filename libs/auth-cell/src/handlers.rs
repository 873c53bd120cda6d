use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Redirect,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::{
    ChangePasswordRequest, CurrentUser, ForgotPasswordRequest, LoginRequest, LoginStatus,
    ResetPasswordRequest,
};
use shared_models::error::AuthError;

use crate::guard::{landing_path, LOGIN_PATH};
use crate::services::AuthService;

pub async fn login_screen(State(auth): State<Arc<AuthService>>) -> Json<Value> {
    let role = auth.get_user_role();
    let authenticated = auth.is_authenticated();
    let redirect = if authenticated {
        landing_path(role.as_deref())
    } else {
        LOGIN_PATH
    };
    Json(json!({
        "authenticated": authenticated,
        "redirect": redirect,
    }))
}

pub async fn login(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginStatus>, AuthError> {
    debug!("Login attempt");

    if auth.login(&request.email, &request.password).await.is_none() {
        return Err(AuthError::AuthenticationFailure(
            "Incorrect email or password".to_string(),
        ));
    }

    let role = auth.get_user_role();
    Ok(Json(LoginStatus {
        authenticated: auth.is_authenticated(),
        redirect: landing_path(role.as_deref()).to_string(),
        role,
    }))
}

pub async fn logout(State(auth): State<Arc<AuthService>>) -> Redirect {
    auth.logout();
    Redirect::to(LOGIN_PATH)
}

pub async fn session(State(auth): State<Arc<AuthService>>) -> Result<Json<CurrentUser>, AuthError> {
    if !auth.is_authenticated() {
        return Err(AuthError::AuthenticationFailure("No active session".to_string()));
    }

    auth.get_current_user()
        .map(Json)
        .ok_or_else(|| AuthError::AuthenticationFailure("No active session".to_string()))
}

pub async fn forgot_password(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, AuthError> {
    let response = auth
        .forgot_password(&request.email, &request.redirect_path)
        .await?;
    Ok(Json(response))
}

pub async fn reset_password(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    auth.reset_password(&request.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_password(
    State(auth): State<Arc<AuthService>>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AuthError> {
    let response = auth
        .change_password(&request.old_password, &request.new_password)
        .await?;
    Ok(Json(response))
}
