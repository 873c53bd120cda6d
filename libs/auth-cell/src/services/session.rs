use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{ApiClient, TokenStore};
use shared_models::auth::{
    ChangePasswordRequest, CurrentUser, DecodedClaims, ForgotPasswordRequest, LoginRequest,
    LoginResponse, ResetPasswordRequest, SessionState,
};
use shared_models::error::AuthError;
use shared_utils::jwt::decode_token;

/// Session owner for the portal: signs employees in and out and answers
/// questions about the current session from the stored credential.
///
/// Nothing is cached. Every query re-reads the store, so a logout performed
/// elsewhere is seen on the next call.
pub struct AuthService {
    config: AppConfig,
    store: Arc<dyn TokenStore>,
    api: ApiClient,
}

impl AuthService {
    pub fn new(config: &AppConfig, store: Arc<dyn TokenStore>) -> Self {
        let api = ApiClient::new(store.clone());
        Self::with_api_client(config, store, api)
    }

    pub fn with_api_client(config: &AppConfig, store: Arc<dyn TokenStore>, api: ApiClient) -> Self {
        Self {
            config: config.clone(),
            store,
            api,
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Client sharing this service's token store, for the rest of the API.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Signs in and stores the issued credential.
    ///
    /// Failures of any kind come back as `None`; the caller shows its own
    /// message. Use [`AuthService::try_login`] to see why.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Option<LoginResponse> {
        match self.try_login(email, password).await {
            Ok(response) => Some(response),
            Err(AuthError::AuthenticationFailure(reason)) => {
                warn!("Login rejected: {}", reason);
                None
            }
            Err(e) => {
                error!("Login failed: {}", e);
                None
            }
        }
    }

    pub async fn try_login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: Option<LoginResponse> = self
            .api
            .post(&self.config.auth_url("login"), &request)
            .await?;

        let response = response.unwrap_or_default();
        let token = match response.token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(AuthError::AuthenticationFailure(
                    "response carried no token".to_string(),
                ))
            }
        };

        let role = match decode_token(token) {
            Ok(claims) => claims.role().map(str::to_string),
            Err(e) => {
                debug!("Issued credential could not be decoded: {}", e);
                None
            }
        };

        self.store.save(token, role.as_deref());
        info!(role = role.as_deref().unwrap_or("none"), "Session established");

        Ok(response)
    }

    pub fn get_token(&self) -> Option<String> {
        self.store.load()
    }

    fn decoded_claims(&self) -> Option<DecodedClaims> {
        let token = self.store.load()?;
        match decode_token(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("Stored credential could not be decoded: {}", e);
                None
            }
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session_state_at(Utc::now())
    }

    /// A credential without `exp` never expires.
    // TODO: treat a missing `exp` as expired once the API always issues one.
    pub fn session_state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.store.load().is_none() {
            return SessionState::Anonymous;
        }

        match self.decoded_claims() {
            Some(claims) if !claims.is_expired_at(now.timestamp()) => SessionState::Authenticated,
            _ => SessionState::Expired,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.session_state_at(now) == SessionState::Authenticated
    }

    /// Role from the credential, falling back to the hint saved at login.
    pub fn get_user_role(&self) -> Option<String> {
        let credential = self.store.load_credential()?;
        decode_token(&credential.token)
            .ok()
            .and_then(|claims| claims.role().map(str::to_string))
            .or(credential.role)
    }

    pub fn get_current_user(&self) -> Option<CurrentUser> {
        self.decoded_claims().map(CurrentUser::from)
    }

    pub fn logout(&self) {
        self.store.clear();
        info!("Session cleared");
    }

    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str, redirect_path: &str) -> Result<Value, AuthError> {
        let request = ForgotPasswordRequest {
            email: email.to_string(),
            redirect_path: redirect_path.to_string(),
        };
        self.api.post(&self.config.auth_url("forgot-password"), &request).await
    }

    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let request = ResetPasswordRequest {
            email: email.to_string(),
        };
        let _: Value = self.api.post(&self.config.auth_url("reset-password"), &request).await?;
        Ok(())
    }

    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<Value, AuthError> {
        let request = ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.api.post(&self.config.auth_url("change-password"), &request).await
    }
}
