use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use shared_config::{AppConfig, DEFAULT_STORAGE_KEY};
use shared_models::auth::{FIRST_NAME_CLAIM, LAST_NAME_CLAIM, ROLE_CLAIM};

pub const TEST_SIGNING_SECRET: &str = "test-secret-key-for-jwt-signing-must-be-long-enough";

pub struct TestConfig {
    pub api_base_url: String,
    pub auth_path: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:7082".to_string(),
            auth_path: "/api/Auth".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            auth_path: self.auth_path.clone(),
            storage_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
        }
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "employe")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role: role.to_string(),
        }
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn manager(email: &str) -> Self {
        Self::new(email, "manager")
    }

    pub fn employe(email: &str) -> Self {
        Self::new(email, "employe")
    }

    pub fn claims(&self) -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!(self.id));
        claims.insert("email".to_string(), json!(self.email));
        claims.insert(ROLE_CLAIM.to_string(), json!(self.role));
        claims.insert(FIRST_NAME_CLAIM.to_string(), json!(self.first_name));
        claims.insert(LAST_NAME_CLAIM.to_string(), json!(self.last_name));
        claims
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// Signs an arbitrary claim set the way the authentication API does.
    pub fn sign_claims(claims: &Value) -> String {
        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SIGNING_SECRET.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_test_token(user: &TestUser, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));
        Self::create_token_expiring_at(user, exp.timestamp())
    }

    pub fn create_token_expiring_at(user: &TestUser, exp: i64) -> String {
        let mut claims = user.claims();
        claims.insert("iat".to_string(), json!(Utc::now().timestamp()));
        claims.insert("exp".to_string(), json!(exp));
        Self::sign_claims(&Value::Object(claims))
    }

    pub fn create_token_without_expiration(user: &TestUser) -> String {
        Self::sign_claims(&Value::Object(user.claims()))
    }

    pub fn create_expired_token(user: &TestUser) -> String {
        Self::create_test_token(user, Some(-1))
    }

    /// Token whose role sits under the plain `role` key only.
    pub fn create_legacy_token(user: &TestUser) -> String {
        let mut claims = user.claims();
        claims.remove(ROLE_CLAIM);
        claims.insert("role".to_string(), json!(user.role));
        claims.insert("exp".to_string(), json!((Utc::now() + Duration::hours(24)).timestamp()));
        Self::sign_claims(&Value::Object(claims))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockAuthResponses;

impl MockAuthResponses {
    pub fn login_success(token: &str) -> Value {
        json!({
            "token": token,
            "message": "Login successful"
        })
    }

    pub fn login_without_token() -> Value {
        json!({})
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "message": message
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::decode_token;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.api_base_url, "http://localhost:7082");
        assert_eq!(config.auth_url("login"), "http://localhost:7082/api/Auth/login");
        assert!(config.storage_dir.is_none());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::manager("lead@example.com");
        assert_eq!(user.email, "lead@example.com");
        assert_eq!(user.role, "manager");
        assert_eq!(user.claims()[ROLE_CLAIM], "manager");
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, Some(1));

        assert_eq!(token.split('.').count(), 3);

        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.subject.as_deref(), Some(user.id.as_str()));
        assert_eq!(claims.role(), Some("employe"));
        assert!(claims.expiration.is_some());
    }

    #[test]
    fn test_legacy_token_has_plain_role_only() {
        let user = TestUser::admin("root@example.com");
        let claims = decode_token(&JwtTestUtils::create_legacy_token(&user)).unwrap();
        assert_eq!(claims.role(), Some("admin"));
    }

    #[test]
    fn test_malformed_token_does_not_decode() {
        assert!(decode_token(&JwtTestUtils::create_malformed_token()).is_err());
    }
}
