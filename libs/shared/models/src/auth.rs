use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";
pub const FIRST_NAME_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
pub const LAST_NAME_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

/// Payload segment of a credential, as issued by the authentication API.
///
/// Every field is kept as a raw JSON value. Issuers disagree on claim types
/// (numeric subjects, fractional `exp`), and a well-formed payload must never
/// fail to decode because of them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Option<Value>,
    pub exp: Option<Value>,
    pub email: Option<Value>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<Value>,
    #[serde(rename = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role")]
    pub namespaced_role: Option<Value>,
    pub role: Option<Value>,
    #[serde(rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name")]
    pub first_name: Option<Value>,
    #[serde(rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier")]
    pub last_name: Option<Value>,
}

fn claim_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Rounded up so that `exp <= now` holds exactly when the fractional
// NumericDate has been reached.
fn claim_seconds(value: Value) -> Option<i64> {
    let secs = match value {
        Value::Number(n) => match n.as_i64() {
            Some(whole) => return Some(whole),
            None => n.as_f64()?,
        },
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    secs.is_finite().then(|| secs.ceil() as i64)
}

/// A role claim is issued either as a single value or as an array when the
/// account holds several roles.
fn claim_roles(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(claim_text).collect(),
        other => claim_text(other).into_iter().collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedClaims {
    pub subject: Option<String>,
    /// Seconds since the Unix epoch. Absent means the credential never expires.
    pub expiration: Option<i64>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
}

impl DecodedClaims {
    pub fn role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }

    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        match self.expiration {
            Some(exp) => exp <= now_secs,
            None => false,
        }
    }
}

impl From<JwtClaims> for DecodedClaims {
    fn from(claims: JwtClaims) -> Self {
        let roles = claims
            .namespaced_role
            .or(claims.role)
            .map(claim_roles)
            .unwrap_or_default();

        Self {
            subject: claims.sub.and_then(claim_text),
            expiration: claims.exp.and_then(claim_seconds),
            email: claims.email.and_then(claim_text),
            phone_number: claims.phone_number.and_then(claim_text),
            first_name: claims.first_name.and_then(claim_text),
            last_name: claims.last_name.and_then(claim_text),
            roles,
        }
    }
}

/// View of the signed-in employee, rebuilt from the stored credential on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub roles: Vec<String>,
}

impl From<DecodedClaims> for CurrentUser {
    fn from(claims: DecodedClaims) -> Self {
        Self {
            id: claims.subject.unwrap_or_default(),
            first_name: claims.first_name.unwrap_or_default(),
            last_name: claims.last_name.unwrap_or_default(),
            email: claims.email.unwrap_or_default(),
            phone_number: claims.phone_number.unwrap_or_default(),
            roles: claims.roles,
        }
    }
}

/// Persisted envelope: the credential plus the role hint captured at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
    pub redirect_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginStatus {
    pub authenticated: bool,
    pub role: Option<String>,
    pub redirect: String,
}
