use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::credentials::{CredentialError, CredentialProvider};
use crate::http::{decode, ApiError, ApiRequest, Transport};

/// The signed-in administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Login rejected: {0}")]
    Rejected(#[source] ApiError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Stored token is not a valid JWT: {0}")]
    InvalidToken(String),

    #[error("Stored token expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("Not signed in")]
    NoSession,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    user: AdminUser,
}

/// Claims we read from the backend-issued token. The signature is the
/// backend's business; we only need identity and expiry.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
    role: Option<String>,
    exp: Option<i64>,
}

/// Exchange email and password for a bearer token and store it.
pub async fn login(
    transport: &dyn Transport,
    credentials: &dyn CredentialProvider,
    email: &str,
    password: &str,
) -> Result<AdminUser, AuthError> {
    let request = ApiRequest::post("/auth/login").json(json!({
        "email": email,
        "password": password,
    }));
    let response = transport
        .send(request)
        .await
        .map_err(AuthError::Rejected)?;
    let login: LoginResponse = decode("login", response).map_err(AuthError::Rejected)?;

    credentials.store(login.access_token)?;
    tracing::info!(user = %login.user.email, "signed in");
    Ok(login.user)
}

pub fn logout(credentials: &dyn CredentialProvider) {
    credentials.clear();
    tracing::info!("signed out");
}

/// Rebuild the session from a stored token.
///
/// An undecodable or expired token is cleared from the provider before the
/// error is returned.
pub fn restore_session(
    credentials: &dyn CredentialProvider,
    now: DateTime<Utc>,
) -> Result<AdminUser, AuthError> {
    let token = credentials.token().ok_or(AuthError::NoSession)?;
    match user_from_token(&token, now) {
        Ok(user) => Ok(user),
        Err(e) => {
            tracing::warn!("Discarding stored token: {}", e);
            credentials.clear();
            Err(e)
        }
    }
}

fn user_from_token(token: &str, now: DateTime<Utc>) -> Result<AdminUser, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
    let claims = data.claims;

    let exp = claims
        .exp
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .ok_or_else(|| AuthError::InvalidToken("missing exp claim".to_string()))?;
    if exp <= now {
        return Err(AuthError::Expired(exp));
    }

    Ok(AdminUser {
        id: claims.sub.unwrap_or_else(|| "admin".to_string()),
        email: claims.email.unwrap_or_default(),
        name: claims.name.unwrap_or_else(|| "Admin User".to_string()),
        role: claims.role.unwrap_or_else(|| "admin".to_string()),
    })
}
