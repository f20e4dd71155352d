//! Session tokens.
//!
//! Sessions are opaque bearer tokens stored on the user row with an expiry.
//! Issuing a new token replaces any previous one, so each account has a
//! single active session.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::api::models::users::CurrentUser;
use crate::db::StorageContext;
use crate::db::errors::DbError;
use crate::db::handlers::users::UsersStorage;
use crate::db::models::users::User;
use crate::errors::{Error, Result};

/// How long an issued session token stays valid
pub const SESSION_TTL: Duration = Duration::hours(72);

/// Generate an opaque session token.
pub fn generate_session_token() -> String {
    // 32 bytes (256 bits) of cryptographically secure random data
    let mut token_bytes = [0u8; 32];
    rand::rng().fill(&mut token_bytes);

    // Encode as base64url without padding
    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Stamp a fresh session token onto the user record (not yet persisted).
pub fn issue_session(user: &mut User) -> IssuedSession {
    let token = generate_session_token();
    let expires_at = Utc::now() + SESSION_TTL;
    user.token = Some(token.clone());
    user.token_expired_at = Some(expires_at);
    IssuedSession { token, expires_at }
}

/// Clear the user's session token (not yet persisted).
pub fn revoke_session(user: &mut User) {
    user.token = None;
    user.token_expired_at = None;
}

/// Resolve a bearer token to the signed-in user.
///
/// Unknown and expired tokens are indistinguishable to the caller; both come
/// back as an authentication failure.
pub async fn authenticate_token(ctx: &StorageContext, token: &str) -> Result<CurrentUser> {
    let user = match UsersStorage::new().find_by_token(ctx, token).await {
        Ok(user) => user,
        Err(DbError::NotFound) => {
            return Err(Error::Unauthenticated {
                message: Some("Invalid session token".to_string()),
            });
        }
        Err(e) => return Err(e.into()),
    };

    match user.token_expired_at {
        Some(expires_at) if expires_at > Utc::now() => Ok(CurrentUser {
            id: user.id,
            name: user.name,
            email: user.email,
        }),
        _ => Err(Error::Unauthenticated {
            message: Some("Session expired".to_string()),
        }),
    }
}
