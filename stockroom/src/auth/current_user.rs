//! Request extractor for the authenticated user.
//!
//! Handlers take a [`CurrentUser`] argument to require authentication; the
//! extractor resolves the bearer token against the users table on every
//! request.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{AppState, api::models::users::CurrentUser, auth::session, errors::Error};

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(Error::Unauthenticated {
                message: Some("Missing Authorization header".to_string()),
            })?;

        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        if token.is_empty() {
            return Err(Error::Unauthenticated {
                message: Some("Missing bearer token".to_string()),
            });
        }

        session::authenticate_token(&state.data.context(), token).await
    }
}
