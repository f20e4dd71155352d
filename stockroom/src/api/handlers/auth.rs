//! Login and logout.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::{
    AppState,
    api::models::{
        auth::{LoginRequest, LoginResponse},
        users::CurrentUser,
    },
    auth::{password, session},
    db::errors::DbError,
    db::handlers::users::UsersStorage,
    errors::{Error, Result},
};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

/// Authenticate with email and password, receiving a bearer token.
///
/// A successful login replaces any previously issued token for the account.
#[instrument(skip_all, fields(email = %request.email))]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>> {
    let ctx = state.data.context();
    let users = UsersStorage::new();

    // An unknown email and a wrong password produce the same response.
    let mut user = match users.find_by_email(&ctx, &request.email).await {
        Ok(user) => user,
        Err(DbError::NotFound) => return Err(invalid_credentials()),
        Err(e) => return Err(e.into()),
    };

    if !password::verify_string(&request.password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    let (issued, user) = state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            let issued = session::issue_session(&mut user);
            UsersStorage::new().update(&tx_ctx, &mut user).await?;
            Ok((issued, user))
        })
        .await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: user.into(),
    }))
}

/// Invalidate the current session token.
#[instrument(skip_all, fields(user_id = current.id))]
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> Result<StatusCode> {
    let ctx = state.data.context();
    state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            let users = UsersStorage::new();
            let mut user = users.find_by_id(&tx_ctx, current.id).await?;
            session::revoke_session(&mut user);
            users.update(&tx_ctx, &mut user).await?;
            Ok(())
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
