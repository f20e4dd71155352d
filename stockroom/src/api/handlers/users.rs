//! User management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::instrument;

use crate::{
    AppState,
    api::models::{
        pagination::ListResponse,
        users::{CreateUserRequest, CurrentUser, ListUsersQuery, UpdatePasswordRequest, UpdateUserRequest, UserResponse},
    },
    auth::password,
    db::errors::DbError,
    db::handlers::users::{UserParams, UsersStorage},
    db::models::users::User,
    errors::{Error, Result},
};

fn email_taken(err: Error) -> Error {
    match err {
        Error::Database(DbError::AlreadyExists) => Error::Unprocessable {
            message: "An account with this email address already exists".to_string(),
        },
        other => other,
    }
}

/// List users, optionally filtered by a name search.
#[instrument(skip(state, _current))]
pub async fn list_users(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListResponse<UserResponse>>> {
    let ctx = state.data.context();
    let users = UsersStorage::new();

    let params = UserParams {
        search: query.search,
        page: query.page,
        limit: query.limit,
        ..Default::default()
    };
    let rows = users.find_all(&ctx, &params).await?;
    // The count covers the whole filtered set, not just this page.
    let count = users.count_all(&ctx, &params).await?;

    Ok(Json(ListResponse {
        data: rows.into_iter().map(UserResponse::from).collect(),
        count,
    }))
}

/// Register a new account. This endpoint is public.
#[instrument(skip_all, fields(email = %request.email))]
pub async fn create_user(State(state): State<AppState>, Json(request): Json<CreateUserRequest>) -> Result<(StatusCode, Json<UserResponse>)> {
    request.validate()?;

    let password_hash = password::hash_string(&request.password)?;
    let mut user = User {
        id: 0,
        name: request.name,
        email: request.email,
        password_hash,
        token: None,
        token_expired_at: None,
        created_at: Utc::now(),
        updated_at: None,
        deleted_at: None,
    };

    let ctx = state.data.context();
    let user = state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            UsersStorage::new().insert(&tx_ctx, &mut user).await?;
            Ok(user)
        })
        .await
        .map_err(email_taken)?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Update a user's name and email.
#[instrument(skip(state, _current, request))]
pub async fn update_user(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let ctx = state.data.context();
    let user = state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            let users = UsersStorage::new();
            let mut user = users.find_by_id(&tx_ctx, id).await?;

            if let Some(name) = request.name.filter(|n| !n.trim().is_empty()) {
                user.name = name;
            }
            if let Some(email) = request.email.filter(|e| e.contains('@')) {
                user.email = email;
            }

            users.update(&tx_ctx, &mut user).await?;
            Ok(user)
        })
        .await
        .map_err(email_taken)?;

    Ok(Json(user.into()))
}

/// Change the signed-in user's password.
///
/// Requires the current password; an incorrect one is an authentication
/// failure, not a validation error.
#[instrument(skip_all, fields(user_id = current.id))]
pub async fn update_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<StatusCode> {
    if request.new_password.len() < 8 {
        return Err(Error::BadRequest {
            message: "password must be at least 8 characters".to_string(),
        });
    }

    let ctx = state.data.context();
    state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            let users = UsersStorage::new();
            let mut user = users.find_by_id(&tx_ctx, current.id).await?;

            if !password::verify_string(&request.old_password, &user.password_hash)? {
                return Err(Error::Unauthenticated {
                    message: Some("Current password is incorrect".to_string()),
                });
            }

            user.password_hash = password::hash_string(&request.new_password)?;
            users.update(&tx_ctx, &mut user).await?;
            Ok(())
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Soft-delete a user.
#[instrument(skip(state, _current))]
pub async fn delete_user(State(state): State<AppState>, _current: CurrentUser, Path(id): Path<i64>) -> Result<StatusCode> {
    let ctx = state.data.context();
    state
        .data
        .run_in_transaction::<_, Error, _, _>(&ctx, |tx_ctx| async move {
            UsersStorage::new().delete(&tx_ctx, id).await.map_err(Error::from)
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, login_user, register_user};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn registration_round_trip(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/v1/users")
            .json(&json!({"name": "Ada", "email": "ada@example.com", "password": "correct horse"}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("password_hash").is_none());
        assert!(body.get("token").is_none());
    }

    #[sqlx::test]
    async fn registration_rejects_invalid_input(pool: PgPool) {
        let server = create_test_app(pool).await;

        let bad_email = server
            .post("/v1/users")
            .json(&json!({"name": "Ada", "email": "nope", "password": "correct horse"}))
            .await;
        bad_email.assert_status_bad_request();

        let short_password = server
            .post("/v1/users")
            .json(&json!({"name": "Ada", "email": "ada@example.com", "password": "short"}))
            .await;
        short_password.assert_status_bad_request();
    }

    #[sqlx::test]
    async fn duplicate_registration_is_unprocessable(pool: PgPool) {
        let server = create_test_app(pool).await;
        register_user(&server, "Ada", "ada@example.com", "correct horse").await;

        let duplicate = server
            .post("/v1/users")
            .json(&json!({"name": "Other Ada", "email": "ada@example.com", "password": "correct horse"}))
            .await;
        duplicate.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[sqlx::test]
    async fn listing_supports_search_and_pagination(pool: PgPool) {
        let server = create_test_app(pool).await;
        register_user(&server, "Ada Lovelace", "ada@example.com", "correct horse").await;
        register_user(&server, "Grace Hopper", "grace@example.com", "correct horse").await;
        register_user(&server, "Ada Yonath", "yonath@example.com", "correct horse").await;
        let token = login_user(&server, "ada@example.com", "correct horse").await;

        let response = server
            .get("/v1/users")
            .add_query_param("search", "ada")
            .add_query_param("page", "1")
            .add_query_param("limit", "1")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["count"], 2);
    }

    #[sqlx::test]
    async fn update_and_delete_user(pool: PgPool) {
        let server = create_test_app(pool).await;
        let user_id = register_user(&server, "Ada", "ada@example.com", "correct horse").await;
        let token = login_user(&server, "ada@example.com", "correct horse").await;

        let update = server
            .put(&format!("/v1/users/{user_id}"))
            .authorization_bearer(&token)
            .json(&json!({"name": "Ada Lovelace"}))
            .await;
        update.assert_status_ok();
        assert_eq!(update.json::<serde_json::Value>()["name"], "Ada Lovelace");

        let delete = server.delete(&format!("/v1/users/{user_id}")).authorization_bearer(&token).await;
        delete.assert_status(axum::http::StatusCode::NO_CONTENT);

        let delete_again = server.delete(&format!("/v1/users/{user_id}")).authorization_bearer(&token).await;
        delete_again.assert_status_not_found();
    }

    #[sqlx::test]
    async fn password_change_requires_the_old_password(pool: PgPool) {
        let server = create_test_app(pool).await;
        register_user(&server, "Ada", "ada@example.com", "correct horse").await;
        let token = login_user(&server, "ada@example.com", "correct horse").await;

        let wrong_old = server
            .put("/v1/users/password")
            .authorization_bearer(&token)
            .json(&json!({"old_password": "battery staple", "new_password": "new password 1"}))
            .await;
        wrong_old.assert_status_unauthorized();

        let change = server
            .put("/v1/users/password")
            .authorization_bearer(&token)
            .json(&json!({"old_password": "correct horse", "new_password": "new password 1"}))
            .await;
        change.assert_status(axum::http::StatusCode::NO_CONTENT);

        // Old password no longer works, new one does
        let old_login = server
            .post("/v1/login")
            .json(&json!({"email": "ada@example.com", "password": "correct horse"}))
            .await;
        old_login.assert_status_unauthorized();

        let new_login = server
            .post("/v1/login")
            .json(&json!({"email": "ada@example.com", "password": "new password 1"}))
            .await;
        new_login.assert_status_ok();
    }
}
