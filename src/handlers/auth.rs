// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    handlers::tests::{fetch_attempts, insert_attempt},
    error::ErrorResponse,
    models::{
        SuccessResponse,
        attempt::HistoryEntryRequest,
        user::{AuthUser, LoginRequest, RegisterRequest, User, UserResponse},
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

const USER_COLUMNS: &str = "id, username, email, password, full_name, created_at";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the user, an empty history and a token.
/// A taken username or email is a 400.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input or user already exists", body = ErrorResponse)
    )
)]
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let taken: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE username = ? OR email = ? LIMIT 1")
            .bind(&payload.username)
            .bind(&payload.email)
            .fetch_optional(&pool)
            .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user: User = sqlx::query_as(&format!(
        r#"
        INSERT INTO users (username, email, password, full_name, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(&payload.full_name)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Lost a race with a concurrent registration.
        if is_unique_violation(&e) {
            AppError::BadRequest("User already exists".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new(user, Vec::new(), Some(token))),
    ))
}

/// Authenticates a user and returns their profile, history and a JWT.
///
/// Unknown usernames and wrong passwords get the same 401.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = UserResponse),
        (status = 401, description = "Invalid username or password", body = ErrorResponse)
    )
)]
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user: Option<User> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
            .bind(&payload.username)
            .fetch_optional(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Login DB error: {:?}", e);
                AppError::from(e)
            })?;

    let invalid = || AppError::AuthError("Invalid username or password".to_string());
    let user = user.ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password)? {
        tracing::info!(username = %user.username, "Rejected login: bad password");
        return Err(invalid());
    }

    let history = fetch_attempts(&pool, user.id, None).await?;
    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(UserResponse::new(user, history, Some(token))))
}

/// Logs out the current user.
///
/// Tokens are stateless, so this only acknowledges; the client drops its copy.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = SuccessResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn logout(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    tracing::info!(user_id = user.id, username = %user.username, "User logged out");
    Json(SuccessResponse::ok())
}

/// Returns the authenticated user's profile and attempt history.
#[utoipa::path(
    get,
    path = "/auth/current-user",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn current_user(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let user: User = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(auth.id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let history = fetch_attempts(&pool, user.id, None).await?;
    Ok(Json(UserResponse::new(user, history, None)))
}

/// Appends a finished attempt (score and question count, no answers) to the
/// user's history.
#[utoipa::path(
    post,
    path = "/auth/test-history",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = HistoryEntryRequest,
    responses(
        (status = 200, description = "Entry stored", body = SuccessResponse),
        (status = 400, description = "Invalid entry", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn add_test_history(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<HistoryEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let attempt = insert_attempt(
        &pool,
        auth.id,
        payload.test_id,
        payload.date,
        payload.score,
        payload.total_questions,
        &[],
    )
    .await?;

    tracing::debug!(attempt_id = attempt.id, user_id = auth.id, "History entry stored");
    Ok(Json(SuccessResponse::ok()))
}
