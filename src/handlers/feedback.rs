// src/handlers/feedback.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    catalog,
    error::{AppError, ErrorResponse},
    feedback::{self, Feedback},
    handlers::tests::score_samples,
    models::user::AuthUser,
};

/// Generates study feedback for the current user from their attempts.
///
/// 404 when no tests exist at all.
#[utoipa::path(
    post,
    path = "/ai/feedback",
    tag = "ai",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Study feedback", body = Feedback),
        (status = 404, description = "No tests found", body = ErrorResponse)
    )
)]
pub async fn generate_feedback(
    State(pool): State<SqlitePool>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let titles = catalog::load_titles(&pool).await?;
    if titles.is_empty() {
        return Err(AppError::NotFound("No tests found".to_string()));
    }

    let full_name: Option<(String,)> = sqlx::query_as("SELECT full_name FROM users WHERE id = ?")
        .bind(user.id)
        .fetch_optional(&pool)
        .await?;

    let samples = score_samples(&pool, user.id).await?;

    let feedback = feedback::generate(
        full_name.as_ref().map(|(name,)| name.as_str()),
        &samples,
        &titles,
    );
    Ok(Json(feedback))
}
