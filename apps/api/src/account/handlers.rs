//! Account endpoints: the caller's own user record.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::ValidatedJson;
use crate::state::AppState;

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserSummary,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateInput {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,
}

/// GET /api/user
pub async fn handle_get_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, UserSummary>(
        "SELECT id, email, full_name FROM users WHERE id = $1",
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(UserResponse { user }))
}

/// PUT /api/user
pub async fn handle_update_user(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<UserUpdateInput>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = sqlx::query_as::<_, UserSummary>(
        "UPDATE users SET full_name = $2 WHERE id = $1 RETURNING id, email, full_name",
    )
    .bind(user.id)
    .bind(input.full_name.trim())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("User"))?;

    info!("Updated name for user {}", user.id);
    Ok(Json(UserResponse { user: updated }))
}
