//! Axum route handlers for work experience.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::all_owned;
use crate::errors::AppError;
use crate::experience::models::ExperienceInput;
use crate::extract::ValidatedJson;
use crate::models::experience::ExperienceRow;
use crate::state::AppState;

const EXPERIENCE_SELECT: &str = r#"
    SELECT e.*,
           COALESCE((SELECT ARRAY_AGG(ep.project_id) FROM experience_projects ep
                     WHERE ep.experience_id = e.id), '{}') AS project_ids,
           COALESCE((SELECT ARRAY_AGG(es.skill_id) FROM experience_skills es
                     WHERE es.experience_id = e.id), '{}') AS skill_ids
    FROM experiences e
"#;

#[derive(Debug, Serialize)]
pub struct ExperienceResponse {
    pub experience: ExperienceRow,
}

#[derive(Debug, Serialize)]
pub struct ExperiencesResponse {
    pub experiences: Vec<ExperienceRow>,
}

async fn fetch_experience(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<ExperienceRow, AppError> {
    let sql = format!("{EXPERIENCE_SELECT} WHERE e.user_id = $1 AND e.id = $2");
    sqlx::query_as::<_, ExperienceRow>(&sql)
        .bind(user_id)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found("Experience"))
}

/// Replaces the project and skill links of an experience.
async fn replace_links(
    conn: &mut PgConnection,
    user_id: Uuid,
    experience_id: Uuid,
    input: &ExperienceInput,
) -> Result<(), AppError> {
    if !all_owned(conn, "skills", user_id, &input.skill_ids).await? {
        return Err(AppError::DomainRule("One or more skills not found".to_string()));
    }
    if !all_owned(conn, "portfolio_items", user_id, &input.project_ids).await? {
        return Err(AppError::DomainRule(
            "One or more projects not found".to_string(),
        ));
    }

    sqlx::query("DELETE FROM experience_projects WHERE experience_id = $1")
        .bind(experience_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM experience_skills WHERE experience_id = $1")
        .bind(experience_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO experience_projects (experience_id, project_id)
        SELECT $1, UNNEST($2::UUID[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(experience_id)
    .bind(&input.project_ids)
    .execute(&mut *conn)
    .await?;
    sqlx::query(
        r#"
        INSERT INTO experience_skills (experience_id, skill_id)
        SELECT $1, UNNEST($2::UUID[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(experience_id)
    .bind(&input.skill_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// GET /api/experience
pub async fn handle_list_experiences(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ExperiencesResponse>, AppError> {
    let sql = format!("{EXPERIENCE_SELECT} WHERE e.user_id = $1 ORDER BY e.start_date DESC");
    let experiences = sqlx::query_as::<_, ExperienceRow>(&sql)
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(ExperiencesResponse { experiences }))
}

/// GET /api/experience/:id
pub async fn handle_get_experience(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ExperienceResponse>, AppError> {
    let experience = fetch_experience(&state.db, user.id, id).await?;
    Ok(Json(ExperienceResponse { experience }))
}

/// POST /api/experience
pub async fn handle_create_experience(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<ExperienceInput>,
) -> Result<(StatusCode, Json<ExperienceResponse>), AppError> {
    let mut tx = state.db.begin().await?;
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO experiences
            (user_id, company, role, employment_type, location, start_date, end_date, bullets)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(&input.company)
    .bind(&input.role)
    .bind(input.employment_type.as_str())
    .bind(&input.location)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(&input.bullets)
    .fetch_one(&mut *tx)
    .await?;

    replace_links(&mut tx, user.id, id, &input).await?;
    tx.commit().await?;

    info!("Created experience {id} for user {}", user.id);
    let experience = fetch_experience(&state.db, user.id, id).await?;
    Ok((StatusCode::CREATED, Json(ExperienceResponse { experience })))
}

/// PUT /api/experience/:id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<ExperienceInput>,
) -> Result<Json<ExperienceResponse>, AppError> {
    let mut tx = state.db.begin().await?;
    let updated = sqlx::query(
        r#"
        UPDATE experiences
        SET company = $3, role = $4, employment_type = $5, location = $6,
            start_date = $7, end_date = $8, bullets = $9, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(&input.company)
    .bind(&input.role)
    .bind(input.employment_type.as_str())
    .bind(&input.location)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(&input.bullets)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(AppError::not_found("Experience"));
    }

    replace_links(&mut tx, user.id, id, &input).await?;
    tx.commit().await?;

    let experience = fetch_experience(&state.db, user.id, id).await?;
    Ok(Json(ExperienceResponse { experience }))
}

/// DELETE /api/experience/:id
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM experiences WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::not_found("Experience"));
    }
    Ok(StatusCode::NO_CONTENT)
}
