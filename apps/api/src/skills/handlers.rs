//! Axum route handlers for skills and skill categories.

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
use crate::db::{all_owned, is_unique_violation};
use crate::errors::AppError;
use crate::extract::ValidatedJson;
use crate::models::skill::{SkillCategoryRow, SkillRow};
use crate::skills::models::{
    group_by_category, CategoryInput, SkillInput, SkillsOverview, DEFAULT_CATEGORIES,
};
use crate::state::AppState;

const SKILL_NAME_TAKEN: &str = "Skill with this name already exists";

const SKILL_SELECT: &str = r#"
    SELECT s.id, s.user_id, s.category_id, sc.name AS category_name, s.name, s.level,
           s.years_experience, s.description, s.last_used_at,
           COALESCE(ARRAY_AGG(ps.project_id) FILTER (WHERE ps.project_id IS NOT NULL), '{}')
               AS project_ids,
           s.created_at, s.updated_at
    FROM skills s
    JOIN skill_categories sc ON sc.id = s.category_id
    LEFT JOIN project_skills ps ON ps.skill_id = s.id
"#;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SkillResponse {
    pub skill: SkillRow,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: SkillCategoryRow,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<SkillCategoryRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

/// Seeds the default categories the first time a user touches skills.
async fn ensure_default_categories(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    let names: Vec<String> = DEFAULT_CATEGORIES.iter().map(|n| n.to_string()).collect();
    let inserted = sqlx::query(
        r#"
        INSERT INTO skill_categories (user_id, name, "order")
        SELECT $1, t.name, (t.ord - 1)::INT
        FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS t(name, ord)
        WHERE NOT EXISTS (SELECT 1 FROM skill_categories WHERE user_id = $1)
        "#,
    )
    .bind(user_id)
    .bind(&names)
    .execute(db)
    .await?
    .rows_affected();

    if inserted > 0 {
        info!("Created {inserted} default skill categories for user {user_id}");
    }
    Ok(())
}

async fn list_categories(db: &PgPool, user_id: Uuid) -> Result<Vec<SkillCategoryRow>, AppError> {
    ensure_default_categories(db, user_id).await?;
    let rows = sqlx::query_as::<_, SkillCategoryRow>(
        r#"SELECT * FROM skill_categories WHERE user_id = $1 ORDER BY "order" ASC, name ASC"#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

async fn list_skills(db: &PgPool, user_id: Uuid) -> Result<Vec<SkillRow>, AppError> {
    let sql = format!(
        r#"{SKILL_SELECT} WHERE s.user_id = $1 GROUP BY s.id, sc.id ORDER BY sc."order" ASC, s.name ASC"#
    );
    let rows = sqlx::query_as::<_, SkillRow>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

async fn fetch_skill(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<SkillRow, AppError> {
    let sql = format!("{SKILL_SELECT} WHERE s.user_id = $1 AND s.id = $2 GROUP BY s.id, sc.id");
    sqlx::query_as::<_, SkillRow>(&sql)
        .bind(user_id)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found("Skill"))
}

/// Category and project ownership checks shared by create and update.
async fn check_references(
    conn: &mut PgConnection,
    user_id: Uuid,
    input: &SkillInput,
) -> Result<(), AppError> {
    if !all_owned(conn, "skill_categories", user_id, &[input.category_id]).await? {
        return Err(AppError::DomainRule("Category not found".to_string()));
    }
    if !all_owned(conn, "portfolio_items", user_id, &input.project_ids).await? {
        return Err(AppError::DomainRule(
            "One or more projects not found".to_string(),
        ));
    }
    Ok(())
}

async fn link_projects(
    conn: &mut PgConnection,
    skill_id: Uuid,
    project_ids: &[Uuid],
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO project_skills (skill_id, project_id)
        SELECT $1, UNNEST($2::UUID[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(skill_id)
    .bind(project_ids)
    .execute(conn)
    .await?;
    Ok(())
}

fn map_skill_write_error(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e, "skills_user_name_key") {
        AppError::DomainRule(SKILL_NAME_TAKEN.to_string())
    } else {
        AppError::Database(e)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skill handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/skills
pub async fn handle_list_skills(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SkillsOverview>, AppError> {
    let categories = list_categories(&state.db, user.id).await?;
    let skills = list_skills(&state.db, user.id).await?;
    Ok(Json(SkillsOverview {
        grouped: group_by_category(&categories, &skills),
        categories,
        skills,
    }))
}

/// POST /api/skills
pub async fn handle_create_skill(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<SkillInput>,
) -> Result<(StatusCode, Json<SkillResponse>), AppError> {
    let mut tx = state.db.begin().await?;
    check_references(&mut tx, user.id, &input).await?;

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM skills WHERE user_id = $1 AND name = $2)",
    )
    .bind(user.id)
    .bind(&input.name)
    .fetch_one(&mut *tx)
    .await?;
    if exists {
        return Err(AppError::DomainRule(SKILL_NAME_TAKEN.to_string()));
    }

    let skill_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO skills
            (user_id, category_id, name, level, years_experience, description, last_used_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(input.category_id)
    .bind(&input.name)
    .bind(input.level)
    .bind(input.years_experience)
    .bind(&input.description)
    .bind(input.last_used_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_skill_write_error)?;

    link_projects(&mut tx, skill_id, &input.project_ids).await?;
    tx.commit().await?;

    info!("Created skill {skill_id} for user {}", user.id);
    let skill = fetch_skill(&state.db, user.id, skill_id).await?;
    Ok((StatusCode::CREATED, Json(SkillResponse { skill })))
}

/// PUT /api/skills/:id
///
/// Full replace; project links are replaced with `projectIds`.
pub async fn handle_update_skill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<SkillInput>,
) -> Result<Json<SkillResponse>, AppError> {
    let mut tx = state.db.begin().await?;
    if !all_owned(&mut tx, "skills", user.id, &[id]).await? {
        return Err(AppError::not_found("Skill"));
    }
    check_references(&mut tx, user.id, &input).await?;

    let clash: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM skills WHERE user_id = $1 AND name = $2 AND id <> $3)",
    )
    .bind(user.id)
    .bind(&input.name)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    if clash {
        return Err(AppError::DomainRule(SKILL_NAME_TAKEN.to_string()));
    }

    sqlx::query(
        r#"
        UPDATE skills
        SET category_id = $3, name = $4, level = $5, years_experience = $6,
            description = $7, last_used_at = $8, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(input.category_id)
    .bind(&input.name)
    .bind(input.level)
    .bind(input.years_experience)
    .bind(&input.description)
    .bind(input.last_used_at)
    .execute(&mut *tx)
    .await
    .map_err(map_skill_write_error)?;

    sqlx::query("DELETE FROM project_skills WHERE skill_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    link_projects(&mut tx, id, &input.project_ids).await?;
    tx.commit().await?;

    let skill = fetch_skill(&state.db, user.id, id).await?;
    Ok(Json(SkillResponse { skill }))
}

/// DELETE /api/skills/:id
pub async fn handle_delete_skill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM skills WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::not_found("Skill"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Category handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/skills/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CategoriesResponse>, AppError> {
    let categories = list_categories(&state.db, user.id).await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// POST /api/skills/categories
pub async fn handle_create_category(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let category = sqlx::query_as::<_, SkillCategoryRow>(
        r#"INSERT INTO skill_categories (user_id, name, "order") VALUES ($1, $2, $3) RETURNING *"#,
    )
    .bind(user.id)
    .bind(&input.name)
    .bind(input.order)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse { category })))
}

/// PUT /api/skills/categories/:id
pub async fn handle_update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = sqlx::query_as::<_, SkillCategoryRow>(
        r#"
        UPDATE skill_categories SET name = $3, "order" = $4
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(&input.name)
    .bind(input.order)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Category"))?;
    Ok(Json(CategoryResponse { category }))
}

/// DELETE /api/skills/categories/:id
pub async fn handle_delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db.begin().await?;
    if !all_owned(&mut tx, "skill_categories", user.id, &[id]).await? {
        return Err(AppError::not_found("Category"));
    }

    let in_use: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM skills WHERE category_id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
    if in_use {
        return Err(AppError::DomainRule(
            "Cannot delete category with existing skills".to_string(),
        ));
    }

    sqlx::query("DELETE FROM skill_categories WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
