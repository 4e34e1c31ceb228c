//! Axum route handlers for portfolio items.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::all_owned;
use crate::errors::AppError;
use crate::extract::ValidatedJson;
use crate::models::portfolio::PortfolioItemRow;
use crate::portfolio::models::{PortfolioItemInput, PortfolioItemPatch};
use crate::state::AppState;

const PORTFOLIO_SELECT: &str = r#"
    SELECT p.*,
           COALESCE((SELECT ARRAY_AGG(ps.skill_id) FROM project_skills ps
                     WHERE ps.project_id = p.id), '{}') AS skill_ids
    FROM portfolio_items p
"#;

#[derive(Debug, Deserialize)]
pub struct PortfolioQuery {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItemsResponse {
    pub portfolio_items: Vec<PortfolioItemRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItemResponse {
    pub portfolio_item: PortfolioItemRow,
}

async fn fetch_item(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<PortfolioItemRow, AppError> {
    let sql = format!("{PORTFOLIO_SELECT} WHERE p.user_id = $1 AND p.id = $2");
    sqlx::query_as::<_, PortfolioItemRow>(&sql)
        .bind(user_id)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found("Project"))
}

async fn replace_skill_links(
    conn: &mut PgConnection,
    user_id: Uuid,
    project_id: Uuid,
    skill_ids: &[Uuid],
) -> Result<(), AppError> {
    if !all_owned(conn, "skills", user_id, skill_ids).await? {
        return Err(AppError::DomainRule("One or more skills not found".to_string()));
    }
    sqlx::query("DELETE FROM project_skills WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO project_skills (skill_id, project_id)
        SELECT UNNEST($2::UUID[]), $1
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(skill_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// GET /api/portfolio?type=
pub async fn handle_list_items(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<PortfolioItemsResponse>, AppError> {
    let item_type = query.item_type.filter(|t| !t.is_empty());
    let sql = format!(
        "{PORTFOLIO_SELECT} WHERE p.user_id = $1 AND ($2::TEXT IS NULL OR p.type = $2) \
         ORDER BY p.created_at DESC"
    );
    let portfolio_items = sqlx::query_as::<_, PortfolioItemRow>(&sql)
        .bind(user.id)
        .bind(item_type)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(PortfolioItemsResponse { portfolio_items }))
}

/// GET /api/portfolio/:id
pub async fn handle_get_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PortfolioItemResponse>, AppError> {
    let portfolio_item = fetch_item(&state.db, user.id, id).await?;
    Ok(Json(PortfolioItemResponse { portfolio_item }))
}

/// POST /api/portfolio
pub async fn handle_create_item(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<PortfolioItemInput>,
) -> Result<(StatusCode, Json<PortfolioItemResponse>), AppError> {
    let mut tx = state.db.begin().await?;
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO portfolio_items
            (user_id, title, description, detailed_description, type, url, image_url,
             tags, is_published, start_date, end_date, "order")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.detailed_description)
    .bind(input.item_type.as_str())
    .bind(&input.url)
    .bind(&input.image_url)
    .bind(&input.tags)
    .bind(input.is_published)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.order)
    .fetch_one(&mut *tx)
    .await?;

    replace_skill_links(&mut tx, user.id, id, &input.skill_ids).await?;
    tx.commit().await?;

    info!("Created portfolio item {id} for user {}", user.id);
    let portfolio_item = fetch_item(&state.db, user.id, id).await?;
    Ok((StatusCode::CREATED, Json(PortfolioItemResponse { portfolio_item })))
}

/// PUT /api/portfolio/:id
///
/// Partial update. `skillIds`, when present, replaces the skill links.
pub async fn handle_update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<PortfolioItemPatch>,
) -> Result<Json<PortfolioItemResponse>, AppError> {
    let mut tx = state.db.begin().await?;
    let sql = format!("{PORTFOLIO_SELECT} WHERE p.user_id = $1 AND p.id = $2 FOR UPDATE OF p");
    let mut row = sqlx::query_as::<_, PortfolioItemRow>(&sql)
        .bind(user.id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Project"))?;

    patch.apply(&mut row);
    sqlx::query(
        r#"
        UPDATE portfolio_items
        SET title = $3, description = $4, detailed_description = $5, type = $6, url = $7,
            image_url = $8, tags = $9, is_published = $10, start_date = $11, end_date = $12,
            "order" = $13, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(&row.title)
    .bind(&row.description)
    .bind(&row.detailed_description)
    .bind(&row.item_type)
    .bind(&row.url)
    .bind(&row.image_url)
    .bind(&row.tags)
    .bind(row.is_published)
    .bind(row.start_date)
    .bind(row.end_date)
    .bind(row.order)
    .execute(&mut *tx)
    .await?;

    if let Some(skill_ids) = &patch.skill_ids {
        replace_skill_links(&mut tx, user.id, id, skill_ids).await?;
    }
    tx.commit().await?;

    let portfolio_item = fetch_item(&state.db, user.id, id).await?;
    Ok(Json(PortfolioItemResponse { portfolio_item }))
}

/// DELETE /api/portfolio/:id
pub async fn handle_delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM portfolio_items WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::not_found("Project"));
    }
    Ok(StatusCode::NO_CONTENT)
}
