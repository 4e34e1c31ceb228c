use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::dashboard::models::{
    compute_completeness, DashboardResponse, ExperienceSummary, ProfileSummary, ProjectSummary,
};
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let db = &state.db;
    let (profile, top_projects, recent_experience, counts) = tokio::try_join!(
        sqlx::query_as::<_, ProfileSummary>(
            "SELECT avatar_url, title, bio, location FROM profiles WHERE user_id = $1",
        )
        .bind(user.id)
        .fetch_optional(db),
        sqlx::query_as::<_, ProjectSummary>(
            r#"
            SELECT id, title, description, type FROM portfolio_items
            WHERE user_id = $1 ORDER BY created_at DESC LIMIT 3
            "#,
        )
        .bind(user.id)
        .fetch_all(db),
        sqlx::query_as::<_, ExperienceSummary>(
            r#"
            SELECT id, company, role, start_date, end_date FROM experiences
            WHERE user_id = $1 ORDER BY start_date DESC LIMIT 1
            "#,
        )
        .bind(user.id)
        .fetch_optional(db),
        sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT (SELECT COUNT(*) FROM portfolio_items WHERE user_id = $1),
                   (SELECT COUNT(*) FROM skills WHERE user_id = $1),
                   (SELECT COUNT(*) FROM experiences WHERE user_id = $1)
            "#,
        )
        .bind(user.id)
        .fetch_one(db),
    )?;

    let (projects, skills, experiences) = counts;
    let completeness = compute_completeness(profile.as_ref(), projects, skills, experiences);
    Ok(Json(DashboardResponse {
        profile,
        top_projects,
        recent_experience,
        completeness,
    }))
}
