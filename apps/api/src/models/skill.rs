use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SkillCategoryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

/// A skill joined with its category name and the projects it is linked to.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SkillRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub name: String,
    pub level: i16,
    pub years_experience: Option<i16>,
    pub description: Option<String>,
    pub last_used_at: Option<NaiveDate>,
    pub project_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
