use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One row of `public_profiles`: the per-user visibility configuration.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slug: Option<String>,
    pub enabled: bool,
    pub seo_indexable: bool,
    pub show_profile: bool,
    pub show_skills: bool,
    pub show_experience: bool,
    pub show_projects: bool,
    pub show_contact: bool,
    pub allow_cv_request: bool,
    pub selected_project_ids: Vec<Uuid>,
    pub selected_experience_ids: Vec<Uuid>,
    pub selected_cv_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
