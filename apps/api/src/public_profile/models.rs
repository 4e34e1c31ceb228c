use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::extract::blank_as_none;
use crate::models::public_profile::PublicProfileRow;

pub static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

fn default_true() -> bool {
    true
}

// ────────────────────────────────────────────────────────────────────────────
// Write side
// ────────────────────────────────────────────────────────────────────────────

/// Body of `PUT /api/public-profile`. Missing flags take their defaults.
#[derive(Debug, Clone, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileInput {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"),
        regex(
            path = "SLUG_RE",
            message = "Username can only contain lowercase letters, numbers, and hyphens"
        )
    )]
    pub slug: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub seo_indexable: bool,
    #[serde(default = "default_true")]
    pub show_profile: bool,
    #[serde(default = "default_true")]
    pub show_skills: bool,
    #[serde(default = "default_true")]
    pub show_experience: bool,
    #[serde(default = "default_true")]
    pub show_projects: bool,
    #[serde(default)]
    pub show_contact: bool,
    #[serde(default)]
    pub allow_cv_request: bool,
    #[serde(default)]
    pub selected_project_ids: Vec<Uuid>,
    #[serde(default)]
    pub selected_experience_ids: Vec<Uuid>,
    #[serde(default)]
    pub selected_cv_id: Option<Uuid>,
}

// ────────────────────────────────────────────────────────────────────────────
// Read side: what an anonymous visitor receives
// ────────────────────────────────────────────────────────────────────────────

/// Profile fields exposed on the public page.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileDetails {
    pub title: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub other_link: Option<String>,
    pub other_link_label: Option<String>,
}

/// The user owning a config, with their optional profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicOwner {
    pub id: Uuid,
    pub full_name: String,
    pub profile: Option<PublicProfileDetails>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicSkill {
    pub id: Uuid,
    pub name: String,
    pub level: i16,
    pub category_name: String,
    pub project_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicExperience {
    pub id: Uuid,
    pub company: String,
    pub role: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicDocument {
    pub id: Uuid,
    pub name: String,
    /// Storage key; served through the public CV route, never exposed.
    #[serde(skip_serializing)]
    pub file_url: String,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicPortfolioItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

/// Config fields carried verbatim into the public view.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slug: String,
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
}

impl PublicSettings {
    pub fn from_row(row: &PublicProfileRow, slug: &str) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            slug: slug.to_string(),
            enabled: row.enabled,
            seo_indexable: row.seo_indexable,
            show_profile: row.show_profile,
            show_skills: row.show_skills,
            show_experience: row.show_experience,
            show_projects: row.show_projects,
            show_contact: row.show_contact,
            allow_cv_request: row.allow_cv_request,
            selected_project_ids: row.selected_project_ids.clone(),
            selected_experience_ids: row.selected_experience_ids.clone(),
            selected_cv_id: row.selected_cv_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub profile: Option<PublicProfileDetails>,
    pub skills: Vec<PublicSkill>,
    pub experiences: Vec<PublicExperience>,
    pub documents: Vec<PublicDocument>,
    pub portfolio_items: Vec<PublicPortfolioItem>,
}

/// The assembled read model for one slug.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileView {
    #[serde(flatten)]
    pub settings: PublicSettings,
    pub selected_cv: Option<PublicDocument>,
    pub user: PublicUser,
}
