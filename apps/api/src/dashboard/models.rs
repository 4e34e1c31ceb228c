use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub avatar_url: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub item_type: String,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceSummary {
    pub id: Uuid,
    pub company: String,
    pub role: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completeness {
    pub percentage: u8,
    pub has_profile_picture: bool,
    pub has_profile_details: bool,
    pub has_projects: bool,
    pub has_skills: bool,
    pub has_experience: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub profile: Option<ProfileSummary>,
    pub top_projects: Vec<ProjectSummary>,
    pub recent_experience: Option<ExperienceSummary>,
    pub completeness: Completeness,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// 25 points each: picture plus details, a project, a skill, an experience.
pub fn compute_completeness(
    profile: Option<&ProfileSummary>,
    projects: i64,
    skills: i64,
    experiences: i64,
) -> Completeness {
    let has_profile_picture = profile.is_some_and(|p| filled(&p.avatar_url));
    let has_profile_details =
        profile.is_some_and(|p| filled(&p.title) && filled(&p.bio) && filled(&p.location));
    let has_projects = projects > 0;
    let has_skills = skills > 0;
    let has_experience = experiences > 0;

    let percentage = [
        has_profile_picture && has_profile_details,
        has_projects,
        has_skills,
        has_experience,
    ]
    .iter()
    .filter(|done| **done)
    .count() as u8
        * 25;

    Completeness {
        percentage,
        has_profile_picture,
        has_profile_details,
        has_projects,
        has_skills,
        has_experience,
    }
}
