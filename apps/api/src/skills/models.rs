use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::extract::blank_as_none;
use crate::models::skill::{SkillCategoryRow, SkillRow};

pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Frontend",
    "Backend",
    "Design",
    "DevOps",
    "Tools",
    "Soft Skills",
    "Other",
];

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SkillInput {
    #[validate(length(min = 1, max = 100, message = "Skill name must be 1-100 characters"))]
    pub name: String,
    pub category_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Level must be between 1 and 5"))]
    pub level: i16,
    #[serde(default)]
    #[validate(range(min = 0, max = 50, message = "Years of experience must be between 0 and 50"))]
    pub years_experience: Option<i16>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 500, message = "Description must be less than 500 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub last_used_at: Option<NaiveDate>,
    #[serde(default)]
    pub project_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 50, message = "Category name must be 1-50 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "Order cannot be negative"))]
    pub order: i32,
}

#[derive(Debug, Serialize)]
pub struct SkillsOverview {
    /// Skills keyed by category id; every category is present.
    pub grouped: BTreeMap<Uuid, Vec<SkillRow>>,
    pub categories: Vec<SkillCategoryRow>,
    pub skills: Vec<SkillRow>,
}

pub fn group_by_category(
    categories: &[SkillCategoryRow],
    skills: &[SkillRow],
) -> BTreeMap<Uuid, Vec<SkillRow>> {
    let mut grouped: BTreeMap<Uuid, Vec<SkillRow>> =
        categories.iter().map(|c| (c.id, Vec::new())).collect();
    for skill in skills {
        grouped
            .entry(skill.category_id)
            .or_default()
            .push(skill.clone());
    }
    grouped
}
