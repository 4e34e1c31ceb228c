use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::extract::blank_as_none;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Full-time")]
    FullTime,
    Contract,
    Freelance,
    Internship,
    #[serde(rename = "Part-time")]
    PartTime,
}

impl EmploymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "Full-time",
            EmploymentType::Contract => "Contract",
            EmploymentType::Freelance => "Freelance",
            EmploymentType::Internship => "Internship",
            EmploymentType::PartTime => "Part-time",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_date_order"))]
pub struct ExperienceInput {
    #[validate(length(min = 1, max = 200, message = "Company must be 1-200 characters"))]
    pub company: String,
    #[validate(length(min = 1, max = 200, message = "Role must be 1-200 characters"))]
    pub role: String,
    pub employment_type: EmploymentType,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 200, message = "Location must be less than 200 characters"))]
    pub location: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[validate(custom = "validate_bullets")]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub project_ids: Vec<Uuid>,
    #[serde(default)]
    pub skill_ids: Vec<Uuid>,
}

fn validate_date_order(input: &ExperienceInput) -> Result<(), ValidationError> {
    match input.end_date {
        Some(end) if end < input.start_date => {
            let mut error = ValidationError::new("date_order");
            error.add_param("field".into(), &"endDate");
            error.message = Some("End date must be after start date".into());
            Err(error)
        }
        _ => Ok(()),
    }
}

fn validate_bullets(bullets: &[String]) -> Result<(), ValidationError> {
    if bullets.is_empty() {
        let mut error = ValidationError::new("bullets_required");
        error.message = Some("At least one responsibility/achievement is required".into());
        return Err(error);
    }
    if bullets.iter().any(|b| b.trim().is_empty() || b.chars().count() > 500) {
        let mut error = ValidationError::new("bullet_length");
        error.message = Some("Each bullet point must be 1-500 characters".into());
        return Err(error);
    }
    Ok(())
}
