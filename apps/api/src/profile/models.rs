use serde::Deserialize;
use validator::Validate;

use crate::extract::{blank_as_none, web_url};

/// Body of `PUT /api/profile`. Blank optional fields are stored as null.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 100, message = "Title too long"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 500, message = "Bio too long (max 500 characters)"))]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 100, message = "Location too long"))]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 20, message = "Phone too long"))]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(custom(function = "web_url", message = "Invalid URL"))]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(custom(function = "web_url", message = "Invalid URL"))]
    pub github: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(custom(function = "web_url", message = "Invalid URL"))]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(custom(function = "web_url", message = "Invalid URL"))]
    pub other_link: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 50, message = "Label too long"))]
    pub other_link_label: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::flatten_validation_errors;
    use serde_json::json;

    #[test]
    fn test_blank_fields_become_null() {
        let input: ProfileInput = serde_json::from_value(json!({
            "fullName": "Jane Doe",
            "title": "",
            "website": "",
            "bio": "Engineer",
        }))
        .unwrap();
        assert!(input.validate().is_ok());
        assert!(input.title.is_none());
        assert!(input.website.is_none());
        assert_eq!(input.bio.as_deref(), Some("Engineer"));
        assert!(!input.is_public);
    }

    #[test]
    fn test_invalid_links_reported_in_camel_case() {
        let input: ProfileInput = serde_json::from_value(json!({
            "fullName": "Jane Doe",
            "otherLink": "nope",
        }))
        .unwrap();
        let flat = flatten_validation_errors(&input.validate().unwrap_err());
        assert_eq!(flat[0].field, "otherLink");
        assert_eq!(flat[0].message, "Invalid URL");
    }

    #[test]
    fn test_non_web_links_rejected() {
        let input: ProfileInput = serde_json::from_value(json!({
            "fullName": "Jane Doe",
            "website": "javascript:alert(1)",
            "github": "data:text/html,hi",
        }))
        .unwrap();
        let flat = flatten_validation_errors(&input.validate().unwrap_err());
        let fields: Vec<&str> = flat.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["github", "website"]);
    }
}
