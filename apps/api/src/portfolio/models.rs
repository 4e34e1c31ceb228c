use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::extract::{blank_as_none, patch_nullable, patch_text, web_url};
use crate::models::portfolio::PortfolioItemRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioItemType {
    Personal,
    Freelance,
    Client,
    Company,
    Academic,
    Other,
}

impl PortfolioItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            PortfolioItemType::Personal => "personal",
            PortfolioItemType::Freelance => "freelance",
            PortfolioItemType::Client => "client",
            PortfolioItemType::Company => "company",
            PortfolioItemType::Academic => "academic",
            PortfolioItemType::Other => "other",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItemInput {
    #[validate(length(min = 1, message = "Project name is required"))]
    pub title: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub detailed_description: Option<String>,
    #[serde(rename = "type")]
    pub item_type: PortfolioItemType,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(custom(function = "web_url", message = "Invalid URL"))]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(custom(function = "web_url", message = "Invalid URL"))]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub skill_ids: Vec<Uuid>,
}

/// Partial update: absent fields stay unchanged, blank text clears.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItemPatch {
    #[validate(length(min = 1, message = "Project name is required"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "patch_text")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_text")]
    pub detailed_description: Option<Option<String>>,
    #[serde(rename = "type")]
    pub item_type: Option<PortfolioItemType>,
    #[serde(default, deserialize_with = "patch_text")]
    #[validate(custom(function = "web_url", message = "Invalid URL"))]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_text")]
    #[validate(custom(function = "web_url", message = "Invalid URL"))]
    pub image_url: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "patch_nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "patch_nullable")]
    pub end_date: Option<Option<NaiveDate>>,
    pub order: Option<i32>,
    pub skill_ids: Option<Vec<Uuid>>,
}

impl PortfolioItemPatch {
    /// Merges the patch into a stored row.
    pub fn apply(&self, row: &mut PortfolioItemRow) {
        if let Some(title) = &self.title {
            row.title = title.clone();
        }
        if let Some(description) = &self.description {
            row.description = description.clone();
        }
        if let Some(detailed) = &self.detailed_description {
            row.detailed_description = detailed.clone();
        }
        if let Some(item_type) = self.item_type {
            row.item_type = item_type.as_str().to_string();
        }
        if let Some(url) = &self.url {
            row.url = url.clone();
        }
        if let Some(image_url) = &self.image_url {
            row.image_url = image_url.clone();
        }
        if let Some(tags) = &self.tags {
            row.tags = tags.clone();
        }
        if let Some(is_published) = self.is_published {
            row.is_published = is_published;
        }
        if let Some(start_date) = self.start_date {
            row.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            row.end_date = end_date;
        }
        if let Some(order) = self.order {
            row.order = order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn row() -> PortfolioItemRow {
        PortfolioItemRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Widget".to_string(),
            description: Some("A widget".to_string()),
            detailed_description: None,
            item_type: "personal".to_string(),
            url: Some("https://widget.dev".to_string()),
            image_url: None,
            tags: vec!["rust".to_string()],
            is_published: false,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1),
            end_date: None,
            order: 0,
            skill_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_leaves_absent_fields() {
        let patch: PortfolioItemPatch =
            serde_json::from_value(json!({ "isPublished": true })).unwrap();
        let mut r = row();
        patch.apply(&mut r);
        assert!(r.is_published);
        assert_eq!(r.title, "Widget");
        assert_eq!(r.description.as_deref(), Some("A widget"));
        assert_eq!(r.tags, vec!["rust".to_string()]);
    }

    #[test]
    fn test_patch_blank_text_clears() {
        let patch: PortfolioItemPatch =
            serde_json::from_value(json!({ "description": "", "url": null, "type": "client" }))
                .unwrap();
        let mut r = row();
        patch.apply(&mut r);
        assert!(r.description.is_none());
        assert!(r.url.is_none());
        assert_eq!(r.item_type, "client");
    }

    #[test]
    fn test_patch_null_date_clears() {
        let patch: PortfolioItemPatch =
            serde_json::from_value(json!({ "startDate": null })).unwrap();
        let mut r = row();
        patch.apply(&mut r);
        assert!(r.start_date.is_none());
    }

    #[test]
    fn test_patch_rejects_empty_title_and_bad_url() {
        let patch: PortfolioItemPatch = serde_json::from_value(json!({ "title": "" })).unwrap();
        assert!(patch.validate().is_err());
        let patch: PortfolioItemPatch =
            serde_json::from_value(json!({ "url": "not a url" })).unwrap();
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_invalid_type_fails_decode() {
        let result: Result<PortfolioItemInput, _> =
            serde_json::from_value(json!({ "title": "X", "type": "hobby" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_input_defaults() {
        let input: PortfolioItemInput =
            serde_json::from_value(json!({ "title": "X", "type": "academic", "url": "" }))
                .unwrap();
        assert!(input.validate().is_ok());
        assert!(input.url.is_none());
        assert!(!input.is_published);
        assert_eq!(input.order, 0);
    }

    #[test]
    fn test_script_and_data_urls_rejected() {
        for bad in ["javascript:alert(document.cookie)", "data:text/html,<b>x</b>"] {
            let input: PortfolioItemInput =
                serde_json::from_value(json!({ "title": "X", "type": "personal", "url": bad }))
                    .unwrap();
            assert!(input.validate().is_err(), "{bad} accepted as url");

            let patch: PortfolioItemPatch =
                serde_json::from_value(json!({ "imageUrl": bad })).unwrap();
            assert!(patch.validate().is_err(), "{bad} accepted as imageUrl");
        }
        let ok: PortfolioItemInput = serde_json::from_value(
            json!({ "title": "X", "type": "personal", "url": "https://widget.dev" }),
        )
        .unwrap();
        assert!(ok.validate().is_ok());
    }
}
