use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::extract::{blank_as_none, patch_nullable, patch_text, web_url};
use crate::models::application::{ApplicationDocumentRow, ApplicationRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Draft,
    Applied,
    Interview,
    Offer,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

/// Text fields of the create form, decoded from the multipart body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInput {
    #[validate(length(min = 1, max = 200, message = "Company must be 1-200 characters"))]
    pub company: String,
    #[validate(length(min = 1, max = 200, message = "Role must be 1-200 characters"))]
    pub role: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 200, message = "Location must be less than 200 characters"))]
    pub location: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub applied_at: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(custom(function = "web_url", message = "Must be a valid URL"))]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 2000, message = "Notes must be less than 2000 characters"))]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 200, message = "Recruiter name must be less than 200 characters"))]
    pub recruiter_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email(message = "Invalid email"))]
    pub recruiter_email: Option<String>,
    #[serde(default)]
    pub follow_up_at: Option<NaiveDate>,
    #[serde(default)]
    pub cv_document_id: Option<Uuid>,
    #[serde(default)]
    pub cover_letter_document_id: Option<Uuid>,
    #[serde(default)]
    pub save_cv_to_documents: bool,
    #[serde(default)]
    pub save_cover_letter_to_documents: bool,
}

const BOOLEAN_FIELDS: [&str; 2] = ["saveCvToDocuments", "saveCoverLetterToDocuments"];

impl ApplicationInput {
    /// Decodes form text fields. Blank values are treated as absent and the
    /// save flags are true only for the literal `"true"`.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, serde_json::Error> {
        let mut object = serde_json::Map::new();
        for (key, value) in fields {
            let value = value.trim();
            if BOOLEAN_FIELDS.contains(&key.as_str()) {
                object.insert(key.clone(), serde_json::Value::Bool(value == "true"));
            } else if !value.is_empty() {
                object.insert(key.clone(), serde_json::Value::String(value.to_string()));
            }
        }
        serde_json::from_value(serde_json::Value::Object(object))
    }
}

/// Partial update; absent fields stay unchanged, blank text clears.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPatch {
    #[validate(length(min = 1, max = 200, message = "Company must be 1-200 characters"))]
    pub company: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Role must be 1-200 characters"))]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "patch_text")]
    #[validate(length(max = 200, message = "Location must be less than 200 characters"))]
    pub location: Option<Option<String>>,
    pub status: Option<ApplicationStatus>,
    #[serde(default, deserialize_with = "patch_nullable")]
    pub applied_at: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "patch_text")]
    #[validate(custom(function = "web_url", message = "Must be a valid URL"))]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_text")]
    #[validate(length(max = 2000, message = "Notes must be less than 2000 characters"))]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_text")]
    #[validate(length(max = 200, message = "Recruiter name must be less than 200 characters"))]
    pub recruiter_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_text")]
    #[validate(email(message = "Invalid email"))]
    pub recruiter_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_nullable")]
    pub follow_up_at: Option<Option<NaiveDate>>,
    pub is_archived: Option<bool>,
}

impl ApplicationPatch {
    pub fn apply(&self, row: &mut ApplicationRow) {
        if let Some(company) = &self.company {
            row.company = company.clone();
        }
        if let Some(role) = &self.role {
            row.role = role.clone();
        }
        if let Some(location) = &self.location {
            row.location = location.clone();
        }
        if let Some(status) = self.status {
            row.status = status.as_str().to_string();
        }
        if let Some(applied_at) = self.applied_at {
            row.applied_at = applied_at;
        }
        if let Some(link) = &self.link {
            row.link = link.clone();
        }
        if let Some(notes) = &self.notes {
            row.notes = notes.clone();
        }
        if let Some(name) = &self.recruiter_name {
            row.recruiter_name = name.clone();
        }
        if let Some(email) = &self.recruiter_email {
            row.recruiter_email = email.clone();
        }
        if let Some(follow_up_at) = self.follow_up_at {
            row.follow_up_at = follow_up_at;
        }
        if let Some(is_archived) = self.is_archived {
            row.is_archived = is_archived;
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ArchiveInput {
    pub archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationQuery {
    pub status: Option<String>,
    pub archived: Option<bool>,
}

impl ApplicationQuery {
    /// `all` and blank mean no status filter.
    pub fn status_filter(&self) -> Option<&str> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "all")
    }
}

/// An application with its attachment snapshots.
#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub documents: Vec<ApplicationDocumentRow>,
}

/// Pairs each application with its attachments, preserving list order.
pub fn attach_documents(
    applications: Vec<ApplicationRow>,
    documents: Vec<ApplicationDocumentRow>,
) -> Vec<ApplicationDetail> {
    let mut by_application: HashMap<Uuid, Vec<ApplicationDocumentRow>> = HashMap::new();
    for document in documents {
        by_application
            .entry(document.application_id)
            .or_default()
            .push(document);
    }
    applications
        .into_iter()
        .map(|application| ApplicationDetail {
            documents: by_application.remove(&application.id).unwrap_or_default(),
            application,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn row() -> ApplicationRow {
        ApplicationRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company: "Acme".to_string(),
            role: "Engineer".to_string(),
            location: Some("Remote".to_string()),
            status: "applied".to_string(),
            applied_at: NaiveDate::from_ymd_opt(2024, 2, 1),
            link: None,
            notes: Some("Referred by Sam".to_string()),
            recruiter_name: None,
            recruiter_email: None,
            follow_up_at: None,
            is_archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn attachment(application_id: Uuid, doc_type: &str) -> ApplicationDocumentRow {
        ApplicationDocumentRow {
            id: Uuid::new_v4(),
            application_id,
            document_id: None,
            doc_type: doc_type.to_string(),
            file_url: "applications/x.pdf".to_string(),
            file_name: "x.pdf".to_string(),
            file_type: "pdf".to_string(),
            file_size: 10,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_from_form_decodes_types() {
        let mut fields = HashMap::new();
        fields.insert("company".to_string(), "Acme".to_string());
        fields.insert("role".to_string(), "Engineer".to_string());
        fields.insert("status".to_string(), "interview".to_string());
        fields.insert("appliedAt".to_string(), "2024-02-01".to_string());
        fields.insert("link".to_string(), "".to_string());
        fields.insert("saveCvToDocuments".to_string(), "true".to_string());
        fields.insert("saveCoverLetterToDocuments".to_string(), "false".to_string());

        let input = ApplicationInput::from_form(&fields).unwrap();
        assert_eq!(input.status, ApplicationStatus::Interview);
        assert_eq!(input.applied_at, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert!(input.link.is_none());
        assert!(input.save_cv_to_documents);
        assert!(!input.save_cover_letter_to_documents);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_from_form_rejects_unknown_status() {
        let mut fields = HashMap::new();
        fields.insert("company".to_string(), "Acme".to_string());
        fields.insert("role".to_string(), "Engineer".to_string());
        fields.insert("status".to_string(), "ghosted".to_string());
        assert!(ApplicationInput::from_form(&fields).is_err());
    }

    #[test]
    fn test_invalid_recruiter_email() {
        let mut fields = HashMap::new();
        fields.insert("company".to_string(), "Acme".to_string());
        fields.insert("role".to_string(), "Engineer".to_string());
        fields.insert("status".to_string(), "draft".to_string());
        fields.insert("recruiterEmail".to_string(), "not-an-email".to_string());
        let input = ApplicationInput::from_form(&fields).unwrap();
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("recruiter_email"));
    }

    #[test]
    fn test_patch_apply() {
        let patch: ApplicationPatch = serde_json::from_value(json!({
            "status": "offer",
            "notes": "",
            "isArchived": true,
        }))
        .unwrap();
        let mut r = row();
        patch.apply(&mut r);
        assert_eq!(r.status, "offer");
        assert!(r.notes.is_none());
        assert!(r.is_archived);
        assert_eq!(r.location.as_deref(), Some("Remote"));
        assert_eq!(r.applied_at, NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn test_status_filter() {
        let q = ApplicationQuery {
            status: Some("all".to_string()),
            archived: None,
        };
        assert_eq!(q.status_filter(), None);
        let q = ApplicationQuery {
            status: Some("offer".to_string()),
            archived: Some(true),
        };
        assert_eq!(q.status_filter(), Some("offer"));
    }

    #[test]
    fn test_attach_documents_keeps_order() {
        let first = row();
        let second = row();
        let docs = vec![
            attachment(second.id, "CV"),
            attachment(first.id, "CV"),
            attachment(second.id, "COVER_LETTER"),
        ];
        let (first_id, second_id) = (first.id, second.id);

        let details = attach_documents(vec![first, second], docs);
        assert_eq!(details[0].application.id, first_id);
        assert_eq!(details[0].documents.len(), 1);
        assert_eq!(details[1].application.id, second_id);
        assert_eq!(details[1].documents.len(), 2);
    }

    #[test]
    fn test_detail_serializes_flat() {
        let detail = ApplicationDetail {
            application: row(),
            documents: vec![],
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["company"], "Acme");
        assert_eq!(value["isArchived"], false);
        assert!(value["documents"].as_array().unwrap().is_empty());
    }
}
