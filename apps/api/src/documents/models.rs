use serde::Deserialize;
use validator::Validate;

use crate::extract::blank_as_none;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Cv,
    CoverLetter,
    Other,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Cv => "CV",
            DocumentType::CoverLetter => "COVER_LETTER",
            DocumentType::Other => "OTHER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CV" => Some(DocumentType::Cv),
            "COVER_LETTER" => Some(DocumentType::CoverLetter),
            "OTHER" => Some(DocumentType::Other),
            _ => None,
        }
    }
}

/// Metadata fields of the upload form.
#[derive(Debug, Validate)]
pub struct DocumentUploadInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub doc_type: DocumentType,
    #[validate(length(max = 500, message = "Notes must be less than 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DocumentUpdateInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 500, message = "Notes must be less than 500 characters"))]
    pub notes: Option<String>,
}
