//! Deciding what gets attached to a new application.
//!
//! An attachment either snapshots a saved document or records a file
//! uploaded with the form; the upload may also be kept as a new document.

use uuid::Uuid;

use crate::documents::models::DocumentType;
use crate::models::document::DocumentRow;
use crate::upload::strip_extension;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Cv,
    CoverLetter,
}

impl AttachmentKind {
    pub fn document_type(self) -> DocumentType {
        match self {
            AttachmentKind::Cv => DocumentType::Cv,
            AttachmentKind::CoverLetter => DocumentType::CoverLetter,
        }
    }
}

/// A form file already written to object storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredUpload {
    pub key: String,
    pub file_name: String,
    pub file_type: String,
    pub size: i64,
}

/// One `application_documents` row to write.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentPlan {
    pub kind: AttachmentKind,
    pub document_id: Option<Uuid>,
    pub file_url: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    /// Name of the document to create from the upload, when it should be kept.
    pub save_as: Option<String>,
}

/// A linked document wins over an upload; with neither there is nothing to attach.
pub fn plan_attachment(
    kind: AttachmentKind,
    linked: Option<&DocumentRow>,
    upload: Option<&StoredUpload>,
    save_upload: bool,
) -> Option<AttachmentPlan> {
    if let Some(document) = linked {
        return Some(AttachmentPlan {
            kind,
            document_id: Some(document.id),
            file_url: document.file_url.clone(),
            file_name: document.name.clone(),
            file_type: document.file_type.clone(),
            file_size: document.file_size,
            save_as: None,
        });
    }

    upload.map(|upload| AttachmentPlan {
        kind,
        document_id: None,
        file_url: upload.key.clone(),
        file_name: upload.file_name.clone(),
        file_type: upload.file_type.clone(),
        file_size: upload.size,
        save_as: save_upload.then(|| strip_extension(&upload.file_name).to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn saved_document() -> DocumentRow {
        DocumentRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Main CV".to_string(),
            doc_type: "CV".to_string(),
            file_url: "documents/u/main.pdf".to_string(),
            file_type: "pdf".to_string(),
            file_size: 2048,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn upload() -> StoredUpload {
        StoredUpload {
            key: "applications/u/abc-Tailored CV.pdf".to_string(),
            file_name: "Tailored CV.pdf".to_string(),
            file_type: "pdf".to_string(),
            size: 4096,
        }
    }

    #[test]
    fn test_nothing_to_attach() {
        assert!(plan_attachment(AttachmentKind::Cv, None, None, true).is_none());
    }

    #[test]
    fn test_linked_document_is_snapshotted() {
        let document = saved_document();
        let plan = plan_attachment(AttachmentKind::Cv, Some(&document), None, false).unwrap();
        assert_eq!(plan.document_id, Some(document.id));
        assert_eq!(plan.file_url, document.file_url);
        assert_eq!(plan.file_name, "Main CV");
        assert_eq!(plan.file_size, 2048);
        assert!(plan.save_as.is_none());
    }

    #[test]
    fn test_linked_document_wins_over_upload() {
        let document = saved_document();
        let plan =
            plan_attachment(AttachmentKind::Cv, Some(&document), Some(&upload()), true).unwrap();
        assert_eq!(plan.document_id, Some(document.id));
        assert!(plan.save_as.is_none());
    }

    #[test]
    fn test_upload_without_save() {
        let plan =
            plan_attachment(AttachmentKind::CoverLetter, None, Some(&upload()), false).unwrap();
        assert_eq!(plan.document_id, None);
        assert_eq!(plan.file_name, "Tailored CV.pdf");
        assert!(plan.save_as.is_none());
        assert_eq!(plan.kind.document_type(), DocumentType::CoverLetter);
    }

    #[test]
    fn test_upload_saved_as_document_without_extension() {
        let plan = plan_attachment(AttachmentKind::Cv, None, Some(&upload()), true).unwrap();
        assert_eq!(plan.save_as.as_deref(), Some("Tailored CV"));
    }
}
