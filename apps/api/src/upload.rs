//! Multipart form reading and file-type rules shared by the upload routes.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;

pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// The single file part of an upload form.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Text fields plus the file parts whose names were asked for.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    /// Empty file parts (a form's blank file input) count as absent.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.data.is_empty())
    }


    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

pub async fn read_form(
    mut multipart: Multipart,
    file_fields: &[&str],
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if file_fields.contains(&name.as_str()) {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file data: {e}")))?;
            form.files.insert(
                name,
                UploadedFile {
                    file_name,
                    content_type,
                    data,
                },
            );
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

/// Short file type stored on documents, from the upload's MIME type.
pub fn document_file_type(mime: &str) -> Option<&'static str> {
    match mime {
        "application/pdf" => Some("pdf"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        _ => None,
    }
}

pub fn avatar_extension(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

pub fn content_type_for(file_type: &str) -> &'static str {
    match file_type.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Name offered to the browser: the document name, with the stored file
/// type appended when the name has no extension.
pub fn download_file_name(name: &str, file_type: &str) -> String {
    let base = crate::storage::sanitize_file_name(name);
    if base.contains('.') || file_type.is_empty() {
        base
    } else {
        format!("{base}.{file_type}")
    }
}

/// `"My CV.final.pdf"` → `"My CV.final"`.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[..i],
        _ => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_file_types() {
        assert_eq!(document_file_type("application/pdf"), Some("pdf"));
        assert_eq!(document_file_type("image/jpg"), Some("jpg"));
        assert_eq!(document_file_type("text/plain"), None);
    }

    #[test]
    fn test_avatar_extensions() {
        assert_eq!(avatar_extension("image/webp"), Some("webp"));
        assert_eq!(avatar_extension("image/gif"), None);
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(download_file_name("Resume 2024", "pdf"), "Resume_2024.pdf");
        assert_eq!(download_file_name("cv.docx", "docx"), "cv.docx");
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("My CV.final.pdf"), "My CV.final");
        assert_eq!(strip_extension("README"), "README");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("PDF"), "application/pdf");
        assert_eq!(content_type_for("zip"), "application/octet-stream");
    }
}
