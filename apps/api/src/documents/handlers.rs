//! Axum route handlers for uploaded documents (CVs, cover letters, other).

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::documents::models::{DocumentType, DocumentUpdateInput, DocumentUploadInput};
use crate::errors::{AppError, FieldViolation};
use crate::extract::ValidatedJson;
use crate::models::document::DocumentRow;
use crate::state::AppState;
use crate::storage;
use crate::upload::{
    content_type_for, document_file_type, download_file_name, read_form, MAX_DOCUMENT_BYTES,
};

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub documents: Vec<DocumentRow>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document: DocumentRow,
}

async fn fetch_document(state: &AppState, user_id: Uuid, id: Uuid) -> Result<DocumentRow, AppError> {
    sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Document"))
}

/// GET /api/documents?type=
pub async fn handle_list_documents(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let doc_type = query.doc_type.filter(|t| !t.is_empty());
    let documents = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT * FROM documents
        WHERE user_id = $1 AND ($2::TEXT IS NULL OR type = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user.id)
    .bind(doc_type)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(DocumentsResponse { documents }))
}

/// POST /api/documents (multipart: file, name, type, notes)
pub async fn handle_upload_document(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let mut form = read_form(multipart, &["file"]).await?;

    let doc_type = form
        .text("type")
        .and_then(|t| DocumentType::parse(&t))
        .ok_or_else(|| {
            AppError::InvalidInput(vec![FieldViolation {
                field: "type".to_string(),
                message: "Type must be one of CV, COVER_LETTER, OTHER".to_string(),
            }])
        })?;
    let input = DocumentUploadInput {
        name: form.text("name").unwrap_or_default(),
        doc_type,
        notes: form.text("notes"),
    };
    input.validate()?;

    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::Validation("File is required".to_string()))?;
    let file_type = document_file_type(&file.content_type).ok_or_else(|| {
        AppError::Validation("Invalid file type. Allowed: PDF, DOC, DOCX, PNG, JPG".to_string())
    })?;
    if file.data.len() > MAX_DOCUMENT_BYTES {
        return Err(AppError::Validation(
            "File size must be less than 10MB".to_string(),
        ));
    }

    let key = storage::object_key("documents", user.id, &file.file_name);
    let size = file.data.len() as i64;
    storage::put_object(
        &state.s3,
        &state.config.s3_bucket,
        &key,
        file.data,
        &file.content_type,
    )
    .await?;

    let inserted = sqlx::query_as::<_, DocumentRow>(
        r#"
        INSERT INTO documents (user_id, name, type, file_url, file_type, file_size, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&input.name)
    .bind(input.doc_type.as_str())
    .bind(&key)
    .bind(file_type)
    .bind(size)
    .bind(&input.notes)
    .fetch_one(&state.db)
    .await;
    let document = match inserted {
        Ok(document) => document,
        Err(e) => {
            storage::discard_object(&state.s3, &state.config.s3_bucket, &key).await;
            return Err(e.into());
        }
    };

    info!("Stored document {} ({size} bytes) for user {}", document.id, user.id);
    Ok((StatusCode::CREATED, Json(DocumentResponse { document })))
}

/// PUT /api/documents/:id
pub async fn handle_update_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<DocumentUpdateInput>,
) -> Result<Json<DocumentResponse>, AppError> {
    let document = sqlx::query_as::<_, DocumentRow>(
        r#"
        UPDATE documents SET name = $3, notes = $4, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(&input.name)
    .bind(&input.notes)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Document"))?;
    Ok(Json(DocumentResponse { document }))
}

/// DELETE /api/documents/:id
///
/// The stored object is kept while an application attachment still points at it.
pub async fn handle_delete_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let document = sqlx::query_as::<_, DocumentRow>(
        "DELETE FROM documents WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Document"))?;

    let still_attached: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM application_documents WHERE file_url = $1)",
    )
    .bind(&document.file_url)
    .fetch_one(&state.db)
    .await?;

    if !still_attached {
        storage::discard_object(&state.s3, &state.config.s3_bucket, &document.file_url).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/documents/:id/download
pub async fn handle_download_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let document = fetch_document(&state, user.id, id).await?;
    let object =
        storage::get_object(&state.s3, &state.config.s3_bucket, &document.file_url).await?;

    let content_type = object
        .content_type
        .unwrap_or_else(|| content_type_for(&document.file_type).to_string());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        download_file_name(&document.name, &document.file_type)
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        object.body,
    )
        .into_response())
}
