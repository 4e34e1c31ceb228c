//! Axum route handlers for job applications and their attachments.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::applications::attachments::{
    plan_attachment, AttachmentKind, AttachmentPlan, StoredUpload,
};
use crate::applications::models::{
    attach_documents, ApplicationDetail, ApplicationInput, ApplicationPatch, ApplicationQuery,
    ArchiveInput,
};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::ValidatedJson;
use crate::models::application::{ApplicationDocumentRow, ApplicationRow};
use crate::models::document::DocumentRow;
use crate::state::AppState;
use crate::storage;
use crate::upload::{document_file_type, read_form, UploadedFile, MAX_DOCUMENT_BYTES};

#[derive(Debug, Serialize)]
pub struct ApplicationsResponse {
    pub applications: Vec<ApplicationDetail>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub application: ApplicationDetail,
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

async fn fetch_attachments(
    db: &PgPool,
    application_ids: &[Uuid],
) -> Result<Vec<ApplicationDocumentRow>, AppError> {
    let rows = sqlx::query_as::<_, ApplicationDocumentRow>(
        r#"
        SELECT * FROM application_documents
        WHERE application_id = ANY($1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(application_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

async fn fetch_detail(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<ApplicationDetail, AppError> {
    let application = sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found("Application"))?;

    let documents = fetch_attachments(db, &[id]).await?;
    Ok(ApplicationDetail {
        application,
        documents,
    })
}

async fn fetch_linked_document(
    db: &PgPool,
    user_id: Uuid,
    id: Option<Uuid>,
    label: &str,
) -> Result<Option<DocumentRow>, AppError> {
    let Some(id) = id else {
        return Ok(None);
    };
    sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .map(Some)
        .ok_or_else(|| AppError::DomainRule(format!("{label} document not found")))
}

async fn store_upload(
    state: &AppState,
    user_id: Uuid,
    file: UploadedFile,
) -> Result<StoredUpload, AppError> {
    let file_type = document_file_type(&file.content_type).ok_or_else(|| {
        AppError::Validation("Invalid file type. Allowed: PDF, DOC, DOCX, PNG, JPG".to_string())
    })?;
    if file.data.len() > MAX_DOCUMENT_BYTES {
        return Err(AppError::Validation(
            "File size must be less than 10MB".to_string(),
        ));
    }

    let key = storage::object_key("applications", user_id, &file.file_name);
    let size = file.data.len() as i64;
    storage::put_object(
        &state.s3,
        &state.config.s3_bucket,
        &key,
        file.data,
        &file.content_type,
    )
    .await?;

    Ok(StoredUpload {
        key,
        file_name: file.file_name,
        file_type: file_type.to_string(),
        size,
    })
}

/// Writes the application and every attachment in one transaction.
async fn persist_application(
    db: &PgPool,
    user_id: Uuid,
    input: &ApplicationInput,
    plans: &[AttachmentPlan],
) -> Result<Uuid, AppError> {
    let mut tx = db.begin().await?;

    let application_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO applications
            (user_id, company, role, location, status, applied_at, link, notes,
             recruiter_name, recruiter_email, follow_up_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&input.company)
    .bind(&input.role)
    .bind(&input.location)
    .bind(input.status.as_str())
    .bind(input.applied_at)
    .bind(&input.link)
    .bind(&input.notes)
    .bind(&input.recruiter_name)
    .bind(&input.recruiter_email)
    .bind(input.follow_up_at)
    .fetch_one(&mut *tx)
    .await?;

    for plan in plans {
        let doc_type = plan.kind.document_type().as_str();
        let document_id = match &plan.save_as {
            Some(name) => Some(
                sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO documents (user_id, name, type, file_url, file_type, file_size)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id
                    "#,
                )
                .bind(user_id)
                .bind(name)
                .bind(doc_type)
                .bind(&plan.file_url)
                .bind(&plan.file_type)
                .bind(plan.file_size)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => plan.document_id,
        };

        sqlx::query(
            r#"
            INSERT INTO application_documents
                (application_id, document_id, type, file_url, file_name, file_type, file_size)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(application_id)
        .bind(document_id)
        .bind(doc_type)
        .bind(&plan.file_url)
        .bind(&plan.file_name)
        .bind(&plan.file_type)
        .bind(plan.file_size)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(application_id)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/applications?status=&archived=
pub async fn handle_list_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ApplicationQuery>,
) -> Result<Json<ApplicationsResponse>, AppError> {
    let applications = sqlx::query_as::<_, ApplicationRow>(
        r#"
        SELECT * FROM applications
        WHERE user_id = $1
          AND ($2::TEXT IS NULL OR status = $2)
          AND ($3::BOOLEAN IS NULL OR is_archived = $3)
        ORDER BY is_archived ASC, applied_at DESC NULLS LAST, created_at DESC
        "#,
    )
    .bind(user.id)
    .bind(query.status_filter())
    .bind(query.archived)
    .fetch_all(&state.db)
    .await?;

    let ids: Vec<Uuid> = applications.iter().map(|a| a.id).collect();
    let documents = fetch_attachments(&state.db, &ids).await?;
    Ok(Json(ApplicationsResponse {
        applications: attach_documents(applications, documents),
    }))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let application = fetch_detail(&state.db, user.id, id).await?;
    Ok(Json(ApplicationResponse { application }))
}

/// POST /api/applications (multipart: application fields, optional
/// `cvFile` / `coverLetterFile`)
pub async fn handle_create_application(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApplicationResponse>), AppError> {
    let mut form = read_form(multipart, &["cvFile", "coverLetterFile"]).await?;
    let input = ApplicationInput::from_form(&form.fields)
        .map_err(|e| AppError::Validation(format!("Invalid application form: {e}")))?;
    input.validate()?;

    let cv_document =
        fetch_linked_document(&state.db, user.id, input.cv_document_id, "CV").await?;
    let cover_letter_document = fetch_linked_document(
        &state.db,
        user.id,
        input.cover_letter_document_id,
        "Cover letter",
    )
    .await?;

    // Uploads are ignored when a saved document is linked for the same slot.
    let mut uploads: Vec<StoredUpload> = Vec::new();
    let cv_upload = match (&cv_document, form.take_file("cvFile")) {
        (None, Some(file)) => Some(store_upload(&state, user.id, file).await?),
        _ => None,
    };
    uploads.extend(cv_upload.clone());
    let cover_letter_upload = match (&cover_letter_document, form.take_file("coverLetterFile")) {
        (None, Some(file)) => match store_upload(&state, user.id, file).await {
            Ok(upload) => Some(upload),
            Err(e) => {
                discard_uploads(&state, &uploads).await;
                return Err(e);
            }
        },
        _ => None,
    };
    uploads.extend(cover_letter_upload.clone());

    let plans: Vec<AttachmentPlan> = [
        plan_attachment(
            AttachmentKind::Cv,
            cv_document.as_ref(),
            cv_upload.as_ref(),
            input.save_cv_to_documents,
        ),
        plan_attachment(
            AttachmentKind::CoverLetter,
            cover_letter_document.as_ref(),
            cover_letter_upload.as_ref(),
            input.save_cover_letter_to_documents,
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    let id = match persist_application(&state.db, user.id, &input, &plans).await {
        Ok(id) => id,
        Err(e) => {
            discard_uploads(&state, &uploads).await;
            return Err(e);
        }
    };

    info!(
        "Created application {id} for user {} with {} attachment(s)",
        user.id,
        plans.len()
    );
    let application = fetch_detail(&state.db, user.id, id).await?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse { application })))
}

async fn discard_uploads(state: &AppState, uploads: &[StoredUpload]) {
    for upload in uploads {
        storage::discard_object(&state.s3, &state.config.s3_bucket, &upload.key).await;
    }
}

/// PUT /api/applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<ApplicationPatch>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let mut tx = state.db.begin().await?;
    let mut row = sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Application"))?;

    patch.apply(&mut row);
    sqlx::query(
        r#"
        UPDATE applications
        SET company = $3, role = $4, location = $5, status = $6, applied_at = $7, link = $8,
            notes = $9, recruiter_name = $10, recruiter_email = $11, follow_up_at = $12,
            is_archived = $13, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(&row.company)
    .bind(&row.role)
    .bind(&row.location)
    .bind(&row.status)
    .bind(row.applied_at)
    .bind(&row.link)
    .bind(&row.notes)
    .bind(&row.recruiter_name)
    .bind(&row.recruiter_email)
    .bind(row.follow_up_at)
    .bind(row.is_archived)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    let application = fetch_detail(&state.db, user.id, id).await?;
    Ok(Json(ApplicationResponse { application }))
}

/// PUT /api/applications/:id/archive
pub async fn handle_archive_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(input): ValidatedJson<ArchiveInput>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let updated = sqlx::query(
        "UPDATE applications SET is_archived = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user.id)
    .bind(input.archived)
    .execute(&state.db)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(AppError::not_found("Application"));
    }

    let application = fetch_detail(&state.db, user.id, id).await?;
    Ok(Json(ApplicationResponse { application }))
}

/// DELETE /api/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM applications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::not_found("Application"));
    }
    Ok(StatusCode::NO_CONTENT)
}
