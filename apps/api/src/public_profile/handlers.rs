//! Axum route handlers for the public-profile API and page.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, OptionalAuthUser};
use crate::errors::AppError;
use crate::extract::ValidatedJson;
use crate::models::public_profile::PublicProfileRow;
use crate::public_profile::assembler::assemble_public_profile;
use crate::public_profile::models::{PublicProfileInput, PublicProfileView};
use crate::public_profile::page::{render_not_found_page, render_profile_page};
use crate::public_profile::service;
use crate::state::AppState;
use crate::storage;
use crate::upload::{content_type_for, download_file_name};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileResponse {
    pub public_profile: Option<PublicProfileRow>,
}

#[derive(Debug, Deserialize)]
pub struct CheckSlugQuery {
    pub slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckSlugResponse {
    pub available: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Owner endpoints
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/public-profile
pub async fn handle_get_config(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PublicProfileResponse>, AppError> {
    let public_profile = service::get_config(state.public_profiles.as_ref(), user.id).await?;
    Ok(Json(PublicProfileResponse { public_profile }))
}

/// PUT /api/public-profile
pub async fn handle_upsert_config(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<PublicProfileInput>,
) -> Result<Json<PublicProfileResponse>, AppError> {
    let row = service::upsert_config(state.public_profiles.as_ref(), user.id, input).await?;
    Ok(Json(PublicProfileResponse {
        public_profile: Some(row),
    }))
}

/// GET /api/public-profile/check-slug?slug=X
///
/// Authentication is optional; when present the caller's own slug counts
/// as available.
pub async fn handle_check_slug(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(query): Query<CheckSlugQuery>,
) -> Result<Json<CheckSlugResponse>, AppError> {
    let slug = query
        .slug
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Slug is required".to_string()))?;

    let available = service::is_slug_available(
        state.public_profiles.as_ref(),
        &slug,
        user.map(|u| u.id),
    )
    .await?;
    Ok(Json(CheckSlugResponse { available }))
}

// ────────────────────────────────────────────────────────────────────────────
// Anonymous endpoints
// ────────────────────────────────────────────────────────────────────────────

async fn load_view(state: &AppState, slug: &str) -> Result<PublicProfileView, AppError> {
    assemble_public_profile(state.public_profiles.as_ref(), slug)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))
}

/// GET /api/public-profile/:slug
pub async fn handle_get_public_profile(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicProfileView>, AppError> {
    Ok(Json(load_view(&state, &slug).await?))
}

/// GET /api/public-profile/:slug/cv
///
/// Streams the selected CV, only when the owner allows CV requests.
pub async fn handle_download_public_cv(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let view = load_view(&state, &slug).await?;
    let cv = view
        .selected_cv
        .filter(|_| view.settings.allow_cv_request)
        .ok_or_else(|| AppError::not_found("CV"))?;

    let object = storage::get_object(&state.s3, &state.config.s3_bucket, &cv.file_url).await?;
    let content_type = object
        .content_type
        .unwrap_or_else(|| content_type_for(&cv.file_type).to_string());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        download_file_name(&cv.name, &cv.file_type)
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

/// GET /u/:slug
pub async fn handle_public_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    match assemble_public_profile(state.public_profiles.as_ref(), &slug).await? {
        Some(view) => Ok(Html(render_profile_page(&view)).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Html(render_not_found_page())).into_response()),
    }
}
