pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;
use crate::upload::{MAX_AVATAR_BYTES, MAX_DOCUMENT_BYTES};
use crate::{
    account, applications, dashboard, documents, experience, portfolio, profile, public_profile,
    skills,
};

/// Room for multipart boundaries and the text fields around a file.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Account
        .route(
            "/api/user",
            get(account::handlers::handle_get_user).put(account::handlers::handle_update_user),
        )
        .route(
            "/api/profile",
            get(profile::handlers::handle_get_profile)
                .put(profile::handlers::handle_update_profile),
        )
        .route(
            "/api/profile/avatar",
            post(profile::handlers::handle_upload_avatar)
                .layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .route("/api/dashboard", get(dashboard::handlers::handle_dashboard))
        // Skills
        .route(
            "/api/skills",
            get(skills::handlers::handle_list_skills).post(skills::handlers::handle_create_skill),
        )
        .route(
            "/api/skills/categories",
            get(skills::handlers::handle_list_categories)
                .post(skills::handlers::handle_create_category),
        )
        .route(
            "/api/skills/categories/:id",
            put(skills::handlers::handle_update_category)
                .delete(skills::handlers::handle_delete_category),
        )
        .route(
            "/api/skills/:id",
            put(skills::handlers::handle_update_skill).delete(skills::handlers::handle_delete_skill),
        )
        // Experience
        .route(
            "/api/experience",
            get(experience::handlers::handle_list_experiences)
                .post(experience::handlers::handle_create_experience),
        )
        .route(
            "/api/experience/:id",
            get(experience::handlers::handle_get_experience)
                .put(experience::handlers::handle_update_experience)
                .delete(experience::handlers::handle_delete_experience),
        )
        // Portfolio
        .route(
            "/api/portfolio",
            get(portfolio::handlers::handle_list_items)
                .post(portfolio::handlers::handle_create_item),
        )
        .route(
            "/api/portfolio/:id",
            get(portfolio::handlers::handle_get_item)
                .put(portfolio::handlers::handle_update_item)
                .delete(portfolio::handlers::handle_delete_item),
        )
        // Documents
        .route(
            "/api/documents",
            get(documents::handlers::handle_list_documents).post(
                documents::handlers::handle_upload_document
                    .layer(DefaultBodyLimit::max(MAX_DOCUMENT_BYTES + FORM_OVERHEAD_BYTES)),
            ),
        )
        .route(
            "/api/documents/:id",
            put(documents::handlers::handle_update_document)
                .delete(documents::handlers::handle_delete_document),
        )
        .route(
            "/api/documents/:id/download",
            get(documents::handlers::handle_download_document),
        )
        // Applications
        .route(
            "/api/applications",
            get(applications::handlers::handle_list_applications).post(
                applications::handlers::handle_create_application
                    .layer(DefaultBodyLimit::max(2 * MAX_DOCUMENT_BYTES + FORM_OVERHEAD_BYTES)),
            ),
        )
        .route(
            "/api/applications/:id",
            get(applications::handlers::handle_get_application)
                .put(applications::handlers::handle_update_application)
                .delete(applications::handlers::handle_delete_application),
        )
        .route(
            "/api/applications/:id/archive",
            put(applications::handlers::handle_archive_application),
        )
        // Public profile
        .route(
            "/api/public-profile",
            get(public_profile::handlers::handle_get_config)
                .put(public_profile::handlers::handle_upsert_config),
        )
        .route(
            "/api/public-profile/check-slug",
            get(public_profile::handlers::handle_check_slug),
        )
        .route(
            "/api/public-profile/:slug",
            get(public_profile::handlers::handle_get_public_profile),
        )
        .route(
            "/api/public-profile/:slug/cv",
            get(public_profile::handlers::handle_download_public_cv),
        )
        .route("/u/:slug", get(public_profile::handlers::handle_public_page))
        .with_state(state)
}
