//! Storage seam for the public-profile store and assembler.
//!
//! `AppState` holds an `Arc<dyn PublicProfileRepository>`: Postgres in
//! production, an in-memory map in tests.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::models::public_profile::PublicProfileRow;
use crate::public_profile::models::{
    PublicDocument, PublicExperience, PublicOwner, PublicPortfolioItem, PublicProfileDetails,
    PublicProfileInput, PublicSkill,
};
use crate::public_profile::service::SLUG_TAKEN;

const SLUG_CONSTRAINT: &str = "public_profiles_slug_key";

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait PublicProfileRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<PublicProfileRow>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PublicProfileRow>, AppError>;

    /// Creates or replaces the caller's config. `slug` is the effective slug
    /// already resolved by the service. A slug held by another user fails
    /// with the slug-taken domain error.
    async fn upsert(
        &self,
        user_id: Uuid,
        slug: Option<&str>,
        input: &PublicProfileInput,
    ) -> Result<PublicProfileRow, AppError>;

    async fn find_owner(&self, user_id: Uuid) -> Result<Option<PublicOwner>, AppError>;

    /// Skills linked to at least one project, by category order then name.
    async fn proven_skills(&self, user_id: Uuid) -> Result<Vec<PublicSkill>, AppError>;

    /// Every experience of the user, newest start date first.
    async fn experiences(&self, user_id: Uuid) -> Result<Vec<PublicExperience>, AppError>;

    /// CV documents, newest first.
    async fn cv_documents(&self, user_id: Uuid) -> Result<Vec<PublicDocument>, AppError>;

    /// The user's portfolio items whose id is in `ids`, by `order` then newest.
    async fn portfolio_items(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<PublicPortfolioItem>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct PgPublicProfileRepository {
    pool: PgPool,
}

impl PgPublicProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OwnerRow {
    id: Uuid,
    full_name: String,
}

#[async_trait]
impl PublicProfileRepository for PgPublicProfileRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<PublicProfileRow>, AppError> {
        let row = sqlx::query_as::<_, PublicProfileRow>(
            "SELECT * FROM public_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PublicProfileRow>, AppError> {
        let row =
            sqlx::query_as::<_, PublicProfileRow>("SELECT * FROM public_profiles WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        slug: Option<&str>,
        input: &PublicProfileInput,
    ) -> Result<PublicProfileRow, AppError> {
        sqlx::query_as::<_, PublicProfileRow>(
            r#"
            INSERT INTO public_profiles
                (user_id, slug, enabled, seo_indexable, show_profile, show_skills,
                 show_experience, show_projects, show_contact, allow_cv_request,
                 selected_project_ids, selected_experience_ids, selected_cv_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id) DO UPDATE SET
                slug                    = EXCLUDED.slug,
                enabled                 = EXCLUDED.enabled,
                seo_indexable           = EXCLUDED.seo_indexable,
                show_profile            = EXCLUDED.show_profile,
                show_skills             = EXCLUDED.show_skills,
                show_experience         = EXCLUDED.show_experience,
                show_projects           = EXCLUDED.show_projects,
                show_contact            = EXCLUDED.show_contact,
                allow_cv_request        = EXCLUDED.allow_cv_request,
                selected_project_ids    = EXCLUDED.selected_project_ids,
                selected_experience_ids = EXCLUDED.selected_experience_ids,
                selected_cv_id          = EXCLUDED.selected_cv_id,
                updated_at              = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(slug)
        .bind(input.enabled)
        .bind(input.seo_indexable)
        .bind(input.show_profile)
        .bind(input.show_skills)
        .bind(input.show_experience)
        .bind(input.show_projects)
        .bind(input.show_contact)
        .bind(input.allow_cv_request)
        .bind(&input.selected_project_ids)
        .bind(&input.selected_experience_ids)
        .bind(input.selected_cv_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, SLUG_CONSTRAINT) {
                AppError::DomainRule(SLUG_TAKEN.to_string())
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn find_owner(&self, user_id: Uuid) -> Result<Option<PublicOwner>, AppError> {
        let Some(user) =
            sqlx::query_as::<_, OwnerRow>("SELECT id, full_name FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };

        let profile = sqlx::query_as::<_, PublicProfileDetails>(
            r#"
            SELECT title, bio, location, phone, avatar_url, website, github,
                   linkedin, other_link, other_link_label
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(Some(PublicOwner {
            id: user.id,
            full_name: user.full_name,
            profile,
        }))
    }

    async fn proven_skills(&self, user_id: Uuid) -> Result<Vec<PublicSkill>, AppError> {
        let rows = sqlx::query_as::<_, PublicSkill>(
            r#"
            SELECT s.id, s.name, s.level, sc.name AS category_name,
                   COUNT(ps.id) AS project_count
            FROM skills s
            JOIN skill_categories sc ON sc.id = s.category_id
            JOIN project_skills ps ON ps.skill_id = s.id
            WHERE s.user_id = $1
            GROUP BY s.id, sc.id
            ORDER BY sc."order" ASC, s.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn experiences(&self, user_id: Uuid) -> Result<Vec<PublicExperience>, AppError> {
        let rows = sqlx::query_as::<_, PublicExperience>(
            r#"
            SELECT id, company, role, start_date, end_date, location, bullets
            FROM experiences
            WHERE user_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn cv_documents(&self, user_id: Uuid) -> Result<Vec<PublicDocument>, AppError> {
        let rows = sqlx::query_as::<_, PublicDocument>(
            r#"
            SELECT id, name, file_url, file_type, created_at
            FROM documents
            WHERE user_id = $1 AND type = 'CV'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn portfolio_items(
        &self,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<PublicPortfolioItem>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, PublicPortfolioItem>(
            r#"
            SELECT id, title, description, url, tags, image_url
            FROM portfolio_items
            WHERE user_id = $1 AND id = ANY($2)
            ORDER BY "order" ASC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
