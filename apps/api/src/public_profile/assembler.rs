//! Builds the read model an anonymous visitor sees for a slug.
//!
//! Config and owner lookups are fatal; the four content categories are loaded
//! concurrently and each degrades to an empty list on failure.

use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::public_profile::models::{
    PublicDocument, PublicExperience, PublicProfileView, PublicSettings, PublicUser,
};
use crate::public_profile::repository::PublicProfileRepository;

/// `Ok(None)` covers every "nothing to show" case: unknown slug, disabled
/// config, or a config whose owner no longer exists.
pub async fn assemble_public_profile(
    repo: &dyn PublicProfileRepository,
    slug: &str,
) -> Result<Option<PublicProfileView>, AppError> {
    let Some(config) = repo.find_by_slug(slug).await? else {
        return Ok(None);
    };
    if !config.enabled {
        return Ok(None);
    }
    let Some(owner) = repo.find_owner(config.user_id).await? else {
        return Ok(None);
    };

    let user_id = owner.id;
    let (skills, experiences, documents, portfolio_items) = tokio::join!(
        repo.proven_skills(user_id),
        repo.experiences(user_id),
        repo.cv_documents(user_id),
        repo.portfolio_items(user_id, &config.selected_project_ids),
    );

    let skills = or_empty(skills, "skills", slug);
    let experiences = select_experiences(
        or_empty(experiences, "experiences", slug),
        &config.selected_experience_ids,
    );
    let documents = or_empty(documents, "documents", slug);
    let portfolio_items = or_empty(portfolio_items, "portfolio items", slug);
    let selected_cv = resolve_selected_cv(&documents, config.selected_cv_id);

    Ok(Some(PublicProfileView {
        settings: PublicSettings::from_row(&config, slug),
        selected_cv,
        user: PublicUser {
            id: owner.id,
            full_name: owner.full_name,
            profile: owner.profile,
            skills,
            experiences,
            documents,
            portfolio_items,
        },
    }))
}

fn or_empty<T>(result: Result<Vec<T>, AppError>, category: &str, slug: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("Public profile '{slug}': failed to load {category}, showing none: {e}");
        Vec::new()
    })
}

/// An empty selection means every experience.
pub fn select_experiences(all: Vec<PublicExperience>, selected: &[Uuid]) -> Vec<PublicExperience> {
    if selected.is_empty() {
        return all;
    }
    all.into_iter()
        .filter(|e| selected.contains(&e.id))
        .collect()
}

pub fn resolve_selected_cv(
    documents: &[PublicDocument],
    selected: Option<Uuid>,
) -> Option<PublicDocument> {
    let id = selected?;
    documents.iter().find(|d| d.id == id).cloned()
}
