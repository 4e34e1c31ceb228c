//! Visibility configuration store: validation and slug rules on top of the
//! repository.

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{AppError, FieldViolation};
use crate::models::public_profile::PublicProfileRow;
use crate::public_profile::models::PublicProfileInput;
use crate::public_profile::repository::PublicProfileRepository;

pub const SLUG_TAKEN: &str = "This username is already taken";

pub async fn get_config(
    repo: &dyn PublicProfileRepository,
    user_id: Uuid,
) -> Result<Option<PublicProfileRow>, AppError> {
    repo.find_by_user(user_id).await
}

/// Validates `input` and writes the caller's config.
///
/// The effective slug is `input.slug`, or the stored slug when the input
/// omits it. Enabling requires an effective slug. Nothing is written when
/// any check fails.
pub async fn upsert_config(
    repo: &dyn PublicProfileRepository,
    user_id: Uuid,
    input: PublicProfileInput,
) -> Result<PublicProfileRow, AppError> {
    input.validate()?;

    let existing = repo.find_by_user(user_id).await?;
    let slug = input
        .slug
        .clone()
        .or_else(|| existing.as_ref().and_then(|row| row.slug.clone()));

    if input.enabled && slug.is_none() {
        return Err(AppError::InvalidInput(vec![FieldViolation {
            field: "slug".to_string(),
            message: "A username is required to enable the public profile".to_string(),
        }]));
    }

    if let Some(slug) = slug.as_deref() {
        if !is_slug_available(repo, slug, Some(user_id)).await? {
            return Err(AppError::DomainRule(SLUG_TAKEN.to_string()));
        }
    }

    let row = repo.upsert(user_id, slug.as_deref(), &input).await?;
    info!(
        "Public profile saved for user {user_id} (slug={:?}, enabled={})",
        row.slug, row.enabled
    );
    Ok(row)
}

/// True when no config owns `slug`, or its only owner is `excluding`.
pub async fn is_slug_available(
    repo: &dyn PublicProfileRepository,
    slug: &str,
    excluding: Option<Uuid>,
) -> Result<bool, AppError> {
    let owner = repo.find_by_slug(slug).await?;
    Ok(match owner {
        None => true,
        Some(row) => Some(row.user_id) == excluding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::public_profile::memory::MemoryRepository;

    fn input(json: serde_json::Value) -> PublicProfileInput {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn test_no_config_yet_is_none() {
        let repo = MemoryRepository::new();
        let user = repo.seed_user("Jane Doe");
        assert!(get_config(&repo, user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_upsert_creates_row_with_defaults() {
        let repo = MemoryRepository::new();
        let user = repo.seed_user("Jane Doe");

        let row = upsert_config(&repo, user, input(serde_json::json!({ "slug": "jane-doe" })))
            .await
            .unwrap();

        assert_eq!(row.user_id, user);
        assert_eq!(row.slug.as_deref(), Some("jane-doe"));
        assert!(!row.enabled);
        assert!(row.show_profile && row.show_projects);
        assert!(!row.show_contact);
        assert_eq!(get_config(&repo, user).await.unwrap(), Some(row));
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let repo = MemoryRepository::new();
        let user = repo.seed_user("Jane Doe");
        let body = serde_json::json!({ "slug": "jane-doe", "enabled": true, "showContact": true });

        let first = upsert_config(&repo, user, input(body.clone())).await.unwrap();
        let second = upsert_config(&repo, user, input(body)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.slug, second.slug);
        assert_eq!(first.enabled, second.enabled);
        assert_eq!(first.show_contact, second.show_contact);
        assert_eq!(repo.config_count(), 1);
    }

    #[tokio::test]
    async fn test_slug_taken_by_other_user_rejected_and_state_unchanged() {
        let repo = MemoryRepository::new();
        let alice = repo.seed_user("Alice");
        let bob = repo.seed_user("Bob");

        upsert_config(&repo, alice, input(serde_json::json!({ "slug": "jane" })))
            .await
            .unwrap();
        let before = upsert_config(&repo, bob, input(serde_json::json!({ "slug": "bobby" })))
            .await
            .unwrap();

        let err = upsert_config(
            &repo,
            bob,
            input(serde_json::json!({ "slug": "jane", "enabled": true })),
        )
        .await
        .unwrap_err();

        match err {
            AppError::DomainRule(msg) => assert_eq!(msg, SLUG_TAKEN),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(get_config(&repo, bob).await.unwrap(), Some(before));
    }

    #[tokio::test]
    async fn test_own_slug_can_be_resubmitted() {
        let repo = MemoryRepository::new();
        let user = repo.seed_user("Jane");
        upsert_config(&repo, user, input(serde_json::json!({ "slug": "jane" })))
            .await
            .unwrap();
        let row = upsert_config(
            &repo,
            user,
            input(serde_json::json!({ "slug": "jane", "enabled": true })),
        )
        .await
        .unwrap();
        assert!(row.enabled);
    }

    #[tokio::test]
    async fn test_enable_without_slug_rejected() {
        let repo = MemoryRepository::new();
        let user = repo.seed_user("Jane");

        let err = upsert_config(&repo, user, input(serde_json::json!({ "enabled": true })))
            .await
            .unwrap_err();

        match err {
            AppError::InvalidInput(details) => assert_eq!(details[0].field, "slug"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(get_config(&repo, user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enable_falls_back_to_stored_slug() {
        let repo = MemoryRepository::new();
        let user = repo.seed_user("Jane");
        upsert_config(&repo, user, input(serde_json::json!({ "slug": "jane" })))
            .await
            .unwrap();

        let row = upsert_config(&repo, user, input(serde_json::json!({ "enabled": true })))
            .await
            .unwrap();
        assert!(row.enabled);
        assert_eq!(row.slug.as_deref(), Some("jane"));
    }

    #[tokio::test]
    async fn test_disable_keeps_slug() {
        let repo = MemoryRepository::new();
        let user = repo.seed_user("Jane");
        upsert_config(
            &repo,
            user,
            input(serde_json::json!({ "slug": "jane", "enabled": true })),
        )
        .await
        .unwrap();

        let row = upsert_config(&repo, user, input(serde_json::json!({ "enabled": false })))
            .await
            .unwrap();
        assert!(!row.enabled);
        assert_eq!(row.slug.as_deref(), Some("jane"));
    }

    #[tokio::test]
    async fn test_invalid_slug_rejected_before_write() {
        let repo = MemoryRepository::new();
        let user = repo.seed_user("Jane");
        let err = upsert_config(&repo, user, input(serde_json::json!({ "slug": "Jane Doe" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(repo.config_count(), 0);
    }

    #[tokio::test]
    async fn test_renamed_slug_frees_old_one() {
        let repo = MemoryRepository::new();
        let alice = repo.seed_user("Alice");
        let bob = repo.seed_user("Bob");

        upsert_config(&repo, alice, input(serde_json::json!({ "slug": "alpha" })))
            .await
            .unwrap();
        assert!(!is_slug_available(&repo, "alpha", Some(bob)).await.unwrap());

        upsert_config(&repo, alice, input(serde_json::json!({ "slug": "bravo" })))
            .await
            .unwrap();
        assert!(is_slug_available(&repo, "alpha", Some(bob)).await.unwrap());
        assert!(!is_slug_available(&repo, "bravo", Some(bob)).await.unwrap());
        assert!(is_slug_available(&repo, "bravo", Some(alice)).await.unwrap());
    }

    #[tokio::test]
    async fn test_availability_without_caller() {
        let repo = MemoryRepository::new();
        let user = repo.seed_user("Jane");
        assert!(is_slug_available(&repo, "jane", None).await.unwrap());
        upsert_config(&repo, user, input(serde_json::json!({ "slug": "jane" })))
            .await
            .unwrap();
        assert!(!is_slug_available(&repo, "jane", None).await.unwrap());
    }
}
