//! Axum route handlers for the caller's profile and avatar.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::ValidatedJson;
use crate::models::profile::ProfileRow;
use crate::profile::models::ProfileInput;
use crate::state::AppState;
use crate::storage::{self, key_from_public_url};
use crate::upload::{avatar_extension, read_form, MAX_AVATAR_BYTES};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Option<ProfileRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub profile: ProfileRow,
    pub avatar_url: String,
}

/// GET /api/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?;
    Ok(Json(ProfileResponse { profile }))
}

/// PUT /api/profile
///
/// Creates the profile on first save; `fullName` is written to the user.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<ProfileInput>,
) -> Result<Json<ProfileResponse>, AppError> {
    let mut tx = state.db.begin().await?;

    let renamed = sqlx::query("UPDATE users SET full_name = $2 WHERE id = $1")
        .bind(user.id)
        .bind(input.full_name.trim())
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if renamed == 0 {
        return Err(AppError::not_found("User"));
    }

    let profile = sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO profiles
            (user_id, title, bio, location, phone, website, github, linkedin,
             other_link, other_link_label, is_public)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (user_id) DO UPDATE SET
            title            = EXCLUDED.title,
            bio              = EXCLUDED.bio,
            location         = EXCLUDED.location,
            phone            = EXCLUDED.phone,
            website          = EXCLUDED.website,
            github           = EXCLUDED.github,
            linkedin         = EXCLUDED.linkedin,
            other_link       = EXCLUDED.other_link,
            other_link_label = EXCLUDED.other_link_label,
            is_public        = EXCLUDED.is_public,
            updated_at       = NOW()
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&input.title)
    .bind(&input.bio)
    .bind(&input.location)
    .bind(&input.phone)
    .bind(&input.website)
    .bind(&input.github)
    .bind(&input.linkedin)
    .bind(&input.other_link)
    .bind(&input.other_link_label)
    .bind(input.is_public)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    info!("Saved profile for user {}", user.id);
    Ok(Json(ProfileResponse {
        profile: Some(profile),
    }))
}

/// POST /api/profile/avatar (multipart: file)
pub async fn handle_upload_avatar(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<AvatarResponse>, AppError> {
    let mut form = read_form(multipart, &["file"]).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::Validation("File is required".to_string()))?;

    let ext = avatar_extension(&file.content_type).ok_or_else(|| {
        AppError::Validation("Invalid file type. Allowed types: JPG, PNG, WEBP".to_string())
    })?;
    if file.data.len() > MAX_AVATAR_BYTES {
        return Err(AppError::Validation(
            "File size must be less than 5MB".to_string(),
        ));
    }

    let previous: Option<String> = sqlx::query_scalar::<_, Option<String>>(
        "SELECT avatar_url FROM profiles WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .flatten();

    let key = format!("avatars/{}/{}.{ext}", user.id, Uuid::new_v4());
    storage::put_object(
        &state.s3,
        &state.config.s3_bucket,
        &key,
        file.data,
        &file.content_type,
    )
    .await?;
    let avatar_url = format!("{}/{key}", state.config.s3_public_url.trim_end_matches('/'));

    let saved = sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO profiles (user_id, avatar_url) VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET avatar_url = EXCLUDED.avatar_url, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&avatar_url)
    .fetch_one(&state.db)
    .await;
    let profile = match saved {
        Ok(profile) => profile,
        Err(e) => {
            storage::discard_object(&state.s3, &state.config.s3_bucket, &key).await;
            return Err(e.into());
        }
    };

    if let Some(stale) = replaced_avatar_key(&state.config.s3_public_url, previous.as_deref(), &key)
    {
        storage::discard_object(&state.s3, &state.config.s3_bucket, stale).await;
    }

    Ok(Json(AvatarResponse {
        profile,
        avatar_url,
    }))
}

/// Key of the previous avatar when it lives in our bucket and is not the
/// object just written.
fn replaced_avatar_key<'a>(
    public_base: &str,
    previous: Option<&'a str>,
    current_key: &str,
) -> Option<&'a str> {
    previous
        .and_then(|url| key_from_public_url(public_base, url))
        .filter(|key| *key != current_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:9000/test-bucket";

    #[test]
    fn test_replaced_avatar_key_from_own_bucket() {
        let previous = format!("{BASE}/avatars/u1/old.png");
        assert_eq!(
            replaced_avatar_key(BASE, Some(&previous), "avatars/u1/new.png"),
            Some("avatars/u1/old.png")
        );
    }

    #[test]
    fn test_replaced_avatar_key_skips_foreign_and_missing() {
        assert_eq!(replaced_avatar_key(BASE, None, "avatars/u1/new.png"), None);
        assert_eq!(
            replaced_avatar_key(BASE, Some("https://cdn.example.com/a.png"), "avatars/u1/new.png"),
            None
        );
        let same = format!("{BASE}/avatars/u1/new.png");
        assert_eq!(replaced_avatar_key(BASE, Some(&same), "avatars/u1/new.png"), None);
    }
}
