//! Request decoding helpers shared by every handler module.

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError};

use crate::errors::AppError;

/// JSON body extractor that runs `validator` rules after deserializing.
///
/// Malformed JSON and schema violations both surface as 400s, so handlers
/// never see an unvalidated payload.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Treats `""` (and whitespace-only strings) the same as an absent value.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// For partial updates: absent → `None` (leave unchanged),
/// `null` or `""` → `Some(None)` (clear), text → `Some(Some(text))`.
/// Pair with `#[serde(default)]`.
pub fn patch_text<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    blank_as_none(deserializer).map(Some)
}

/// For partial updates of non-text fields: absent → `None`, `null` →
/// `Some(None)`, value → `Some(Some(value))`. Pair with `#[serde(default)]`.
pub fn patch_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// True for absolute `http`/`https` URLs with a host.
pub fn is_web_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// `validator` hook for links that end up in an `href` or `src`.
pub fn web_url(value: &str) -> Result<(), ValidationError> {
    if is_web_url(value) {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}
