use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// A single field-level violation surfaced to the caller in `details`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input")]
    InvalidInput(Vec<FieldViolation>),

    #[error("{0}")]
    DomainRule(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidInput(_) | AppError::DomainRule(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::InvalidInput(flatten_validation_errors(&errors))
    }
}

/// Flattens `validator` output into a stable, sorted list of `FieldViolation`s.
/// Struct-level (`__all__`) errors carry their own field name in the `field` param.
pub fn flatten_validation_errors(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut out: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let field = e
                    .params
                    .get("field")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| camel_case(field));
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", e.code));
                FieldViolation { field, message }
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field).then(a.message.cmp(&b.message)));
    out
}

/// `selected_project_ids` → `selectedProjectIds`, matching the JSON wire names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message, details) = match &self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone(), None),
            AppError::InvalidInput(violations) => (
                "VALIDATION_ERROR",
                "Invalid input".to_string(),
                Some(violations.clone()),
            ),
            AppError::DomainRule(msg) => ("DOMAIN_RULE_VIOLATION", msg.clone(), None),
            AppError::Unauthorized(_) => ("UNAUTHORIZED", "Unauthorized".to_string(), None),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                ("INTERNAL_ERROR", "Internal server error".to_string(), None)
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                ("INTERNAL_ERROR", "Internal server error".to_string(), None)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                ("INTERNAL_ERROR", "Internal server error".to_string(), None)
            }
        };

        let body = match details {
            Some(details) => json!({ "error": message, "code": code, "details": details }),
            None => json!({ "error": message, "code": code }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::not_found("Skill").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::DomainRule("taken".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidInput(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("missing token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Storage("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        match AppError::not_found("Experience") {
            AppError::NotFound(msg) => assert_eq!(msg, "Experience not found"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("selected_project_ids"), "selectedProjectIds");
        assert_eq!(camel_case("slug"), "slug");
    }

    #[test]
    fn test_flatten_uses_camel_case_and_messages() {
        let mut errors = ValidationErrors::new();
        let mut e = ValidationError::new("length");
        e.message = Some("Username must be at least 3 characters".into());
        errors.add("slug", e);
        errors.add("selected_cv_id", ValidationError::new("custom"));

        let flat = flatten_validation_errors(&errors);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].field, "selectedCvId");
        assert_eq!(flat[0].message, "Invalid value (custom)");
        assert_eq!(flat[1].field, "slug");
        assert_eq!(flat[1].message, "Username must be at least 3 characters");
    }

    #[test]
    fn test_flatten_prefers_field_param_for_schema_errors() {
        let mut errors = ValidationErrors::new();
        let mut e = ValidationError::new("slug_required");
        e.add_param("field".into(), &"slug");
        e.message = Some("A username is required to enable the public profile".into());
        errors.add("__all__", e);

        let flat = flatten_validation_errors(&errors);
        assert_eq!(flat[0].field, "slug");
    }
}
