use crate::store::StoreError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// Erreur de validation rattachée à un champ de formulaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Chemin du champ (ex: "icu.available")
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Erreurs exposées par l'API REST
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("authentication required")]
    Unauthenticated,
    #[error("access denied")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid request: {0}")]
    BadRequest(String),
    /// Échec du Record Store, message générique côté client
    #[error("{context}")]
    Backend {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// Convertit une erreur du store en échec générique, journalisé sur place
    pub fn backend(context: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |source| {
            tracing::error!(error = %source, "{context}");
            ApiError::Backend { context, source }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Backend { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Validation(fields) => serde_json::json!({
                "error": self.to_string(),
                "fields": fields,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Accumulateur de violations pour la validation des formulaires
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Longueur en caractères dans [min, max]
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: Option<usize>, too_short: &str, too_long: &str) {
        let len = value.chars().count();
        if len < min {
            self.push(field, too_short);
        } else if max.is_some_and(|max| len > max) {
            self.push(field, too_long);
        }
    }

    pub fn email(&mut self, field: &str, value: &str, message: &str) {
        if !EMAIL.is_match(value) {
            self.push(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Validation(vec![]).status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::backend("update failed")(StoreError::Unavailable("down".into()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "update failed");
    }

    #[test]
    fn test_violations_length_bounds() {
        let mut v = Violations::new();
        v.length("issue", "short", 20, Some(2000), "too short", "too long");
        v.length("comment", &"x".repeat(11), 10, Some(10), "too short", "too long");
        v.length("title", "hello", 5, None, "too short", "too long");
        v.email("email", "not-an-email", "Invalid email address.");
        v.email("email", "jane@example.com", "Invalid email address.");
        let errors = v.into_inner();
        assert_eq!(
            errors,
            vec![
                FieldError::new("issue", "too short"),
                FieldError::new("comment", "too long"),
                FieldError::new("email", "Invalid email address."),
            ]
        );
    }
}
