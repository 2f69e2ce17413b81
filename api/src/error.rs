use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use foodstats_core::catalog::CatalogError;
use foodstats_core::error::{self, ApiError};
use foodstats_core::ledger::LedgerError;
use foodstats_core::profile::ProfileError;
use foodstats_core::recommend::RecommenderError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Unknown ingredient or recipe (404)
    NotFound { resource: String },
    /// Ingredient already in the session, recipe name taken (409)
    Conflict {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
    },
    /// Catalog storage unavailable (500)
    Storage(String),
    /// Collaborator or other internal failure (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("{resource} not found"),
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::Conflict {
                message,
                field,
                received,
            } => (
                StatusCode::CONFLICT,
                ApiError {
                    error: error::codes::CONFLICT.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::Storage(msg) => {
                tracing::error!(request_id = %request_id, "Catalog storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "The food catalog is temporarily unavailable".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = %request_id, "Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(resource) => AppError::NotFound { resource },
            CatalogError::Invalid { field, message } => AppError::Validation {
                message,
                field: Some(field),
                received: None,
                docs_hint: Some(
                    "Names may contain letters, digits, spaces and - . , ( ); grams must be in (0, 10000]."
                        .to_string(),
                ),
            },
            CatalogError::Duplicate(name) => AppError::Conflict {
                message: format!("Recipe '{name}' already exists"),
                field: Some("name".to_string()),
                received: Some(serde_json::Value::String(name)),
            },
            CatalogError::Storage(msg) => AppError::Storage(msg),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Invalid { field, message } => AppError::Validation {
                message,
                field: Some(field.to_string()),
                received: None,
                docs_hint: Some(
                    "Send {\"name\": <non-empty string>, \"grams\": <number > 0>}.".to_string(),
                ),
            },
            LedgerError::Unknown(name) => AppError::NotFound {
                resource: format!("Ingredient '{name}'"),
            },
            LedgerError::AlreadyExists(name) => AppError::Conflict {
                message: format!("Ingredient '{name}' already added"),
                field: Some("name".to_string()),
                received: Some(serde_json::Value::String(name)),
            },
            LedgerError::Catalog(err) => err.into(),
        }
    }
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Invalid { field, message } => AppError::Validation {
                message,
                field: Some(field.to_string()),
                received: None,
                docs_hint: Some(
                    "age 1-120, weight 20-300 kg, height 100-250 cm.".to_string(),
                ),
            },
        }
    }
}

impl From<RecommenderError> for AppError {
    fn from(err: RecommenderError) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn ledger_errors_map_to_distinct_statuses() {
        let (status, body) = body_json(LedgerError::AlreadyExists("egg".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
        assert_eq!(body["received"], "egg");

        let (status, body) = body_json(LedgerError::Unknown("tofu".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, body) = body_json(
            LedgerError::Invalid {
                field: "grams",
                message: "grams must be greater than zero".into(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "grams");
    }

    #[tokio::test]
    async fn storage_failure_hides_details() {
        let (status, body) = body_json(
            LedgerError::Catalog(CatalogError::Storage("connection refused".into())).into(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("refused"));
        assert!(body["request_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn recommender_failure_is_internal_and_hides_details() {
        let (status, body) = body_json(
            RecommenderError::Exit {
                status: "exit status: 1".into(),
                stderr: "ModuleNotFoundError: sklearn".into(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An internal error occurred");
    }
}
