//! Extractors that turn axum rejections into structured `AppError` responses.
//!
//! `AppJson<T>` and `AppQuery<T>` replace `axum::Json<T>` / `axum::extract::Query<T>`
//! in handler signatures so a malformed body or a missing query parameter
//! produces a JSON `validation_failed` error instead of a plain-text rejection.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::request::Parts,
};

use crate::error::AppError;

const DOCS_HINT: &str = "Check the request against the endpoint's schema (GET /api-doc/openapi.json).";

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => Err(map_query_rejection(rejection)),
        }
    }
}

pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field_hint = extract_field_from_serde_message(&body_text);

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field_hint.unwrap_or("body".to_string())),
        received: None,
        docs_hint: Some(DOCS_HINT.to_string()),
    }
}

pub fn map_query_rejection(rejection: QueryRejection) -> AppError {
    let body_text = rejection.body_text();
    let field_hint = extract_field_from_serde_message(&body_text);

    AppError::Validation {
        message: format!("Invalid query string: {body_text}"),
        field: Some(field_hint.unwrap_or("query".to_string())),
        received: None,
        docs_hint: Some(DOCS_HINT.to_string()),
    }
}

/// Pull the field name out of serde's "missing field `x`" / "unknown field `x`".
fn extract_field_from_serde_message(msg: &str) -> Option<String> {
    ["missing field `", "unknown field `"].iter().find_map(|pattern| {
        let start = msg.find(pattern)? + pattern.len();
        let after = &msg[start..];
        after.find('`').map(|end| after[..end].to_string())
    })
}

/// Required, non-blank query value. Empty strings count as missing.
pub fn require_param(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation {
            message: format!("Missing {field} parameter"),
            field: Some(field.to_string()),
            received: None,
            docs_hint: Some(format!("Pass ?{field}=<value> in the query string.")),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_missing_field_name() {
        let msg = "Failed to deserialize: missing field `grams` at line 1 column 15";
        assert_eq!(extract_field_from_serde_message(msg), Some("grams".to_string()));
    }

    #[test]
    fn extracts_unknown_field_name() {
        let msg = "unknown field `gram`, expected `name` or `grams`";
        assert_eq!(extract_field_from_serde_message(msg), Some("gram".to_string()));
    }

    #[test]
    fn returns_none_for_generic_error() {
        let msg = "invalid type: string, expected f64";
        assert_eq!(extract_field_from_serde_message(msg), None);
    }

    #[test]
    fn require_param_rejects_blank_values() {
        assert_eq!(require_param(Some(" egg ".into()), "name").unwrap(), "egg");
        assert!(matches!(
            require_param(Some("   ".into()), "name"),
            Err(AppError::Validation { field: Some(ref f), .. }) if f == "name"
        ));
        assert!(require_param(None, "query").is_err());
    }
}
