use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use super::now_rfc3339;
use crate::models::issue::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Issue with ID '{0}' not found")]
    IssueNotFound(String),
    #[error("No API route for {0}")]
    RouteNotFound(String),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
    #[error("{0}")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::IssueNotFound(_) | ApiError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::InvalidQuery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::IssueNotFound(_) => "ISSUE_NOT_FOUND",
            ApiError::RouteNotFound(_) => "NOT_FOUND",
            ApiError::Validation(_) | ApiError::InvalidQuery(_) | ApiError::InvalidBody(_) => {
                "VALIDATION_ERROR"
            }
            ApiError::Database(_) | ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn body(&self) -> Value {
        let timestamp = now_rfc3339();
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => json!({
                "error": {
                    "code": self.code(),
                    "message": "An unexpected error occurred",
                    "details": self.to_string(),
                    "timestamp": timestamp,
                }
            }),
            ApiError::InvalidBody(rejection) => json!({
                "detail": {
                    "error": {
                        "code": self.code(),
                        "message": rejection.body_text(),
                        "timestamp": timestamp,
                    }
                }
            }),
            _ => json!({
                "detail": {
                    "error": {
                        "code": self.code(),
                        "message": self.to_string(),
                        "timestamp": timestamp,
                    }
                }
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("api error: {}", self);
        } else {
            log::debug!("api error: {}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_body_matches_client_contract() {
        let err = ApiError::IssueNotFound("iss-1".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let body = err.body();
        assert_eq!(body["detail"]["error"]["code"], "ISSUE_NOT_FOUND");
        assert_eq!(
            body["detail"]["error"]["message"],
            "Issue with ID 'iss-1' not found"
        );
    }

    #[test]
    fn internal_errors_hide_behind_generic_message() {
        let err = ApiError::Internal(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body["error"]["message"], "An unexpected error occurred");
        assert_eq!(body["error"]["details"], "disk on fire");
    }
}
