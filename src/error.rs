use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Structural failures of catalog registration and lookup.
///
/// Registration errors are returned to the caller of `register`; the startup
/// composition decides whether to abort or skip the offending tool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid tool: {0}")]
    InvalidTool(String),

    #[error("tool handler cannot be missing for internal tool {0}")]
    MissingHandler(String),

    #[error("tool {0} already registered")]
    DuplicateName(String),

    #[error("tool not found: {0}")]
    NotFound(String),
}

/// Failures inside the ranking subsystem. These are recovered locally:
/// a tool that cannot be embedded is skipped, an unavailable strategy
/// falls back to TF-IDF.
#[derive(Error, Debug)]
pub enum RankingError {
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("ranking strategy unavailable: {0}")]
    StrategyUnavailable(String),

    #[error("ranking provider failed: {0}")]
    Provider(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Service temporarily unavailable: {0}")]
    ResourceError(String),

    #[error("Tool ingestion failed: {0}")]
    IngestionError(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Ranking(#[from] RankingError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Validation error");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::ResourceError(msg) => {
                tracing::warn!(error = %msg, "Resource error");
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            AppError::IngestionError(msg) => {
                tracing::error!(error = %msg, "Ingestion error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Catalog(CatalogError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::Catalog(e) => {
                tracing::warn!(error = %e, "Catalog error");
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::Ranking(e) => {
                tracing::error!(error = %e, "Ranking error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_maps_to_400() {
        let response = AppError::ValidationError("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_catalog_not_found_maps_to_404() {
        let response = AppError::from(CatalogError::NotFound("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_name_message() {
        let err = CatalogError::DuplicateName("fs_read".into());
        assert_eq!(err.to_string(), "tool fs_read already registered");
    }
}
