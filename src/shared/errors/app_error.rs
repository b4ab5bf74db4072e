use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    /// Quota exhaustion or credential rejection. The batch orchestrator
    /// cools the credential down and re-queues the job on this variant.
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// The remote model answered but produced no usable image.
    #[error("Generation failed: {0}")]
    GenerationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl AppError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AppError::RateLimitError(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::ExternalServiceError("Request timeout".to_string())
        } else if err.is_connect() {
            AppError::ExternalServiceError("Failed to connect to external service".to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                // Auth rejections cool the key down the same way quota errors do.
                429 | 401 | 403 => AppError::RateLimitError(format!("HTTP {}", status)),
                404 => AppError::NotFound("External resource not found".to_string()),
                _ => AppError::ApiError(format!("HTTP {}: {}", status, err)),
            }
        } else {
            AppError::ApiError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::ValidationError(format!("Invalid base64 payload: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::StorageError(err.to_string()),
        }
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limit_variant_is_retryable() {
        assert!(AppError::RateLimitError("quota".into()).is_rate_limit());
        assert!(!AppError::GenerationError("no image".into()).is_rate_limit());
        assert!(!AppError::ValidationError("empty".into()).is_rate_limit());
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let json = serde_json::to_value(AppError::GenerationError("blocked".into())).unwrap();
        assert_eq!(json["type"], "GenerationError");
        assert_eq!(json["message"], "blocked");
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
