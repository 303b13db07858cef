use serde::Serialize;
use thiserror::Error;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for AppError {
    /// Command-level rejections keep the kind the in-process store reports for
    /// the same mistake; everything else is an outage.
    fn from(err: redis::RedisError) -> Self {
        let message = err.to_string();
        if err.kind() == redis::ErrorKind::TypeError
            || err.code() == Some("WRONGTYPE")
            || message.contains("WRONGTYPE")
        {
            return AppError::Internal(message);
        }
        if err.kind() == redis::ErrorKind::ResponseError
            && err.detail().is_some_and(|d| d.contains("not a number"))
        {
            return AppError::InvalidInput(message);
        }
        AppError::StorageUnavailable(message)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamUnavailable(format!("request timed out: {}", err))
        } else {
            AppError::UpstreamUnavailable(err.to_string())
        }
    }
}

/// Machine-readable error shape handed to whatever surface sits on top of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDescriptor {
    pub kind: &'static str,
    pub message: String,
}

impl AppError {
    /// Stable snake_case kind for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::Serialization(_) => "serialization",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    /// Whether this error came from an upstream API rather than from local state.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamUnavailable(_) | AppError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(
            AppError::UpstreamUnavailable("x".into()).kind(),
            "upstream_unavailable"
        );
        assert_eq!(AppError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(AppError::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(
            AppError::StorageUnavailable("x".into()).kind(),
            "storage_unavailable"
        );
        assert_eq!(AppError::Internal("x".into()).kind(), "internal");
    }

    #[test]
    fn test_descriptor_carries_message() {
        let err = AppError::NotFound("token BONK".to_string());
        let descriptor = err.descriptor();
        assert_eq!(descriptor.kind, "not_found");
        assert_eq!(descriptor.message, "Not found: token BONK");

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["kind"], "not_found");
    }

    #[test]
    fn test_redis_type_errors_are_internal() {
        let err: AppError = redis::RedisError::from((redis::ErrorKind::TypeError, "WRONGTYPE")).into();
        assert_eq!(err.kind(), "internal");

        let err: AppError = redis::RedisError::from((
            redis::ErrorKind::ExtensionError,
            "WRONGTYPE",
            "Operation against a key holding the wrong kind of value".to_string(),
        ))
        .into();
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn test_redis_nan_score_is_invalid_input() {
        let err: AppError = redis::RedisError::from((
            redis::ErrorKind::ResponseError,
            "An error was signalled by the server",
            "resulting score is not a number (NaN)".to_string(),
        ))
        .into();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn test_redis_io_error_is_storage_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: AppError = redis::RedisError::from(io).into();
        assert_eq!(err.kind(), "storage_unavailable");
        assert!(!err.is_upstream());
    }

    #[test]
    fn test_serde_error_converts() {
        let err: AppError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.kind(), "serialization");
        assert!(!err.is_upstream());
    }
}
