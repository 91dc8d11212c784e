//! C8: error taxonomy and response shaping.
//!
//! One sum type covers every failure mode the engine can produce. Each
//! variant carries enough context to render the uniform response shape in
//! [`EngineError::to_response`] without the caller needing to know which
//! branch fired — a typed enum and dispatch table instead of ad-hoc string
//! construction at each call site.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Security,
    RateLimit,
    BusinessLogic,
    State,
    CircuitBreaker,
    Configuration,
    Internal,
}

impl ErrorCategory {
    /// HTTP-style status mapping for each error category.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorCategory::Validation | ErrorCategory::BusinessLogic => 400,
            ErrorCategory::Security => 403,
            ErrorCategory::RateLimit => 429,
            ErrorCategory::State | ErrorCategory::Internal => 500,
            ErrorCategory::CircuitBreaker => 503,
            ErrorCategory::Configuration => 400,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        correlation_id: Uuid,
    },

    #[error("security check failed: {message}")]
    Security {
        message: String,
        correlation_id: Uuid,
    },

    #[error("rate limit exceeded, retry after {retry_after}s")]
    RateLimit {
        retry_after: u64,
        correlation_id: Uuid,
    },

    #[error("business logic violation: {message}")]
    BusinessLogic {
        message: String,
        correlation_id: Uuid,
    },

    #[error("invalid internal state: {message}")]
    State {
        message: String,
        correlation_id: Uuid,
    },

    #[error("circuit breaker open: {message}")]
    CircuitBreaker {
        message: String,
        correlation_id: Uuid,
    },

    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        correlation_id: Uuid,
    },

    #[error("internal error: {message}")]
    Internal {
        message: String,
        correlation_id: Uuid,
    },
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation {
            message: message.into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn security(message: impl Into<String>) -> Self {
        EngineError::Security {
            message: message.into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn rate_limit(retry_after: u64) -> Self {
        EngineError::RateLimit {
            retry_after,
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Operational limits: tree/history caps exceeded are
    /// surfaced as `BusinessLogic` with the `RESOURCE_EXHAUSTED` tag.
    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        EngineError::BusinessLogic {
            message: format!("RESOURCE_EXHAUSTED: {}", message.into()),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        EngineError::State {
            message: message.into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        EngineError::Configuration {
            message: message.into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal {
            message: message.into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::Validation { .. } => ErrorCategory::Validation,
            EngineError::Security { .. } => ErrorCategory::Security,
            EngineError::RateLimit { .. } => ErrorCategory::RateLimit,
            EngineError::BusinessLogic { .. } => ErrorCategory::BusinessLogic,
            EngineError::State { .. } => ErrorCategory::State,
            EngineError::CircuitBreaker { .. } => ErrorCategory::CircuitBreaker,
            EngineError::Configuration { .. } => ErrorCategory::Configuration,
            EngineError::Internal { .. } => ErrorCategory::Internal,
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        match self {
            EngineError::Validation { correlation_id, .. }
            | EngineError::Security { correlation_id, .. }
            | EngineError::RateLimit { correlation_id, .. }
            | EngineError::BusinessLogic { correlation_id, .. }
            | EngineError::State { correlation_id, .. }
            | EngineError::CircuitBreaker { correlation_id, .. }
            | EngineError::Configuration { correlation_id, .. }
            | EngineError::Internal { correlation_id, .. } => *correlation_id,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The dispatcher: always matches, regardless of which branch this is.
    /// No error escapes without a structured response.
    pub fn to_response(&self) -> ErrorResponse {
        let status_code = self.category().status_code();
        let mut body = ErrorBody {
            message: self.message(),
            category: self.category(),
            status_code,
            timestamp: chrono::Utc::now().to_rfc3339(),
            correlation_id: self.correlation_id().to_string(),
            retry_after: None,
        };
        if let EngineError::RateLimit { retry_after, .. } = self {
            body.retry_after = Some(*retry_after);
        }

        ErrorResponse {
            content: vec![ErrorContent {
                content_type: "text",
                text: serde_json::to_string(&body)
                    .unwrap_or_else(|_| "{\"message\":\"error serialization failed\"}".to_string()),
            }],
            is_error: true,
            status_code,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub category: ErrorCategory,
    pub status_code: u16,
    pub timestamp: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

/// Uniform response shape for every failure path.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub content: Vec<ErrorContent>,
    pub is_error: bool,
    pub status_code: u16,
}
