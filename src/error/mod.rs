//! Error types for thinkcap.

use thiserror::Error;

/// Primary error type for all thinkcap operations.
#[derive(Error, Debug)]
pub enum ThinkcapError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Turn cancelled")]
    Cancelled,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Protocol,
    Configuration,
    Cancelled,
    Unknown,
}

impl ThinkcapError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) | Self::ConfigFile(_) => ErrorCategory::Configuration,
            Self::Serialization(_) | Self::Stream(_) => ErrorCategory::Protocol,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Io(_) | Self::InvalidArgument(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether this error came from the generation endpoint call or its stream.
    ///
    /// A transport failure aborts the whole turn; nothing from the failed pass
    /// is kept and the transcript is restored to its pre-turn state.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Authentication
                | ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
                | ErrorCategory::Api
                | ErrorCategory::Protocol
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ThinkcapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_maps_to_category() {
        assert_eq!(
            ThinkcapError::api(401, "nope").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            ThinkcapError::api(429, "slow down").category(),
            ErrorCategory::RateLimit
        );
        assert_eq!(
            ThinkcapError::api(503, "overloaded").category(),
            ErrorCategory::Server
        );
        assert_eq!(
            ThinkcapError::api(400, "bad").category(),
            ErrorCategory::Api
        );
    }

    #[test]
    fn stream_and_api_failures_are_transport() {
        assert!(ThinkcapError::Stream("closed".into()).is_transport());
        assert!(ThinkcapError::api(500, "boom").is_transport());
        assert!(ThinkcapError::Timeout(1_000).is_transport());
    }

    #[test]
    fn local_failures_are_not_transport() {
        assert!(!ThinkcapError::Cancelled.is_transport());
        assert!(!ThinkcapError::Configuration("x".into()).is_transport());
        assert!(!ThinkcapError::InvalidArgument("x".into()).is_transport());
    }

    #[test]
    fn display_includes_status() {
        let err = ThinkcapError::api(502, "bad gateway");
        assert_eq!(err.to_string(), "API error (status 502): bad gateway");
    }
}
