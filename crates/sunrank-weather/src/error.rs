//! Weather-specific error types.

use sunrank_core::{AppError, CacheError, NetworkError, ReqwestErrorExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WeatherError {
    /// User-friendly error message for terminal display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Status(code) if *code >= 500 => {
                "The forecast service is having trouble. Try again later.".to_string()
            }
            Self::Status(code) => format!("The forecast service rejected the request ({})", code),
            Self::Parse(_) | Self::MissingField(_) => {
                "The forecast service returned unexpected data.".to_string()
            }
            Self::Catalog(msg) => format!("City list unavailable: {}", msg),
            Self::Cache(_) | Self::Store(_) => "Local cache error".to_string(),
            Self::Io(_) => "A file operation failed.".to_string(),
        }
    }

    /// Whether the same request could succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Status(code) => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}

/// Errors raised by [`crate::store::KeyValueStore`] implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Status(status) => AppError::Network(NetworkError::Status {
                status,
                message: format!("forecast API returned {}", status),
            }),
            WeatherError::Parse(msg) => AppError::Forecast(msg),
            WeatherError::MissingField(field) => {
                AppError::Forecast(format!("missing field {}", field))
            }
            WeatherError::Catalog(msg) => AppError::Catalog(msg),
            WeatherError::Cache(msg) => AppError::Cache(CacheError::Rejected(msg)),
            WeatherError::Store(e) => AppError::Cache(CacheError::Storage(e.to_string())),
            WeatherError::Io(e) => AppError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_messages() {
        assert!(WeatherError::Status(503).user_message().contains("later"));
        assert!(WeatherError::Status(400).user_message().contains("400"));
        assert!(WeatherError::MissingField("sunshine_duration")
            .user_message()
            .contains("unexpected"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(WeatherError::Status(500).is_retryable());
        assert!(WeatherError::Status(429).is_retryable());
        assert!(!WeatherError::Status(404).is_retryable());
        assert!(!WeatherError::Parse("bad".into()).is_retryable());
    }

    #[test]
    fn test_maps_into_app_error() {
        let app: AppError = WeatherError::Status(502).into();
        assert!(matches!(
            app,
            AppError::Network(NetworkError::Status { status: 502, .. })
        ));

        let app: AppError = WeatherError::Catalog("no features".into()).into();
        assert!(matches!(app, AppError::Catalog(_)));

        let app: AppError = WeatherError::Store(StoreError::InvalidKey("../x".into())).into();
        assert!(matches!(app, AppError::Cache(CacheError::Storage(_))));
    }
}
