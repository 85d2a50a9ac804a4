//! Centralized error types for SunRank.
//!
//! Library crates keep their own precise error enums and map into
//! [`AppError`] at the edge, where `user_message()` gives the text shown on
//! the terminal while the full error goes to the log.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Forecast error: {0}")]
    Forecast(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Short, non-technical message for the terminal.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Cache(e) => e.user_message(),
            AppError::Catalog(_) => "The city list could not be loaded. Check the catalog source.",
            AppError::Forecast(_) => "No usable forecast came back for that city.",
            AppError::Io(_) => "Reading or writing a local file failed.",
            AppError::Other(_) => "Something went wrong. Run with --verbose for details.",
        }
    }
}

/// Failures talking to the forecast API or a remote catalog.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("could not reach {0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("undecodable body: {0}")]
    Decode(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::Unreachable(_) => "Open-Meteo is unreachable. Are you online?",
            NetworkError::Timeout => "Open-Meteo took too long to answer. Try again shortly.",
            NetworkError::Status { status: 429, .. } => {
                "Open-Meteo is rate limiting requests. Wait a minute and retry."
            }
            NetworkError::Status { status, .. } if *status >= 500 => {
                "Open-Meteo is having problems right now. Try again later."
            }
            NetworkError::Status { .. } => "Open-Meteo rejected the forecast request.",
            NetworkError::Decode(_) => "Open-Meteo sent a response SunRank could not read.",
        }
    }
}

/// Local snapshot storage errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage failed: {0}")]
    Storage(String),

    #[error("cached data is corrupt: {0}")]
    Corruption(String),

    #[error("snapshot rejected: {0}")]
    Rejected(String),
}

impl CacheError {
    pub fn user_message(&self) -> &'static str {
        match self {
            CacheError::Storage(_) => "Cached rankings could not be read or saved.",
            CacheError::Corruption(_) => "Cached rankings were corrupt and have been discarded.",
            CacheError::Rejected(_) => "Rankings were not saved because they were incomplete.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config file at {0}")]
    Missing(String),

    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Missing(_) => "The config file passed with --config does not exist.",
            ConfigError::Invalid(_) => "The config file has invalid settings. Run with --verbose to see which.",
        }
    }
}

/// Classify a reqwest failure for display.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if let Some(status) = self.status() {
            return NetworkError::Status {
                status: status.as_u16(),
                message: self.to_string(),
            };
        }
        if self.is_decode() || self.is_body() {
            return NetworkError::Decode(self.to_string());
        }

        let target = self
            .url()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| self.to_string());
        NetworkError::Unreachable(target)
    }
}
