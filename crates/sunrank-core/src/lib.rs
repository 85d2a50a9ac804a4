pub mod config;
pub mod error;

pub use config::{
    ApiConfig, CacheConfig, CatalogConfig, Config, RankingConfig, ValidationResult,
};
pub use error::{AppError, CacheError, ConfigError, NetworkError, ReqwestErrorExt};

use anyhow::Result;

/// Initialize logging for the application.
///
/// `RUST_LOG` wins when set; otherwise the filter is `info`, or `debug`
/// when `verbose` is requested. Output goes to stderr so ranking tables on
/// stdout stay clean.
pub fn init(verbose: bool) -> Result<()> {
    let default_filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("SunRank core initialized");
    Ok(())
}
