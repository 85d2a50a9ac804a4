use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Open-Meteo caps the daily forecast at 16 days.
pub const MAX_FORECAST_DAYS: u32 = 16;

/// Catalog sources starting with this prefix name a catalog compiled into the binary.
pub const BUNDLED_PREFIX: &str = "bundled:";
pub const BUNDLED_RANKING_CATALOG: &str = "european_cities";
pub const BUNDLED_SEARCH_CATALOG: &str = "search_cities";

/// Cache keys become file names, so only ASCII letters, digits, `_` and `-` are allowed.
pub fn is_valid_cache_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// One problem found in a config value, keyed by its dotted field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

/// Findings from [`Config::validate`]. Errors block startup, warnings are logged.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(finding(field, message));
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(finding(field, message));
    }

    /// All errors on one line; empty when valid
    pub fn error_summary(&self) -> String {
        let parts: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        parts.join(", ")
    }
}

fn finding(field: impl Into<String>, message: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError {
        field: field.into(),
        message: message.into(),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Forecast API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// City catalogs used for ranking and lookup
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Ranking pipeline tuning
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Snapshot persistence
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Open-Meteo forecast endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP client timeout per request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// `bundled:<name>`, a GeoJSON file path or an http(s) URL with the cities to rank
    #[serde(default = "default_ranking_source")]
    pub ranking_source: String,

    /// Same forms as `ranking_source`; the cities offered for lookup
    #[serde(default = "default_search_source")]
    pub search_source: String,
}

fn default_ranking_source() -> String {
    format!("{}{}", BUNDLED_PREFIX, BUNDLED_RANKING_CATALOG)
}

fn default_search_source() -> String {
    format!("{}{}", BUNDLED_PREFIX, BUNDLED_SEARCH_CATALOG)
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ranking_source: default_ranking_source(),
            search_source: default_search_source(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Forecast horizon in days
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    /// How long a cached ranking stays fresh
    #[serde(default = "default_cache_expiry_minutes")]
    pub cache_expiry_minutes: u64,

    /// Stagger between consecutive city requests
    #[serde(default = "default_call_delay_ms")]
    pub call_delay_ms: u64,

    /// Number of cities kept in the ranking
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_forecast_days() -> u32 {
    7
}

fn default_cache_expiry_minutes() -> u64 {
    6 * 60
}

fn default_call_delay_ms() -> u64 {
    110
}

fn default_top_n() -> usize {
    10
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            forecast_days: default_forecast_days(),
            cache_expiry_minutes: default_cache_expiry_minutes(),
            call_delay_ms: default_call_delay_ms(),
            top_n: default_top_n(),
        }
    }
}

impl RankingConfig {
    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_minutes.saturating_mul(60))
    }

    pub fn call_delay(&self) -> Duration {
        Duration::from_millis(self.call_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding cached snapshots
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// Key the ranking snapshot is stored under
    #[serde(default = "default_cache_key")]
    pub key: String,
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sunrank")
}

fn default_cache_key() -> String {
    "ranking_cache".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            key: default_cache_key(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating a default file if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// [`Config::load_from`] (or [`Config::load`]) followed by [`Config::validate`].
    /// Any error fails the load; warnings are logged and returned.
    pub fn load_validated(config_path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match config_path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!("{} invalid: {}", Self::describe(config_path), validation.error_summary());
        }

        for warning in &validation.warnings {
            tracing::warn!("{}", warning);
        }

        Ok((config, validation))
    }

    fn describe(config_path: Option<&Path>) -> String {
        config_path.map_or_else(|| "default config".to_string(), |p| p.display().to_string())
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_url(&self.api.base_url, "api.base_url", &mut result);

        if self.api.request_timeout_secs == 0 {
            result.add_error("api.request_timeout_secs", "Timeout must be greater than 0");
        }

        Self::validate_source(
            &self.catalog.ranking_source,
            "catalog.ranking_source",
            &mut result,
        );
        Self::validate_source(
            &self.catalog.search_source,
            "catalog.search_source",
            &mut result,
        );

        if self.ranking.forecast_days == 0 || self.ranking.forecast_days > MAX_FORECAST_DAYS {
            result.add_error(
                "ranking.forecast_days",
                format!("Forecast days must be between 1 and {}", MAX_FORECAST_DAYS),
            );
        }

        if self.ranking.top_n == 0 {
            result.add_error("ranking.top_n", "Ranking size must be greater than 0");
        }

        if self.ranking.cache_expiry_minutes == 0 {
            result.add_warning(
                "ranking.cache_expiry_minutes",
                "Cache disabled (0 minutes); every run hits the API",
            );
        }

        if self.ranking.call_delay_ms == 0 {
            result.add_warning(
                "ranking.call_delay_ms",
                "No delay between requests; the API may throttle",
            );
        } else if self.ranking.call_delay_ms > 10_000 {
            result.add_warning(
                "ranking.call_delay_ms",
                "Delay between requests is more than 10 seconds",
            );
        }

        if self.cache.key.is_empty() {
            result.add_error("cache.key", "Cache key cannot be empty");
        } else if !is_valid_cache_key(&self.cache.key) {
            result.add_error(
                "cache.key",
                format!(
                    "{:?} may only contain ASCII letters, digits, '_' and '-'",
                    self.cache.key
                ),
            );
        }

        result
    }

    /// The forecast endpoint must be an absolute http(s) URL with a usable host and port
    fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
        let url = match Url::parse(url_str) {
            Ok(url) => url,
            Err(e) => {
                result.add_error(field_name, format!("not a URL ({})", e));
                return;
            }
        };

        if !matches!(url.scheme(), "http" | "https") {
            result.add_error(field_name, format!("scheme {:?} is not http or https", url.scheme()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            result.add_error(field_name, "missing host");
        }
        if url.port() == Some(0) {
            result.add_error(field_name, "port 0 is not connectable");
        }
    }

    /// Catalog sources are bundled names, http(s) URLs or local files
    fn validate_source(source: &str, field_name: &str, result: &mut ValidationResult) {
        if source.trim().is_empty() {
            result.add_error(field_name, "Catalog source cannot be empty");
            return;
        }

        if let Some(name) = source.strip_prefix(BUNDLED_PREFIX) {
            if name != BUNDLED_RANKING_CATALOG && name != BUNDLED_SEARCH_CATALOG {
                result.add_error(
                    field_name,
                    format!(
                        "unknown bundled catalog {:?} (expected {} or {})",
                        name, BUNDLED_RANKING_CATALOG, BUNDLED_SEARCH_CATALOG
                    ),
                );
            }
            return;
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            return;
        }

        let path = PathBuf::from(source);
        if !path.exists() {
            result.add_warning(
                field_name,
                format!("File does not exist: {}", path.display()),
            );
        } else if !path.is_file() {
            result.add_error(field_name, format!("Not a file: {}", path.display()));
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        std::fs::write(config_path, self.to_toml()?).context("Failed to write config file")?;

        Ok(())
    }

    /// Render the configuration as it would be written to disk
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("sunrank");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_default_ranking_constants() {
        let ranking = RankingConfig::default();
        assert_eq!(ranking.forecast_days, 7);
        assert_eq!(ranking.top_n, 10);
        assert_eq!(ranking.cache_expiry(), Duration::from_secs(6 * 60 * 60));
        assert_eq!(ranking.call_delay(), Duration::from_millis(110));
        assert_eq!(CacheConfig::default().key, "ranking_cache");
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.api.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "api.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.api.base_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("\"ftp\"")));
    }

    #[test]
    fn test_forecast_days_out_of_range() {
        let mut config = Config::default();
        config.ranking.forecast_days = 0;
        assert!(!config.validate().is_valid());

        config.ranking.forecast_days = MAX_FORECAST_DAYS + 1;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "ranking.forecast_days"));
    }

    #[test]
    fn test_zero_top_n_and_empty_key_are_errors() {
        let mut config = Config::default();
        config.ranking.top_n = 0;
        config.cache.key = String::new();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "ranking.top_n"));
        assert!(result.errors.iter().any(|e| e.field == "cache.key"));
    }

    #[test]
    fn test_zero_delay_is_warning() {
        let mut config = Config::default();
        config.ranking.call_delay_ms = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "ranking.call_delay_ms"));
    }

    #[test]
    fn test_url_catalog_source_skips_file_check() {
        let mut config = Config::default();
        config.catalog.ranking_source = "https://example.com/cities.geojson".to_string();
        let result = config.validate();
        assert!(!result
            .warnings
            .iter()
            .any(|w| w.field == "catalog.ranking_source"));
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.ranking.top_n, 10);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ranking]\ntop_n = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.ranking.top_n, 5);
        assert_eq!(config.ranking.forecast_days, 7);
        assert_eq!(config.api.base_url, "https://api.open-meteo.com/v1/forecast");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "ranking = [not toml").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_cache_key_must_be_a_file_name() {
        for bad in ["ranking.cache", "../escape", "a b", "  "] {
            let mut config = Config::default();
            config.cache.key = bad.to_string();
            let result = config.validate();
            assert!(
                result.errors.iter().any(|e| e.field == "cache.key"),
                "{:?} should be rejected",
                bad
            );
        }

        let mut config = Config::default();
        config.cache.key = "ranking-cache_2".to_string();
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_is_valid_cache_key() {
        assert!(is_valid_cache_key("ranking_cache"));
        assert!(!is_valid_cache_key(""));
        assert!(!is_valid_cache_key("ranking.cache"));
        assert!(!is_valid_cache_key("städte"));
    }

    #[test]
    fn test_huge_expiry_saturates() {
        let ranking = RankingConfig {
            cache_expiry_minutes: u64::MAX,
            ..RankingConfig::default()
        };
        assert_eq!(ranking.cache_expiry(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_default_catalogs_are_bundled() {
        let catalog = CatalogConfig::default();
        assert_eq!(catalog.ranking_source, "bundled:european_cities");
        assert_eq!(catalog.search_source, "bundled:search_cities");

        let result = Config::default().validate();
        assert!(result.warnings.iter().all(|w| !w.field.starts_with("catalog.")));
    }

    #[test]
    fn test_unknown_bundled_catalog_is_error() {
        let mut config = Config::default();
        config.catalog.search_source = "bundled:asian_cities".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "catalog.search_source"));
    }

    #[test]
    fn test_error_summary_lists_every_field() {
        let mut config = Config::default();
        config.ranking.top_n = 0;
        config.cache.key = String::new();
        let result = config.validate();

        assert_eq!(result.errors.len(), 2, "{:?}", result.errors);
        let summary = result.error_summary();
        assert!(summary.contains("[ranking.top_n]"));
        assert!(summary.contains("[cache.key]"));
        assert!(ValidationResult::default().error_summary().is_empty());
    }
}
