//! Sunshine ranking pipeline.
//!
//! A ranking request goes through these steps:
//! 1. Serve the cached snapshot while it is fresh (no network).
//! 2. Otherwise load the catalog and fetch every city concurrently, city `i`
//!    starting after `i * call_delay`.
//! 3. Drop failed cities, sort by average sunshine and keep the top N.
//! 4. Cache a non-empty result; if nothing came back, serve the expired
//!    snapshot when there is one.
//!
//! The public entry points never fail; the worst case is an empty list.

use chrono::Utc;
use futures::future::join_all;
use std::time::Duration;
use sunrank_core::Config;

use crate::cache::RankingCache;
use crate::catalog::{load_catalog, CatalogSource};
use crate::error::WeatherError;
use crate::provider::ForecastClient;
use crate::store::{FileStore, KeyValueStore};
use crate::types::{CityDescriptor, CityRanking, RankingSnapshot};

/// Tuning for [`RankingService`].
#[derive(Debug, Clone)]
pub struct RankingSettings {
    /// Cities to rank
    pub catalog: CatalogSource,
    /// Age at which a cached snapshot stops being served
    pub cache_expiry: Duration,
    /// Per-index stagger between city requests
    pub call_delay: Duration,
    /// Maximum number of cities returned
    pub top_n: usize,
}

impl RankingSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            catalog: CatalogSource::parse(&config.catalog.ranking_source),
            cache_expiry: config.ranking.cache_expiry(),
            call_delay: config.ranking.call_delay(),
            top_n: config.ranking.top_n,
        }
    }
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Where a ranking came from.
#[derive(Debug, Clone, PartialEq)]
pub enum RankingOutcome {
    /// Fresh snapshot from the cache
    CacheHit(Vec<CityRanking>),
    /// Newly fetched and cached
    Refreshed(Vec<CityRanking>),
    /// Refresh produced nothing; expired snapshot served instead
    StaleFallback(Vec<CityRanking>),
    /// Refresh produced nothing and there was no snapshot to fall back to
    Empty,
}

impl RankingOutcome {
    pub fn rankings(&self) -> &[CityRanking] {
        match self {
            Self::CacheHit(data) | Self::Refreshed(data) | Self::StaleFallback(data) => data,
            Self::Empty => &[],
        }
    }

    pub fn into_rankings(self) -> Vec<CityRanking> {
        match self {
            Self::CacheHit(data) | Self::Refreshed(data) | Self::StaleFallback(data) => data,
            Self::Empty => Vec::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CacheHit(_) => "cached",
            Self::Refreshed(_) => "fresh",
            Self::StaleFallback(_) => "stale (refresh failed)",
            Self::Empty => "unavailable",
        }
    }
}

/// Delay before the request for the city at `index` is sent.
///
/// A linear ramp: city 0 starts immediately, city 1 after one interval, and
/// so on. Once every delay has elapsed, requests are no longer bounded.
pub fn stagger_delay(index: usize, per_call: Duration) -> Duration {
    per_call.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
}

/// Keep successful cities, best first, capped at `top_n`.
///
/// The sort is stable, so cities with equal averages keep catalog order.
pub fn aggregate(
    results: Vec<Result<CityRanking, WeatherError>>,
    top_n: usize,
) -> Vec<CityRanking> {
    let (succeeded, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);

    if !failed.is_empty() {
        tracing::info!(
            "{} of {} cities failed and were left out",
            failed.len(),
            succeeded.len() + failed.len()
        );
    }

    let mut rankings: Vec<CityRanking> = succeeded.into_iter().filter_map(Result::ok).collect();
    rankings.sort_by(|a, b| b.average_hours.total_cmp(&a.average_hours));
    rankings.truncate(top_n);
    rankings
}

pub struct RankingService<S> {
    client: ForecastClient,
    cache: RankingCache<S>,
    settings: RankingSettings,
}

impl RankingService<FileStore> {
    /// Service backed by the cache directory and endpoints from `config`.
    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let client = ForecastClient::with_base_url(
            config.api.base_url.clone(),
            config.ranking.forecast_days,
            config.api.request_timeout(),
        )?;
        let cache = RankingCache::new(
            FileStore::new(config.cache.dir.clone()),
            config.cache.key.clone(),
        );

        Ok(Self::new(client, cache, RankingSettings::from_config(config)))
    }
}

impl<S: KeyValueStore> RankingService<S> {
    pub fn new(client: ForecastClient, cache: RankingCache<S>, settings: RankingSettings) -> Self {
        Self {
            client,
            cache,
            settings,
        }
    }

    pub fn client(&self) -> &ForecastClient {
        &self.client
    }

    pub fn cache(&self) -> &RankingCache<S> {
        &self.cache
    }

    pub fn settings(&self) -> &RankingSettings {
        &self.settings
    }

    /// Top cities by average sunshine.
    pub async fn get_ranking(&self) -> Vec<CityRanking> {
        self.get_ranking_at(Utc::now().timestamp_millis()).await
    }

    /// [`Self::get_ranking`] with an explicit clock, in epoch milliseconds.
    pub async fn get_ranking_at(&self, now_ms: i64) -> Vec<CityRanking> {
        self.rank_with_outcome_at(now_ms).await.into_rankings()
    }

    pub async fn rank_with_outcome(&self) -> RankingOutcome {
        self.rank_with_outcome_at(Utc::now().timestamp_millis()).await
    }

    pub async fn rank_with_outcome_at(&self, now_ms: i64) -> RankingOutcome {
        let expired_data = match self.cache.read() {
            Some(snapshot) if snapshot.is_valid(now_ms, self.settings.cache_expiry) => {
                tracing::debug!(
                    "Serving cached ranking ({} s old)",
                    snapshot.age_ms(now_ms) / 1000
                );
                return RankingOutcome::CacheHit(snapshot.data);
            }
            Some(snapshot) => {
                tracing::info!(
                    "Cached ranking expired ({} min old), refreshing",
                    snapshot.age_ms(now_ms) / 60_000
                );
                Some(snapshot.data)
            }
            None => None,
        };

        let fresh = match self.refresh().await {
            Ok(rankings) => rankings,
            Err(e) => {
                tracing::warn!("Ranking refresh failed: {}", e);
                Vec::new()
            }
        };

        if !fresh.is_empty() {
            let snapshot = RankingSnapshot::new(now_ms, fresh);
            if let Err(e) = self.cache.write(&snapshot) {
                tracing::warn!("Could not cache ranking: {}", e);
            }
            return RankingOutcome::Refreshed(snapshot.data);
        }

        match expired_data {
            Some(data) => {
                tracing::warn!("No fresh data; serving {} cities from expired cache", data.len());
                RankingOutcome::StaleFallback(data)
            }
            None => {
                tracing::error!("No ranking available: refresh failed and nothing is cached");
                RankingOutcome::Empty
            }
        }
    }

    /// Forecast for one city, bypassing the cache and the stagger.
    pub async fn fetch_single_city_weather(&self, city: &CityDescriptor) -> Option<CityRanking> {
        match self.client.fetch_city(city).await {
            Ok(ranking) => Some(ranking),
            Err(e) => {
                tracing::warn!("Failed to fetch forecast for {}: {}", city.name, e);
                None
            }
        }
    }

    async fn refresh(&self) -> Result<Vec<CityRanking>, WeatherError> {
        let cities = load_catalog(self.client.http(), &self.settings.catalog).await;
        if cities.is_empty() {
            return Err(WeatherError::Catalog(format!(
                "no cities loaded from {}",
                self.settings.catalog
            )));
        }

        tracing::info!("Fetching forecasts for {} cities", cities.len());
        let results = self.fetch_all(&cities).await;
        Ok(aggregate(results, self.settings.top_n))
    }

    /// One result per city, in catalog order.
    async fn fetch_all(&self, cities: &[CityDescriptor]) -> Vec<Result<CityRanking, WeatherError>> {
        let tasks = cities
            .iter()
            .enumerate()
            .map(|(index, city)| self.fetch_staggered(index, city));

        join_all(tasks).await
    }

    async fn fetch_staggered(
        &self,
        index: usize,
        city: &CityDescriptor,
    ) -> Result<CityRanking, WeatherError> {
        let delay = stagger_delay(index, self.settings.call_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = self.client.fetch_city(city).await;
        if let Err(e) = &result {
            tracing::warn!(
                city = %city.name,
                retryable = e.is_retryable(),
                "Skipping city: {}",
                e
            );
        }
        result
    }
}
