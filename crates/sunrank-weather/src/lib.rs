//! Sunshine ranking for SunRank
//!
//! Loads a GeoJSON city catalog, fetches daily forecasts from the Open-Meteo
//! API and ranks cities by average sunshine, with a persistent snapshot cache
//! and stale-data fallback.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod format;
pub mod metrics;
pub mod provider;
pub mod ranking;
pub mod store;
pub mod types;

pub use cache::RankingCache;
pub use catalog::{load_catalog, parse_catalog, search_cities, CatalogSource};
pub use error::{StoreError, WeatherError};
pub use metrics::extract;
pub use provider::ForecastClient;
pub use ranking::{stagger_delay, RankingOutcome, RankingService, RankingSettings};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::*;
