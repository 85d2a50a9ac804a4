//! City catalogs: GeoJSON feature collections listing the cities to rank.
//!
//! Each feature carries `[longitude, latitude]` coordinates and
//! `city`/`country`/`timezone` properties. Catalogs are compiled into the
//! binary, read from a local file or fetched over HTTP.

use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use sunrank_core::config::{BUNDLED_PREFIX, BUNDLED_RANKING_CATALOG, BUNDLED_SEARCH_CATALOG};

use crate::error::WeatherError;
use crate::types::CityDescriptor;

const DEFAULT_TIMEZONE: &str = "UTC";

const EUROPEAN_CITIES: &str = include_str!("../data/european_cities.geojson");
const SEARCH_CITIES: &str = include_str!("../data/search_cities.geojson");

/// GeoJSON text of a catalog shipped with the binary.
pub fn bundled_catalog(name: &str) -> Option<&'static str> {
    match name {
        BUNDLED_RANKING_CATALOG => Some(EUROPEAN_CITIES),
        BUNDLED_SEARCH_CATALOG => Some(SEARCH_CITIES),
        _ => None,
    }
}

/// Where a catalog document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Bundled(String),
    Path(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// Interpret a config value: `bundled:<name>` is compiled in, http(s) URLs
    /// are fetched, anything else is a path.
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        if let Some(name) = trimmed.strip_prefix(BUNDLED_PREFIX) {
            Self::Bundled(name.to_string())
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled(name) => write!(f, "{}{}", BUNDLED_PREFIX, name),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    properties: CityProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct CityProperties {
    city: String,
    country: String,
    timezone: Option<String>,
}

fn city_from_feature(feature: Feature) -> Result<CityDescriptor, WeatherError> {
    let CityProperties {
        city,
        country,
        timezone,
    } = feature.properties;

    // GeoJSON positions are [longitude, latitude]
    let (longitude, latitude) = match feature.geometry.coordinates.as_slice() {
        [lon, lat, ..] => (*lon, *lat),
        _ => {
            return Err(WeatherError::Catalog(format!(
                "{} has fewer than two coordinates",
                city
            )))
        }
    };

    Ok(CityDescriptor {
        name: format!("{}, {}", city, country),
        short_name: city,
        latitude,
        longitude,
        timezone: timezone
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
    })
}

/// Parse a GeoJSON feature collection into city descriptors, in document order.
pub fn parse_catalog(json: &str) -> Result<Vec<CityDescriptor>, WeatherError> {
    let collection: FeatureCollection =
        serde_json::from_str(json).map_err(|e| WeatherError::Catalog(e.to_string()))?;

    collection
        .features
        .into_iter()
        .map(city_from_feature)
        .collect()
}

async fn read_source(client: &Client, source: &CatalogSource) -> Result<String, WeatherError> {
    match source {
        CatalogSource::Bundled(name) => bundled_catalog(name)
            .map(str::to_string)
            .ok_or_else(|| WeatherError::Catalog(format!("no bundled catalog named {:?}", name))),
        CatalogSource::Path(path) => Ok(tokio::fs::read_to_string(path).await?),
        CatalogSource::Url(url) => {
            let response = client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(WeatherError::Status(response.status().as_u16()));
            }
            Ok(response.text().await?)
        }
    }
}

/// Load a catalog, returning an empty list on any failure.
///
/// Callers treat an empty catalog as "nothing could be loaded", never as an
/// intentionally empty city list.
pub async fn load_catalog(client: &Client, source: &CatalogSource) -> Vec<CityDescriptor> {
    let result = match read_source(client, source).await {
        Ok(json) => parse_catalog(&json),
        Err(e) => Err(e),
    };

    match result {
        Ok(cities) => {
            tracing::debug!("Loaded {} cities from {}", cities.len(), source);
            cities
        }
        Err(e) => {
            tracing::warn!("Failed to load city catalog from {}: {}", source, e);
            Vec::new()
        }
    }
}

/// Case-insensitive lookup by city or full name.
///
/// Exact short-name matches come first; the rest keep catalog order.
pub fn search_cities<'a>(catalog: &'a [CityDescriptor], query: &str) -> Vec<&'a CityDescriptor> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let (exact, partial): (Vec<&CityDescriptor>, Vec<&CityDescriptor>) = catalog
        .iter()
        .filter(|city| {
            city.short_name.to_lowercase().contains(&needle)
                || city.name.to_lowercase().contains(&needle)
        })
        .partition(|city| city.short_name.to_lowercase() == needle);

    exact.into_iter().chain(partial).collect()
}
