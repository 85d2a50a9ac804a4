//! Open-Meteo daily forecast client.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::error::WeatherError;
use crate::metrics;
use crate::types::{CityDescriptor, CityRanking, DailyRawBundle, ForecastResponse};

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DAILY_FIELDS: &str = "sunshine_duration,temperature_2m_min,temperature_2m_max,uv_index_max,wind_speed_10m_min,wind_speed_10m_max";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("SunRank/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Arc<Client>,
    base_url: String,
    forecast_days: u32,
}

impl ForecastClient {
    /// Client for the public Open-Meteo endpoint.
    pub fn new(forecast_days: u32) -> Result<Self, WeatherError> {
        Self::with_base_url(
            OPEN_METEO_URL,
            forecast_days,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Client for any Open-Meteo compatible endpoint (mirrors, mock servers).
    pub fn with_base_url(
        base_url: impl Into<String>,
        forecast_days: u32,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into(),
            forecast_days,
        })
    }

    /// The underlying HTTP client, shared with catalog downloads.
    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn forecast_days(&self) -> u32 {
        self.forecast_days
    }

    /// Request URL for one city's daily forecast.
    pub fn build_url(&self, city: &CityDescriptor) -> String {
        format!(
            "{}?latitude={}&longitude={}&daily={}&timezone={}&forecast_days={}",
            self.base_url,
            city.latitude,
            city.longitude,
            DAILY_FIELDS,
            urlencoding::encode(&city.timezone),
            self.forecast_days,
        )
    }

    /// Fetch the raw daily arrays for `city`.
    ///
    /// Non-2xx statuses, unparsable bodies and a missing
    /// `daily.sunshine_duration` array are all errors.
    #[instrument(skip(self, city), fields(city = %city.name), level = "debug")]
    pub async fn fetch_daily(&self, city: &CityDescriptor) -> Result<DailyRawBundle, WeatherError> {
        let url = self.build_url(city);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let body: ForecastResponse =
            serde_json::from_str(&text).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let daily = body.daily.ok_or(WeatherError::MissingField("daily"))?;
        if daily.sunshine_duration.is_none() {
            return Err(WeatherError::MissingField("sunshine_duration"));
        }

        Ok(daily)
    }

    /// Fetch and aggregate one city's forecast.
    pub async fn fetch_city(&self, city: &CityDescriptor) -> Result<CityRanking, WeatherError> {
        let daily = self.fetch_daily(city).await?;
        metrics::extract(city, &daily, self.forecast_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amsterdam() -> CityDescriptor {
        CityDescriptor {
            name: "Amsterdam, Netherlands".to_string(),
            short_name: "Amsterdam".to_string(),
            latitude: 52.37,
            longitude: 4.9,
            timezone: "Europe/Amsterdam".to_string(),
        }
    }

    #[test]
    fn test_build_url() {
        let client = ForecastClient::new(7).unwrap();
        let url = client.build_url(&amsterdam());

        assert_eq!(
            url,
            "https://api.open-meteo.com/v1/forecast?latitude=52.37&longitude=4.9\
             &daily=sunshine_duration,temperature_2m_min,temperature_2m_max,uv_index_max,wind_speed_10m_min,wind_speed_10m_max\
             &timezone=Europe%2FAmsterdam&forecast_days=7"
        );
    }

    #[test]
    fn test_build_url_custom_base_and_horizon() {
        let client =
            ForecastClient::with_base_url("http://localhost:9999/v1/forecast", 3, Duration::from_secs(1))
                .unwrap();
        let url = client.build_url(&amsterdam());

        assert!(url.starts_with("http://localhost:9999/v1/forecast?latitude=52.37"));
        assert!(url.ends_with("&forecast_days=3"));
        assert_eq!(client.forecast_days(), 3);
    }
}
