use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// A city from the catalog, identified by `name` ("Lisbon, Portugal")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityDescriptor {
    pub name: String,
    pub short_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

/// One day of a city's forecast; any metric the API did not return is `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: Option<NaiveDate>,
    pub sun_seconds: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub uv_index: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Aggregated sunshine metrics for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRanking {
    pub name: String,
    pub short_name: String,
    /// Mean daily sunshine over the horizon, rounded to two decimals
    pub average_hours: f64,
    pub max_temp: Option<f64>,
    pub max_uv: Option<f64>,
    pub forecast: Vec<DailyForecast>,
}

/// Timestamped ranking as persisted in the cache slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSnapshot {
    /// Epoch milliseconds of the refresh that produced `data`
    pub timestamp: i64,
    pub data: Vec<CityRanking>,
}

impl RankingSnapshot {
    pub fn new(timestamp: i64, data: Vec<CityRanking>) -> Self {
        Self { timestamp, data }
    }

    /// Milliseconds elapsed since the snapshot was taken
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp)
    }

    /// A snapshot is fresh while its age is strictly below `window`
    pub fn is_valid(&self, now_ms: i64, window: Duration) -> bool {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        self.age_ms(now_ms) < window_ms
    }
}

/// Open-Meteo forecast response; only the daily block is consumed
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub daily: Option<DailyRawBundle>,
}

/// Index-aligned daily arrays exactly as the API returns them.
/// Individual entries may be `null` when the model has no value for a day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyRawBundle {
    pub time: Option<Vec<NaiveDate>>,
    pub sunshine_duration: Option<Vec<Option<f64>>>,
    pub temperature_2m_min: Option<Vec<Option<f64>>>,
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    pub uv_index_max: Option<Vec<Option<f64>>>,
    pub wind_speed_10m_max: Option<Vec<Option<f64>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(timestamp: i64) -> RankingSnapshot {
        RankingSnapshot::new(timestamp, Vec::new())
    }

    #[test]
    fn test_snapshot_valid_inside_window() {
        let window = Duration::from_secs(60);
        assert!(snapshot(1_000).is_valid(1_000, window));
        assert!(snapshot(1_000).is_valid(60_999, window));
    }

    #[test]
    fn test_snapshot_expires_at_window_boundary() {
        let window = Duration::from_secs(60);
        assert!(!snapshot(1_000).is_valid(61_000, window));
        assert!(!snapshot(1_000).is_valid(500_000, window));
    }

    #[test]
    fn test_zero_window_never_valid() {
        assert!(!snapshot(5).is_valid(5, Duration::ZERO));
    }

    #[test]
    fn test_daily_bundle_tolerates_missing_and_null() {
        let json = r#"{
            "daily": {
                "time": ["2026-06-01", "2026-06-02"],
                "sunshine_duration": [36000.0, null]
            }
        }"#;
        let response: ForecastResponse = serde_json::from_str(json).unwrap();
        let daily = response.daily.unwrap();
        assert_eq!(daily.sunshine_duration, Some(vec![Some(36000.0), None]));
        assert!(daily.uv_index_max.is_none());
        assert_eq!(daily.time.map(|t| t.len()), Some(2));
    }

    #[test]
    fn test_response_without_daily_block() {
        let response: ForecastResponse =
            serde_json::from_str(r#"{"latitude": 52.0, "longitude": 4.0}"#).unwrap();
        assert!(response.daily.is_none());
    }
}
