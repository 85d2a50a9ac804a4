//! Aggregate metrics from one city's daily forecast arrays.

use crate::error::WeatherError;
use crate::types::{CityDescriptor, CityRanking, DailyForecast, DailyRawBundle, SECONDS_PER_HOUR};

/// Build a [`CityRanking`] from raw daily arrays.
///
/// `horizon_days` is the requested forecast length; it is the divisor for the
/// daily average even if the API returned fewer days. Null sunshine entries
/// count as zero seconds.
pub fn extract(
    city: &CityDescriptor,
    daily: &DailyRawBundle,
    horizon_days: u32,
) -> Result<CityRanking, WeatherError> {
    let sunshine = daily
        .sunshine_duration
        .as_deref()
        .ok_or(WeatherError::MissingField("sunshine_duration"))?;

    if horizon_days == 0 {
        return Err(WeatherError::Parse("forecast horizon must be at least one day".into()));
    }

    let total_sunshine_seconds: f64 = sunshine.iter().flatten().sum();
    let average_hours =
        round_to_hundredths(total_sunshine_seconds / f64::from(horizon_days) / SECONDS_PER_HOUR);

    let forecast = sunshine
        .iter()
        .enumerate()
        .map(|(day, sun_seconds)| DailyForecast {
            date: daily.time.as_ref().and_then(|t| t.get(day).copied()),
            sun_seconds: *sun_seconds,
            min_temp: value_at(&daily.temperature_2m_min, day),
            max_temp: value_at(&daily.temperature_2m_max, day),
            uv_index: value_at(&daily.uv_index_max, day),
            wind_speed: value_at(&daily.wind_speed_10m_max, day),
        })
        .collect();

    Ok(CityRanking {
        name: city.name.clone(),
        short_name: city.short_name.clone(),
        average_hours,
        max_temp: max_of(&daily.temperature_2m_max),
        max_uv: max_of(&daily.uv_index_max),
        forecast,
    })
}

fn value_at(values: &Option<Vec<Option<f64>>>, day: usize) -> Option<f64> {
    values.as_ref().and_then(|v| v.get(day).copied().flatten())
}

/// Largest non-null value; `None` when the array is absent or all null
fn max_of(values: &Option<Vec<Option<f64>>>) -> Option<f64> {
    values
        .as_ref()?
        .iter()
        .flatten()
        .copied()
        .reduce(f64::max)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
