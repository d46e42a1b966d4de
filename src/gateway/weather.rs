use chrono::{NaiveDateTime, Timelike};
use thiserror::Error;

use super::{build_url, plain_string, Gateway};
use crate::error::TransitError;

/// Why a forecast could not be produced. The display text is what callers
/// show in place of a forecast.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WeatherUnavailable {
    #[error("Weather API request failed: {0}")]
    RequestFailed(String),
    #[error("Weather data not available.")]
    DataMissing,
    #[error("Forecast for the specific hour not found.")]
    HourMissing,
}

impl Gateway {
    /// Cloud cover at the hour containing `instant` (interpreted as UTC),
    /// formatted as `"<percent>% cloud cover"`.
    pub async fn cloud_cover_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        instant: NaiveDateTime,
    ) -> Result<String, WeatherUnavailable> {
        let day = instant.date().format("%Y-%m-%d").to_string();
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();
        let url = build_url(
            &self.weather_url,
            &[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("hourly", "cloud_cover"),
                ("start_date", day.as_str()),
                ("end_date", day.as_str()),
                ("timezone", "UTC"),
            ],
        )
        .map_err(|e| WeatherUnavailable::RequestFailed(e.to_string()))?;

        let response = self.get(&url).await.map_err(|e| match e {
            TransitError::Api(msg) => WeatherUnavailable::RequestFailed(msg),
            other => WeatherUnavailable::RequestFailed(other.to_string()),
        })?;
        if !response.is_success() {
            return Err(WeatherUnavailable::RequestFailed(format!(
                "status code {}",
                response.status
            )));
        }

        let body: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| WeatherUnavailable::RequestFailed(e.to_string()))?;
        let hourly = body.get("hourly").ok_or(WeatherUnavailable::DataMissing)?;
        let times = hourly
            .get("time")
            .and_then(|v| v.as_array())
            .ok_or(WeatherUnavailable::DataMissing)?;
        let cloud_cover = hourly
            .get("cloud_cover")
            .and_then(|v| v.as_array())
            .ok_or(WeatherUnavailable::DataMissing)?;

        let bucket = hour_bucket(instant);
        let index = times
            .iter()
            .position(|t| t.as_str() == Some(bucket.as_str()))
            .ok_or(WeatherUnavailable::HourMissing)?;
        let percent = cloud_cover
            .get(index)
            .and_then(plain_string)
            .ok_or(WeatherUnavailable::HourMissing)?;

        Ok(format!("{}% cloud cover", percent))
    }
}

/// Open-Meteo labels hourly buckets as `YYYY-MM-DDTHH:00`.
fn hour_bucket(instant: NaiveDateTime) -> String {
    let truncated = instant
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant);
    truncated.format("%Y-%m-%dT%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::FakeTransport;
    use chrono::NaiveDate;
    use std::sync::Arc;

    const WEATHER: &str = "https://api.open-meteo.com/v1/forecast";

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 27)
            .unwrap()
    }

    fn gateway(transport: Arc<FakeTransport>) -> Gateway {
        Gateway::new(&Config::default(), transport)
    }

    const FORECAST: &str = r#"{
        "hourly": {
            "time": ["2025-03-14T13:00", "2025-03-14T14:00", "2025-03-14T15:00"],
            "cloud_cover": [10, 75, 100]
        }
    }"#;

    #[test]
    fn bucket_truncates_to_hour() {
        assert_eq!(hour_bucket(at(14, 42)), "2025-03-14T14:00");
    }

    #[tokio::test]
    async fn exact_hour_is_reported() {
        let transport = Arc::new(FakeTransport::new().respond(WEATHER, 200, FORECAST));
        let forecast = gateway(transport.clone())
            .cloud_cover_forecast(38.8951, -77.0364, at(14, 42))
            .await
            .unwrap();

        assert_eq!(forecast, "75% cloud cover");
        assert_eq!(
            transport.requests(),
            vec![format!(
                "{}?latitude=38.8951&longitude=-77.0364&hourly=cloud_cover&start_date=2025-03-14&end_date=2025-03-14&timezone=UTC",
                WEATHER
            )]
        );
    }

    #[tokio::test]
    async fn missing_hourly_block() {
        let transport = Arc::new(FakeTransport::new().respond(WEATHER, 200, r#"{"error": false}"#));
        let err = gateway(transport)
            .cloud_cover_forecast(0.0, 0.0, at(14, 0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Weather data not available.");
    }

    #[tokio::test]
    async fn missing_hour_bucket() {
        let transport = Arc::new(FakeTransport::new().respond(WEATHER, 200, FORECAST));
        let err = gateway(transport)
            .cloud_cover_forecast(0.0, 0.0, at(20, 5))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Forecast for the specific hour not found.");
    }

    #[tokio::test]
    async fn transport_failure() {
        let transport = Arc::new(FakeTransport::new().fail(WEATHER, "timed out"));
        let err = gateway(transport)
            .cloud_cover_forecast(0.0, 0.0, at(14, 0))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Weather API request failed: Request failed: timed out"
        );
    }

    #[tokio::test]
    async fn non_success_status() {
        let transport = Arc::new(FakeTransport::new().respond(WEATHER, 503, ""));
        let err = gateway(transport)
            .cloud_cover_forecast(0.0, 0.0, at(14, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherUnavailable::RequestFailed(_)));
    }
}
