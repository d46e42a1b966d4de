use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{json, Value};

use super::args::{deserialize_id, deserialize_timestamp, parse_args};
use super::{ParamSpec, ParamType, Tool, ToolError, TransitContext};
use crate::predict::DEFAULT_MIN_ELEVATION_DEG;

#[derive(Debug, Deserialize)]
struct TransitArgs {
    #[serde(deserialize_with = "deserialize_id")]
    norad_id: String,
    latitude: f64,
    longitude: f64,
    #[serde(default = "default_angle")]
    angle_above_horizon: f64,
    #[serde(default = "default_true")]
    include_weather: bool,
}

fn default_angle() -> f64 {
    DEFAULT_MIN_ELEVATION_DEG
}

fn default_true() -> bool {
    true
}

pub struct GetTransits;

#[async_trait]
impl Tool for GetTransits {
    fn name(&self) -> &'static str {
        "get_transits"
    }

    fn description(&self) -> &'static str {
        "Get the transits of a satellite over the observer's location during the next 24 hours. \
         Each transit has its start, end and culmination time (naive UTC), duration in seconds, \
         peak elevation, azimuth at start, peak and end, and the cloud cover forecast at the peak. \
         Raises NoDataFoundError or APIError if the satellite's TLE cannot be fetched."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required(
                "norad_id",
                ParamType::String,
                "The NORAD catalog ID of the satellite.",
            ),
            ParamSpec::required(
                "latitude",
                ParamType::Number,
                "Latitude of the observer's location.",
            ),
            ParamSpec::required(
                "longitude",
                ParamType::Number,
                "Longitude of the observer's location.",
            ),
            ParamSpec::optional(
                "angle_above_horizon",
                ParamType::Number,
                "The minimum angle above the horizon to consider a transit.",
                json!(DEFAULT_MIN_ELEVATION_DEG),
            ),
            ParamSpec::optional(
                "include_weather",
                ParamType::Boolean,
                "Attach the cloud cover forecast at each transit's peak.",
                json!(true),
            ),
        ]
    }

    async fn call(&self, ctx: &TransitContext, args: Value) -> Result<Value, ToolError> {
        let args: TransitArgs = parse_args(self.name(), args)?;
        let windows = ctx
            .transits(
                &args.norad_id,
                args.latitude,
                args.longitude,
                args.angle_above_horizon,
                args.include_weather,
            )
            .await?;
        Ok(serde_json::to_value(windows)?)
    }
}

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    latitude: f64,
    longitude: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    time: NaiveDateTime,
}

pub struct GetWeatherForecast;

#[async_trait]
impl Tool for GetWeatherForecast {
    fn name(&self) -> &'static str {
        "get_weather_forecast"
    }

    fn description(&self) -> &'static str {
        "Get the cloud cover forecast for a location at a given time (UTC), \
         for example \"75% cloud cover\". Never fails: when no forecast is available \
         the result says why."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("latitude", ParamType::Number, "Latitude of the location."),
            ParamSpec::required("longitude", ParamType::Number, "Longitude of the location."),
            ParamSpec::required(
                "time",
                ParamType::Timestamp,
                "The time of interest, e.g. 2025-03-14T14:05:00 (UTC).",
            ),
        ]
    }

    async fn call(&self, ctx: &TransitContext, args: Value) -> Result<Value, ToolError> {
        let args: WeatherArgs = parse_args(self.name(), args)?;
        let summary = ctx
            .weather_forecast(args.latitude, args.longitude, args.time)
            .await;
        Ok(Value::String(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SystemClock;
    use crate::config::Config;
    use crate::error::TransitError;
    use crate::predict::{LookSample, PassCandidate};
    use crate::testing::{FakePassSource, FakeTransport};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    const GP: &str = "https://celestrak.org/NORAD/elements/gp.php";
    const WEATHER: &str = "https://api.open-meteo.com/v1/forecast";

    fn context(transport: FakeTransport, source: FakePassSource) -> TransitContext {
        TransitContext::with_collaborators(
            Config::default(),
            Arc::new(transport),
            Arc::new(source),
            Arc::new(SystemClock),
        )
    }

    fn one_pass() -> FakePassSource {
        let start = Utc::now() + Duration::hours(3);
        let sample = |offset: i64, elevation_deg: f64, azimuth_deg: f64| LookSample {
            time: start + Duration::seconds(offset),
            elevation_deg,
            azimuth_deg,
        };
        FakePassSource::new(vec![PassCandidate {
            samples: vec![sample(0, 10.0, 90.0), sample(300, 80.0, 180.0), sample(600, 10.0, 270.0)],
        }])
    }

    #[tokio::test]
    async fn transit_window_shape() {
        let ctx = context(
            FakeTransport::new()
                .respond(GP, 200, "ISS\n1 a\n2 b")
                .respond(WEATHER, 200, r#"{"hourly": {"time": [], "cloud_cover": []}}"#),
            one_pass(),
        );
        let value = GetTransits
            .call(&ctx, json!({"norad_id": "25544", "latitude": 38.8951, "longitude": -77.0364}))
            .await
            .unwrap();

        let windows = value.as_array().unwrap();
        assert_eq!(windows.len(), 1);
        let w = &windows[0];
        assert_eq!(w["max_elevation"], 80.0);
        assert_eq!(w["max_elevation_azimuth"], 180.0);
        assert_eq!(w["start_azimuth"], 90.0);
        assert_eq!(w["end_azimuth"], 270.0);
        assert_eq!(w["duration_seconds"], 600.0);
        assert_eq!(w["weather_forecast"], "Forecast for the specific hour not found.");
        assert!(w["start_time"].is_string());
    }

    #[tokio::test]
    async fn transit_without_weather_omits_field() {
        let transport = FakeTransport::new().respond(GP, 200, "ISS\n1 a\n2 b");
        let ctx = context(transport, one_pass());
        let value = GetTransits
            .call(
                &ctx,
                json!({"norad_id": 25544, "latitude": 0.0, "longitude": 0.0, "include_weather": false}),
            )
            .await
            .unwrap();
        assert!(value[0].get("weather_forecast").is_none());
    }

    #[tokio::test]
    async fn high_threshold_yields_empty_list() {
        let ctx = context(FakeTransport::new().respond(GP, 200, "ISS\n1 a\n2 b"), one_pass());
        let value = GetTransits
            .call(
                &ctx,
                json!({"norad_id": "25544", "latitude": 0.0, "longitude": 0.0, "angle_above_horizon": 85}),
            )
            .await
            .unwrap();
        assert_eq!(value, json!([]));
    }

    #[tokio::test]
    async fn transit_fails_with_tle_error() {
        let ctx = context(FakeTransport::new().respond(GP, 500, ""), one_pass());
        let err = GetTransits
            .call(&ctx, json!({"norad_id": "25544", "latitude": 0.0, "longitude": 0.0}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Transit(TransitError::Api(_))));
    }

    #[tokio::test]
    async fn weather_tool_never_raises() {
        let ctx = context(
            FakeTransport::new().fail(WEATHER, "dns failure"),
            FakePassSource::default(),
        );
        let value = GetWeatherForecast
            .call(
                &ctx,
                json!({"latitude": 1.0, "longitude": 2.0, "time": "2025-03-14T14:05:00"}),
            )
            .await
            .unwrap();
        assert_eq!(
            value,
            json!("Weather API request failed: Request failed: dns failure")
        );
    }

    #[tokio::test]
    async fn weather_tool_reports_cloud_cover() {
        let body = r#"{"hourly": {"time": ["2025-03-14T14:00"], "cloud_cover": [42]}}"#;
        let ctx = context(
            FakeTransport::new().respond(WEATHER, 200, body),
            FakePassSource::default(),
        );
        let value = GetWeatherForecast
            .call(
                &ctx,
                json!({"latitude": 1.0, "longitude": 2.0, "time": "2025-03-14T14:59:59Z"}),
            )
            .await
            .unwrap();
        assert_eq!(value, json!("42% cloud cover"));
    }
}
