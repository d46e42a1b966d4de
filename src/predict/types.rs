use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Two-line element set text for one catalog number, as fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSet {
    norad_id: Arc<str>,
    text: Arc<str>,
}

impl ElementSet {
    pub fn new(norad_id: &str, text: String) -> Self {
        Self {
            norad_id: norad_id.into(),
            text: text.into(),
        }
    }

    pub fn norad_id(&self) -> &str {
        &self.norad_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Satellite direction seen from the observer at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookSample {
    pub time: DateTime<Utc>,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
}

/// One horizon-to-horizon pass as an ordered look-angle trace.
#[derive(Debug, Clone, PartialEq)]
pub struct PassCandidate {
    pub samples: Vec<LookSample>,
}

/// A span of time during which the satellite stays above the requested
/// elevation. Times are naive UTC.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VisibilityWindow {
    #[schema(value_type = String, example = "2025-03-14T14:02:11")]
    pub start_time: NaiveDateTime,
    #[schema(value_type = String)]
    pub end_time: NaiveDateTime,
    pub duration_seconds: f64,
    pub max_elevation: f64,
    #[schema(value_type = String)]
    pub culmination_time: NaiveDateTime,
    pub start_azimuth: f64,
    pub max_elevation_azimuth: f64,
    pub end_azimuth: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_forecast: Option<String>,
}
