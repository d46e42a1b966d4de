//! Request/response handling for the upstream data sources: the CelesTrak
//! satellite catalog and element sets, a geocoding search, and the
//! Open-Meteo hourly forecast.

mod catalog;
mod elements;
mod geocode;
mod weather;

pub use weather::WeatherUnavailable;

use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{TransitError, TransitResult};

/// Status and body of a completed upstream request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single GET against an upstream source.
///
/// Transport failures (DNS, connect, timeout) surface as
/// [`TransitError::Api`]. Non-success statuses are returned as-is so each
/// operation can word its own error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> TransitResult<HttpResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> TransitResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("transit-o-mat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransitError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> TransitResult<HttpResponse> {
        log::debug!("GET {}", redacted(url));

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            log::warn!("Request to {} failed: {}", redacted(url), e);
            TransitError::Api(format!("Request failed: {}", e.without_url()))
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransitError::Api(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse { status, body })
    }
}

/// Client for all four upstream sources, sharing one transport.
pub struct Gateway {
    transport: Arc<dyn Transport>,
    satcat_url: String,
    gp_url: String,
    geocode_url: String,
    weather_url: String,
    geocode_api_key: Option<String>,
}

impl Gateway {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            satcat_url: config.endpoints.satcat_url.clone(),
            gp_url: config.endpoints.gp_url.clone(),
            geocode_url: config.endpoints.geocode_url.clone(),
            weather_url: config.endpoints.weather_url.clone(),
            geocode_api_key: config.geocode.api_key.clone(),
        }
    }

    async fn get(&self, url: &Url) -> TransitResult<HttpResponse> {
        self.transport.get(url).await
    }
}

fn build_url(base: &str, params: &[(&str, &str)]) -> TransitResult<Url> {
    Url::parse_with_params(base, params)
        .map_err(|e| TransitError::Configuration(format!("Invalid endpoint URL '{}': {}", base, e)))
}

/// Render a URL for logs with secrets masked.
pub fn redacted(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "api_key") {
        return url.to_string();
    }
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "api_key" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

/// JSON scalars from upstream sometimes arrive as numbers and sometimes as
/// strings; render either without quotes.
fn plain_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
