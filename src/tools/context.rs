use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;

use crate::cache::{CachePolicy, Clock, Memo, SystemClock};
use crate::config::Config;
use crate::error::TransitResult;
use crate::gateway::{Gateway, ReqwestTransport, Transport};
use crate::predict::{
    compute_transits, ElementSet, ObserverPosition, PassSource, Sgp4PassSource, VisibilityWindow,
    WeatherLookup,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WeatherKey {
    latitude_bits: u64,
    longitude_bits: u64,
    at: NaiveDateTime,
}

/// Process-wide state shared by every tool invocation: configuration, the
/// upstream gateway, the pass source and one cache per cached operation.
pub struct TransitContext {
    config: Config,
    gateway: Gateway,
    pass_source: Arc<dyn PassSource>,
    names: Memo<String, String>,
    norad_ids: Memo<String, Vec<String>>,
    elements: Memo<String, ElementSet>,
    locations: Memo<String, (String, String)>,
    weather: Memo<WeatherKey, String>,
}

impl TransitContext {
    /// Context talking to the real upstream sources.
    pub fn new(config: Config) -> TransitResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.endpoints.http_timeout)?);
        Ok(Self::with_collaborators(
            config,
            transport,
            Arc::new(Sgp4PassSource),
            Arc::new(SystemClock),
        ))
    }

    pub fn with_collaborators(
        config: Config,
        transport: Arc<dyn Transport>,
        pass_source: Arc<dyn PassSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let caches = &config.cache;
        let policy = |c| CachePolicy::from(c);
        Self {
            gateway: Gateway::new(&config, transport),
            pass_source,
            names: Memo::with_clock("satellite_names", policy(caches.satellite_names), clock.clone()),
            norad_ids: Memo::with_clock("norad_ids", policy(caches.norad_ids), clock.clone()),
            elements: Memo::with_clock("elements", policy(caches.elements), clock.clone()),
            locations: Memo::with_clock("locations", policy(caches.geocode), clock.clone()),
            weather: Memo::with_clock("weather", policy(caches.weather), clock),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn satellite_name(&self, norad_id: &str) -> TransitResult<String> {
        self.names
            .get_or_try_fetch(norad_id.to_string(), || {
                self.gateway.resolve_name_from_catalog_id(norad_id)
            })
            .await
    }

    pub async fn norad_ids(&self, name: &str) -> TransitResult<Vec<String>> {
        self.norad_ids
            .get_or_try_fetch(name.to_string(), || self.gateway.resolve_ids_from_name(name))
            .await
    }

    pub async fn elements(&self, norad_id: &str) -> TransitResult<ElementSet> {
        self.elements
            .get_or_try_fetch(norad_id.to_string(), || self.gateway.fetch_elements(norad_id))
            .await
    }

    pub async fn coordinates(&self, location_name: &str) -> TransitResult<(String, String)> {
        self.locations
            .get_or_try_fetch(location_name.to_string(), || {
                self.gateway.geocode(location_name)
            })
            .await
    }

    /// Cloud cover forecast, or a description of why there is none.
    pub async fn weather_forecast(&self, latitude: f64, longitude: f64, at: NaiveDateTime) -> String {
        let key = WeatherKey {
            latitude_bits: latitude.to_bits(),
            longitude_bits: longitude.to_bits(),
            at,
        };
        let result = self
            .weather
            .get_or_try_fetch(key, || {
                self.gateway.cloud_cover_forecast(latitude, longitude, at)
            })
            .await;

        match result {
            Ok(summary) => summary,
            Err(reason) => {
                log::warn!("weather at {},{} for {}: {}", latitude, longitude, at, reason);
                reason.to_string()
            }
        }
    }

    /// Visibility windows for the next day. Fails only if the element set
    /// cannot be obtained or propagated.
    pub async fn transits(
        &self,
        norad_id: &str,
        latitude: f64,
        longitude: f64,
        min_elevation: f64,
        include_weather: bool,
    ) -> TransitResult<Vec<VisibilityWindow>> {
        let elements = self.elements(norad_id).await?;
        let observer = ObserverPosition::new(latitude, longitude);
        let weather: Option<&dyn WeatherLookup> = if include_weather { Some(self) } else { None };

        let windows = compute_transits(
            self.pass_source.as_ref(),
            weather,
            &elements,
            &observer,
            min_elevation,
            Utc::now(),
        )
        .await?;

        log::info!(
            "{}: {} windows above {}° for ({}, {})",
            norad_id,
            windows.len(),
            min_elevation,
            latitude,
            longitude
        );
        Ok(windows)
    }
}

#[async_trait]
impl WeatherLookup for TransitContext {
    async fn forecast(&self, latitude: f64, longitude: f64, at: NaiveDateTime) -> String {
        self.weather_forecast(latitude, longitude, at).await
    }
}
