use super::{build_url, plain_string, Gateway};
use crate::error::{TransitError, TransitResult};

impl Gateway {
    /// Latitude and longitude of the most important match for `location_name`,
    /// as the numeric strings upstream returned.
    pub async fn geocode(&self, location_name: &str) -> TransitResult<(String, String)> {
        let api_key = self
            .geocode_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                TransitError::Configuration(
                    "GEOCODE_API_KEY is not set in the environment variables.".into(),
                )
            })?;

        let url = build_url(&self.geocode_url, &[("q", location_name), ("api_key", api_key)])?;
        let response = self.get(&url).await?;
        if !response.is_success() {
            return Err(TransitError::Api(format!(
                "Unable to fetch location data. Status code: {}",
                response.status
            )));
        }

        let places: Vec<serde_json::Value> = serde_json::from_str(&response.body)
            .map_err(|e| TransitError::Api(format!("Unable to parse location data: {}", e)))?;

        // Results are ranked by descending importance.
        let best = places.first().ok_or_else(|| {
            TransitError::NoDataFound(format!("No location data found for '{}'.", location_name))
        })?;

        let coordinate = |field: &str| {
            best.get(field).and_then(plain_string).ok_or_else(|| {
                TransitError::Api(format!("Location result for '{}' has no {}", location_name, field))
            })
        };
        Ok((coordinate("lat")?, coordinate("lon")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::FakeTransport;
    use std::sync::Arc;

    const GEOCODE: &str = "https://geocode.maps.co/search";

    fn gateway(transport: Arc<FakeTransport>, api_key: Option<&str>) -> Gateway {
        let mut config = Config::default();
        config.geocode.api_key = api_key.map(String::from);
        Gateway::new(&config, transport)
    }

    #[tokio::test]
    async fn first_result_wins() {
        let body = r#"[
            {"lat": "38.8951", "lon": "-77.0364", "importance": 0.9},
            {"lat": "47.0000", "lon": "-120.0000", "importance": 0.4}
        ]"#;
        let transport = Arc::new(FakeTransport::new().respond(GEOCODE, 200, body));
        let coords = gateway(transport.clone(), Some("fake_api_key"))
            .geocode("Washington, DC")
            .await
            .unwrap();

        assert_eq!(coords, ("38.8951".to_string(), "-77.0364".to_string()));
        assert_eq!(
            transport.requests(),
            vec![format!("{}?q=Washington%2C+DC&api_key=fake_api_key", GEOCODE)]
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let transport = Arc::new(FakeTransport::new().respond(GEOCODE, 200, "[]"));
        let err = gateway(transport.clone(), None)
            .geocode("anywhere")
            .await
            .unwrap_err();

        assert!(matches!(err, TransitError::Configuration(ref m) if m.contains("GEOCODE_API_KEY is not set")));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn empty_result_is_no_data() {
        let transport = Arc::new(FakeTransport::new().respond(GEOCODE, 200, "[]"));
        let err = gateway(transport, Some("k"))
            .geocode("nonexistent")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransitError::NoDataFound("No location data found for 'nonexistent'.".into())
        );
    }

    #[tokio::test]
    async fn http_error() {
        let transport = Arc::new(FakeTransport::new().respond(GEOCODE, 401, "{}"));
        let err = gateway(transport, Some("k")).geocode("any").await.unwrap_err();
        assert_eq!(
            err,
            TransitError::Api("Unable to fetch location data. Status code: 401".into())
        );
    }
}
