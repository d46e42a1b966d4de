use serde::Deserialize;

use super::{build_url, plain_string, Gateway};
use crate::error::{TransitError, TransitResult};

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(rename = "OBJECT_NAME")]
    object_name: String,
    #[serde(rename = "NORAD_CAT_ID")]
    norad_cat_id: serde_json::Value,
}

impl Gateway {
    /// Name of the active satellite with catalog number `norad_id`.
    pub async fn resolve_name_from_catalog_id(&self, norad_id: &str) -> TransitResult<String> {
        let records = self.query_catalog("CATNR", norad_id).await?;
        records
            .into_iter()
            .next()
            .map(|record| record.object_name)
            .ok_or_else(|| {
                TransitError::NoDataFound(format!("No satellite found for NORAD ID {}", norad_id))
            })
    }

    /// Catalog numbers of every active satellite whose name contains
    /// `name`, case-insensitively, in upstream order.
    ///
    /// The server-side NAME filter is loose, so results are filtered again here.
    pub async fn resolve_ids_from_name(&self, name: &str) -> TransitResult<Vec<String>> {
        let records = self.query_catalog("NAME", name).await?;
        let needle = name.to_lowercase();

        let ids: Vec<String> = records
            .iter()
            .filter(|record| record.object_name.to_lowercase().contains(&needle))
            .filter_map(|record| {
                let id = plain_string(&record.norad_cat_id);
                if id.is_none() {
                    log::debug!(
                        "skipping {}: unusable NORAD_CAT_ID {}",
                        record.object_name,
                        record.norad_cat_id
                    );
                }
                id
            })
            .collect();

        if ids.is_empty() {
            return Err(TransitError::NoDataFound(format!(
                "No satellite found with name containing '{}'",
                name
            )));
        }
        Ok(ids)
    }

    async fn query_catalog(&self, field: &str, value: &str) -> TransitResult<Vec<CatalogRecord>> {
        let url = build_url(
            &self.satcat_url,
            &[(field, value), ("ACTIVE", "true"), ("FORMAT", "json")],
        )?;
        let response = self.get(&url).await?;
        if !response.is_success() {
            return Err(TransitError::Api(format!(
                "Unable to fetch satellite data. Status code: {}",
                response.status
            )));
        }

        // CelesTrak answers a catalog miss with a plain-text notice rather than `[]`.
        let body = response.body.trim();
        if !body.starts_with('[') {
            log::debug!("catalog {}={} returned non-JSON body: {}", field, value, body);
            return Ok(Vec::new());
        }
        serde_json::from_str(body).map_err(|e| {
            TransitError::Api(format!("Unable to parse satellite data: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::FakeTransport;
    use std::sync::Arc;

    const SATCAT: &str = "https://celestrak.org/satcat/records.php";

    fn gateway(transport: Arc<FakeTransport>) -> Gateway {
        Gateway::new(&Config::default(), transport)
    }

    #[tokio::test]
    async fn name_from_id() {
        let transport = Arc::new(FakeTransport::new().respond(
            SATCAT,
            200,
            r#"[{"OBJECT_NAME": "ISS (ZARYA)", "NORAD_CAT_ID": 25544}]"#,
        ));
        let name = gateway(transport.clone())
            .resolve_name_from_catalog_id("25544")
            .await
            .unwrap();

        assert_eq!(name, "ISS (ZARYA)");
        assert_eq!(
            transport.requests(),
            vec![format!("{}?CATNR=25544&ACTIVE=true&FORMAT=json", SATCAT)]
        );
    }

    #[tokio::test]
    async fn name_from_id_http_error() {
        let transport = Arc::new(FakeTransport::new().respond(SATCAT, 500, ""));
        let err = gateway(transport)
            .resolve_name_from_catalog_id("25544")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransitError::Api("Unable to fetch satellite data. Status code: 500".into())
        );
    }

    #[tokio::test]
    async fn name_from_id_empty() {
        let transport = Arc::new(FakeTransport::new().respond(SATCAT, 200, "[]"));
        let err = gateway(transport)
            .resolve_name_from_catalog_id("99999")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransitError::NoDataFound("No satellite found for NORAD ID 99999".into())
        );
    }

    #[tokio::test]
    async fn ids_from_name_filters_locally() {
        let body = r#"[
            {"NORAD_CAT_ID": 25544, "OBJECT_NAME": "ISS (ZARYA)"},
            {"NORAD_CAT_ID": 58225, "OBJECT_NAME": "STARLINK-30169"},
            {"NORAD_CAT_ID": 49044, "OBJECT_NAME": "ISS (NAUKA)"}
        ]"#;
        let transport = Arc::new(FakeTransport::new().respond(SATCAT, 200, body));
        let ids = gateway(transport.clone())
            .resolve_ids_from_name("iss")
            .await
            .unwrap();

        assert_eq!(ids, vec!["25544", "49044"]);
        assert_eq!(
            transport.requests(),
            vec![format!("{}?NAME=iss&ACTIVE=true&FORMAT=json", SATCAT)]
        );
    }

    #[tokio::test]
    async fn ids_from_name_no_local_match() {
        let body = r#"[{"NORAD_CAT_ID": 58225, "OBJECT_NAME": "STARLINK-30169"}]"#;
        let transport = Arc::new(FakeTransport::new().respond(SATCAT, 200, body));
        let err = gateway(transport)
            .resolve_ids_from_name("nonexistent")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransitError::NoDataFound("No satellite found with name containing 'nonexistent'".into())
        );
    }

    #[tokio::test]
    async fn record_without_catalog_number_is_api_error() {
        let body = r#"[{"OBJECT_NAME": "ISS (ZARYA)"}]"#;
        let transport = Arc::new(FakeTransport::new().respond(SATCAT, 200, body));
        let err = gateway(transport)
            .resolve_ids_from_name("iss")
            .await
            .unwrap_err();
        assert!(matches!(err, TransitError::Api(msg) if msg.starts_with("Unable to parse satellite data")));
    }

    #[tokio::test]
    async fn null_catalog_number_is_skipped() {
        let body = r#"[
            {"NORAD_CAT_ID": null, "OBJECT_NAME": "ISS DEB"},
            {"NORAD_CAT_ID": "25544", "OBJECT_NAME": "ISS (ZARYA)"}
        ]"#;
        let transport = Arc::new(FakeTransport::new().respond(SATCAT, 200, body));
        let ids = gateway(transport).resolve_ids_from_name("iss").await.unwrap();
        assert_eq!(ids, vec!["25544"]);
    }

    #[tokio::test]
    async fn plain_text_miss_is_no_data() {
        let transport = Arc::new(FakeTransport::new().respond(SATCAT, 200, "No SATCAT records found"));
        let err = gateway(transport)
            .resolve_ids_from_name("nothing")
            .await
            .unwrap_err();
        assert!(matches!(err, TransitError::NoDataFound(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_api_error() {
        let transport = Arc::new(FakeTransport::new().fail(SATCAT, "connection refused"));
        let err = gateway(transport)
            .resolve_ids_from_name("iss")
            .await
            .unwrap_err();
        assert!(matches!(err, TransitError::Api(_)));
    }
}
