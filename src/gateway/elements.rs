use super::{build_url, Gateway};
use crate::error::{TransitError, TransitResult};
use crate::predict::ElementSet;

/// Marker CelesTrak puts in the body when it has no elements for a number.
const NO_DATA_SENTINEL: &str = "No data found";

impl Gateway {
    /// Current two-line elements for `norad_id`, with carriage returns and
    /// trailing whitespace removed.
    pub async fn fetch_elements(&self, norad_id: &str) -> TransitResult<ElementSet> {
        let url = build_url(&self.gp_url, &[("CATNR", norad_id)])?;
        let response = self.get(&url).await?;
        if !response.is_success() {
            return Err(TransitError::Api(format!(
                "Unable to fetch TLE for NORAD ID {}. Status code: {}",
                norad_id, response.status
            )));
        }
        if response.body.contains(NO_DATA_SENTINEL) {
            return Err(TransitError::NoDataFound(format!(
                "No TLE data found for NORAD ID {}",
                norad_id
            )));
        }

        Ok(ElementSet::new(norad_id, normalize_tle(&response.body)))
    }
}

fn normalize_tle(raw: &str) -> String {
    raw.replace('\r', "").trim_end().to_string()
}
