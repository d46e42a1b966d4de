use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::args::parse_args;
use super::{ParamSpec, ParamType, Tool, ToolError, TransitContext};

#[derive(Debug, Deserialize)]
struct LocationArgs {
    location_name: String,
}

pub struct LatitudeLongitudeFromLocationName;

#[async_trait]
impl Tool for LatitudeLongitudeFromLocationName {
    fn name(&self) -> &'static str {
        "get_latitude_longitude_from_location_name"
    }

    fn description(&self) -> &'static str {
        "Get the latitude and longitude of a place given its name, as \
         \"Latitude: X, Longitude: Y\". Raises ConfigurationError if GEOCODE_API_KEY is not set, \
         NoDataFoundError if the place is unknown, APIError if the request fails."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "location_name",
            ParamType::String,
            "The name of the location.",
        )]
    }

    async fn call(&self, ctx: &TransitContext, args: Value) -> Result<Value, ToolError> {
        let args: LocationArgs = parse_args(self.name(), args)?;
        let (latitude, longitude) = ctx.coordinates(&args.location_name).await?;
        Ok(Value::String(format!(
            "Latitude: {}, Longitude: {}",
            latitude, longitude
        )))
    }
}
