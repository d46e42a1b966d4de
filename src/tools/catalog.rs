use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::args::{deserialize_id, parse_args};
use super::{ParamSpec, ParamType, Tool, ToolError, TransitContext};

#[derive(Debug, Deserialize)]
struct NoradIdArgs {
    #[serde(deserialize_with = "deserialize_id")]
    norad_id: String,
}

#[derive(Debug, Deserialize)]
struct NameArgs {
    name: String,
}

fn norad_id_param() -> ParamSpec {
    ParamSpec::required(
        "norad_id",
        ParamType::String,
        "The NORAD catalog ID of the satellite.",
    )
}

pub struct NameFromNoradId;

#[async_trait]
impl Tool for NameFromNoradId {
    fn name(&self) -> &'static str {
        "get_name_from_norad_id"
    }

    fn description(&self) -> &'static str {
        "Get the name of a satellite from its NORAD ID. \
         Raises NoDataFoundError if no active satellite has that ID, APIError if the catalog request fails."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![norad_id_param()]
    }

    async fn call(&self, ctx: &TransitContext, args: Value) -> Result<Value, ToolError> {
        let args: NoradIdArgs = parse_args(self.name(), args)?;
        let name = ctx.satellite_name(&args.norad_id).await?;
        Ok(Value::String(name))
    }
}

pub struct NoradIdFromName;

#[async_trait]
impl Tool for NoradIdFromName {
    fn name(&self) -> &'static str {
        "get_norad_id_from_name"
    }

    fn description(&self) -> &'static str {
        "Get the NORAD IDs of active satellites whose name contains the given text \
         (case-insensitive), as a comma separated list. \
         Raises NoDataFoundError if nothing matches, APIError if the catalog request fails."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "name",
            ParamType::String,
            "The name of the satellite, or part of it.",
        )]
    }

    async fn call(&self, ctx: &TransitContext, args: Value) -> Result<Value, ToolError> {
        let args: NameArgs = parse_args(self.name(), args)?;
        let ids = ctx.norad_ids(&args.name).await?;
        Ok(Value::String(ids.join(", ")))
    }
}

pub struct GetTle;

#[async_trait]
impl Tool for GetTle {
    fn name(&self) -> &'static str {
        "get_tle"
    }

    fn description(&self) -> &'static str {
        "Get the TLE (Two-Line Element set) for a satellite given its NORAD ID. \
         CelesTrak only updates TLEs every 2 hours, so results are cached for 2 hours. \
         Raises NoDataFoundError if there is no TLE for the ID, APIError if the request fails."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![norad_id_param()]
    }

    async fn call(&self, ctx: &TransitContext, args: Value) -> Result<Value, ToolError> {
        let args: NoradIdArgs = parse_args(self.name(), args)?;
        let elements = ctx.elements(&args.norad_id).await?;
        Ok(Value::String(elements.text().to_string()))
    }
}
