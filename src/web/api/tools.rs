use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::tools::ToolDescriptor;
use crate::web::api::error::{ApiError, ApiResult};
use crate::web::server::AppState;

#[utoipa::path(
    get,
    path = "/api/tools",
    tag = "tools",
    responses(
        (status = 200, description = "Registered tools with their argument schemas", body = Vec<ToolDescriptor>)
    )
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDescriptor>> {
    Json(state.server.registry().descriptors())
}

/// Invoke one tool with a JSON object of arguments as the body.
#[utoipa::path(
    post,
    path = "/api/tools/{name}",
    tag = "tools",
    params(
        ("name" = String, Path, description = "Tool name, e.g. get_transits")
    ),
    responses(
        (status = 200, description = "Tool result (a string, or a list of transit windows)"),
        (status = 400, description = "Invalid arguments", body = crate::web::api::error::ErrorResponse),
        (status = 404, description = "Unknown tool or no data found", body = crate::web::api::error::ErrorResponse),
        (status = 422, description = "Element set could not be propagated", body = crate::web::api::error::ErrorResponse),
        (status = 502, description = "Upstream request failed", body = crate::web::api::error::ErrorResponse),
        (status = 503, description = "Missing configuration", body = crate::web::api::error::ErrorResponse)
    )
)]
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: String,
) -> ApiResult<Json<Value>> {
    let args = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))?
    };

    let server = &state.server;
    let value = server
        .registry()
        .call(server.context(), &name, args)
        .await?;
    Ok(Json(value))
}
