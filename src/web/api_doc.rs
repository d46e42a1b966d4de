use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use crate::predict::VisibilityWindow;
use crate::tools::ToolDescriptor;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::mcp::rpc,
        super::api::tools::list_tools,
        super::api::tools::call_tool,
    ),
    components(schemas(ToolDescriptor, VisibilityWindow, ErrorResponse)),
    info(
        title = "Transit-O-Mat API",
        description = "Satellite transit prediction tools over JSON-RPC and REST",
        version = "0.1.0"
    ),
    tags(
        (name = "protocol", description = "JSON-RPC tool protocol"),
        (name = "tools", description = "Direct tool invocation")
    )
)]
pub struct ApiDoc;
