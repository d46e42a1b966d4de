use axum::{routing::get, routing::post, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::protocol::McpServer;

use super::api::mcp as mcp_handlers;
use super::api::tools as tool_handlers;
use super::api_doc::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub server: McpServer,
}

pub fn router(server: McpServer) -> Router {
    let state = AppState { server };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Tool protocol
        .route("/mcp", post(mcp_handlers::rpc))
        // REST endpoints
        .route("/api/tools", get(tool_handlers::list_tools))
        .route("/api/tools/{name}", post(tool_handlers::call_tool))
        // OpenAPI
        .route(
            "/api-doc/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(server: McpServer, bind_addr: &str) -> std::io::Result<()> {
    let app = router(server);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await
}
