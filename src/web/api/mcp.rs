use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::web::server::AppState;

/// JSON-RPC over HTTP: one JSON-RPC 2.0 frame per request body.
#[utoipa::path(
    post,
    path = "/mcp",
    tag = "protocol",
    responses(
        (status = 200, description = "JSON-RPC 2.0 response"),
        (status = 202, description = "Notification accepted")
    )
)]
pub async fn rpc(State(state): State<AppState>, body: String) -> Response {
    match state.server.handle_line(&body).await {
        Some(reply) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            reply,
        )
            .into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
