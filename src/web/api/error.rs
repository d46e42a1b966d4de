use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::TransitError;
use crate::tools::ToolError;

pub enum ApiError {
    BadRequest(String),
    UnknownTool(String),
    Transit(TransitError),
    Internal(String),
}

impl From<ToolError> for ApiError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::UnknownTool(name) => ApiError::UnknownTool(name),
            ToolError::InvalidArguments { .. } => ApiError::BadRequest(e.to_string()),
            ToolError::Transit(e) => ApiError::Transit(e),
            ToolError::Encode(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("invalid_arguments", &msg)),
            )
                .into_response(),
            ApiError::UnknownTool(name) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::with_message(
                    "unknown_tool",
                    &format!("unknown tool: {}", name),
                )),
            )
                .into_response(),
            ApiError::Transit(e) => {
                let status = match e {
                    TransitError::NoDataFound(_) => StatusCode::NOT_FOUND,
                    TransitError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
                    TransitError::Api(_) => StatusCode::BAD_GATEWAY,
                    TransitError::Propagation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (
                    status,
                    Json(ErrorResponse::with_message(e.kind(), &e.to_string())),
                )
                    .into_response()
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_message("internal_error", &msg)),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
