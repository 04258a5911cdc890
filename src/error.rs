use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    /// The webhook payload could not be used: unparseable body or missing
    /// call identifier.
    InvalidPayload(&'static str),
    /// The backing store failed to insert or query.
    Storage(&'static str),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AppError::InvalidPayload(msg) => write!(f, "{}", msg),
            AppError::Storage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
