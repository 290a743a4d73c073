use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiErrorResponse {
    #[serde(rename = "error")]
    message: String,
    #[serde(skip)]
    code: StatusCode,
}

impl ApiErrorResponse {
    pub fn send(code: StatusCode, message: Option<String>) -> Response {
        ApiErrorResponse {
            code,
            message: message.unwrap_or_else(|| "Internal Server Error".to_string()),
        }
        .into_response()
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}
