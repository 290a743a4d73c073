use super::{CloudError, ConfigError};
use crate::response::ApiErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} is not configured")]
    ServerMisconfigured(&'static str),
    #[error("Authentication failed: {0}")]
    UpstreamAuth(#[source] CloudError),
    #[error("Provisioning failed: {0}")]
    UpstreamProvisioning(#[source] CloudError),
    #[error("Container group {0} has no IP address")]
    AddressUnresolved(String),
    #[error("Provisioning was cancelled before it completed")]
    Cancelled,
}

impl ProvisionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProvisionError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProvisionError::ServerMisconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProvisionError::UpstreamAuth(_) => StatusCode::BAD_GATEWAY,
            ProvisionError::UpstreamProvisioning(_) => StatusCode::BAD_GATEWAY,
            ProvisionError::AddressUnresolved(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProvisionError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<ConfigError> for ProvisionError {
    fn from(error: ConfigError) -> Self {
        ProvisionError::BadRequest(error.to_string())
    }
}

impl IntoResponse for ProvisionError {
    fn into_response(self) -> Response {
        ApiErrorResponse::send(self.status_code(), Some(self.to_string()))
    }
}
