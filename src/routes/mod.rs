use crate::{
    controllers::{create_server, health},
    error::ProvisionError,
    response::ApiErrorResponse,
    states::GlobalState,
};
use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    BoxError, Router,
};
use std::time::Duration;
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tracing::warn;

#[inline(always)]
async fn handle(error: BoxError) -> Response {
    if error.is::<Elapsed>() {
        warn!("Request timed out, provisioning abandoned");
        return ProvisionError::Cancelled.into_response();
    }

    ApiErrorResponse::send(StatusCode::INTERNAL_SERVER_ERROR, None)
}

pub(crate) fn routes(state: GlobalState, timeout: Duration) -> Router {
    Router::new()
        .route("/", post(create_server))
        .route("/api/CreateCS2Server", post(create_server))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle))
                .timeout(timeout),
        )
        .with_state(state)
}
