use crate::{
    entities::RawPayload, error::AppResult, response::ProvisionedServer, states::GlobalState,
};
use axum::{body::Bytes, extract::State, Json};
use tracing::info;

pub(crate) async fn create_server(
    State(state): State<GlobalState>,
    body: Bytes,
) -> AppResult<Json<ProvisionedServer>> {
    info!("Received provisioning request");

    let payload = RawPayload::from_body(&body);

    // Fires when axum drops this future (client gone, request timeout).
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let server = state.provisioner.provision(&payload, &cancel).await?;

    Ok(Json(server))
}

#[inline(always)]
pub(crate) async fn health() -> &'static str {
    "OK"
}
