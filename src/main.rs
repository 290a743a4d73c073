use cloud::Capabilities;
use config::{init_tracing, Environment, ProcessEnvironment, Settings};
use dotenvy::dotenv;
use error::AppError;
use mimalloc::MiMalloc;
use services::Provisioner;
use states::GlobalState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod cloud;
mod config;
mod controllers;
mod entities;
mod error;
mod response;
mod routes;
mod services;
mod states;
mod utils;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(error) = run().await {
        error!("{}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let env: Arc<dyn Environment> = Arc::new(ProcessEnvironment);
    let settings = Arc::new(Settings::from_env(env.as_ref())?);
    let cloud = Capabilities::azure(settings.subscription_id.clone(), env.clone())?;

    let shutdown = CancellationToken::new();
    let state = GlobalState::new(
        Provisioner::new(settings.clone(), env, cloud),
        shutdown.clone(),
    );

    let listener = TcpListener::bind(settings.listen_addr).await?;
    info!(
        "Listening on {} (resource group {})",
        settings.listen_addr, settings.resource_group
    );

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
            shutdown.cancel();
        }
    });

    axum::serve(listener, routes::routes(state, settings.provision_timeout))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}
