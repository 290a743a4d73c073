use crate::{
    cloud::Capabilities,
    config::{Environment, Settings, STORAGE_KEY_VAR},
    entities::{ContainerGroupSpec, RawPayload, ServerConfiguration},
    error::{AppResult, ProvisionError},
    response::{ProvisionedServer, ServerPorts},
    utils::instance_name,
};
use std::{future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs one provisioning request end to end. Holds no per-request state, so a
/// single instance is shared by every handler.
#[derive(Clone)]
pub struct Provisioner {
    settings: Arc<Settings>,
    env: Arc<dyn Environment>,
    cloud: Capabilities,
}

impl Provisioner {
    pub fn new(settings: Arc<Settings>, env: Arc<dyn Environment>, cloud: Capabilities) -> Self {
        Self {
            settings,
            env,
            cloud,
        }
    }

    pub async fn provision(
        &self,
        payload: &RawPayload,
        cancel: &CancellationToken,
    ) -> AppResult<ProvisionedServer> {
        let config = ServerConfiguration::resolve(payload, self.env.as_ref())?;

        let Some(storage_key) = self.env.var(STORAGE_KEY_VAR) else {
            error!("{} is not set, refusing to provision", STORAGE_KEY_VAR);
            return Err(ProvisionError::ServerMisconfigured(STORAGE_KEY_VAR));
        };

        let credential = cancellable(cancel, self.cloud.credentials.credential())
            .await?
            .map_err(ProvisionError::UpstreamAuth)?;

        let group = cancellable(
            cancel,
            self.cloud
                .resource_groups
                .resource_group(&credential, &self.settings.resource_group),
        )
        .await?
        .map_err(ProvisionError::UpstreamAuth)?;

        let location = self
            .settings
            .location
            .clone()
            .unwrap_or_else(|| group.location.clone());
        let spec = ContainerGroupSpec::compose(
            instance_name(),
            location,
            &config,
            &self.settings,
            storage_key,
        )?;

        info!(
            "Creating container group {} ({}) in {}/{}",
            spec.name, config.server_name, group.name, spec.location
        );

        cancellable(
            cancel,
            self.cloud
                .submitter
                .create_or_update(&credential, &group, &spec),
        )
        .await?
        .map_err(|error| {
            warn!("Container group {} failed: {}", spec.name, error);
            ProvisionError::UpstreamProvisioning(error)
        })?;

        let ip = cancellable(
            cancel,
            self.cloud.addresses.ip_address(&credential, &group, &spec.name),
        )
        .await?
        .map_err(ProvisionError::UpstreamProvisioning)?
        .ok_or_else(|| ProvisionError::AddressUnresolved(spec.name.clone()))?;

        info!("Container group {} is up at {}", spec.name, ip);

        Ok(ProvisionedServer {
            server_name: config.server_name.clone(),
            instance_name: spec.name,
            ip,
            ports: ServerPorts {
                game_port: config.game_port()?,
                rcon_port: config.rcon_port()?,
                tv_port: config.tv_port()?,
            },
        })
    }
}

/// Races `future` against the request's cancellation. The losing future is
/// dropped, which aborts any in-flight HTTP call it owns.
async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> AppResult<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("Provisioning cancelled");
            Err(ProvisionError::Cancelled)
        }
        output = future => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cloud::testing::{FakeCloud, Submit},
        config::StaticEnvironment,
        entities::Protocol,
    };
    use serde_json::json;
    use std::time::Duration;

    fn environment(vars: &[(&str, &str)]) -> Arc<dyn Environment> {
        Arc::new(vars.iter().copied().collect::<StaticEnvironment>())
    }

    fn provisioner(fake: &Arc<FakeCloud>, env: Arc<dyn Environment>) -> Provisioner {
        let settings = Arc::new(Settings::from_env(env.as_ref()).unwrap());
        Provisioner::new(settings, env, fake.capabilities())
    }

    fn configured() -> Arc<dyn Environment> {
        environment(&[(STORAGE_KEY_VAR, "storage-key")])
    }

    fn payload(value: serde_json::Value) -> RawPayload {
        RawPayload::from_json(value)
    }

    #[tokio::test]
    async fn missing_token_is_bad_request_without_cloud_calls() {
        let fake = Arc::new(FakeCloud::default());

        let result = provisioner(&fake, configured())
            .provision(&payload(json!({})), &CancellationToken::new())
            .await;

        match result {
            Err(ProvisionError::BadRequest(message)) => {
                assert_eq!(message, "SRCDS_TOKEN is required")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fake.calls(), [0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn missing_storage_key_skips_authentication() {
        let fake = Arc::new(FakeCloud::default());

        let result = provisioner(&fake, environment(&[]))
            .provision(&payload(json!({ "SRCDS_TOKEN": "abc" })), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ProvisionError::ServerMisconfigured("AZURE_STORAGE_KEY"))
        ));
        assert_eq!(fake.calls(), [0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn token_from_environment_is_enough() {
        let fake = Arc::new(FakeCloud::default());
        let env = environment(&[(STORAGE_KEY_VAR, "storage-key"), ("SRCDS_TOKEN", "env-token")]);

        provisioner(&fake, env)
            .provision(&payload(json!({})), &CancellationToken::new())
            .await
            .unwrap();

        let spec = fake.submitted().unwrap();
        assert_eq!(spec.variable("SRCDS_TOKEN"), Some("env-token"));
    }

    #[tokio::test]
    async fn successful_provision_reports_address_and_ports() {
        let fake = Arc::new(FakeCloud::default());

        let server = provisioner(&fake, configured())
            .provision(
                &payload(json!({
                    "SRCDS_TOKEN": "abc",
                    "CS2_SERVERNAME": "MyServer",
                    "CS2_PORT": 28000,
                })),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(server.server_name, "MyServer");
        assert_eq!(server.ip, "20.1.2.3");
        assert_eq!(
            server.ports,
            ServerPorts {
                game_port: 28000,
                rcon_port: 27050,
                tv_port: 27020,
            }
        );
        assert_eq!(fake.calls(), [1, 1, 1, 1]);

        let spec = fake.submitted().unwrap();
        assert_eq!(spec.name, server.instance_name);
        assert_eq!(spec.location, "eastus");
        assert_eq!(spec.volume.storage_account_key, "storage-key");
        assert_eq!(spec.variable("CS2_SERVERNAME"), Some("MyServer"));
        assert_eq!(
            spec.ports
                .iter()
                .map(|port| (port.port, port.protocol))
                .collect::<Vec<_>>(),
            vec![
                (28000, Protocol::Udp),
                (27020, Protocol::Udp),
                (27050, Protocol::Tcp),
            ]
        );
    }

    #[tokio::test]
    async fn configured_location_overrides_group_location() {
        let fake = Arc::new(FakeCloud::default());
        let env = environment(&[(STORAGE_KEY_VAR, "storage-key"), ("AZURE_LOCATION", "westeurope")]);

        provisioner(&fake, env)
            .provision(&payload(json!({ "SRCDS_TOKEN": "abc" })), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(fake.submitted().unwrap().location, "westeurope");
    }

    #[tokio::test]
    async fn repeated_provisions_use_distinct_names() {
        let fake = Arc::new(FakeCloud::default());
        let provisioner = provisioner(&fake, configured());
        let body = payload(json!({ "SRCDS_TOKEN": "abc" }));

        let first = provisioner.provision(&body, &CancellationToken::new()).await.unwrap();
        let second = provisioner.provision(&body, &CancellationToken::new()).await.unwrap();

        assert_ne!(first.instance_name, second.instance_name);
    }

    #[tokio::test]
    async fn credential_failure_is_upstream_auth_error() {
        let fake = Arc::new(FakeCloud {
            auth_error: Some("no managed identity"),
            ..Default::default()
        });

        let result = provisioner(&fake, configured())
            .provision(&payload(json!({ "SRCDS_TOKEN": "abc" })), &CancellationToken::new())
            .await;

        match result {
            Err(error @ ProvisionError::UpstreamAuth(_)) => {
                assert!(error.to_string().contains("no managed identity"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fake.calls(), [1, 0, 0, 0]);
    }

    #[tokio::test]
    async fn submit_failure_skips_address_lookup() {
        let fake = Arc::new(FakeCloud {
            submit: Submit::Fail("quota exceeded"),
            ..Default::default()
        });

        let result = provisioner(&fake, configured())
            .provision(&payload(json!({ "SRCDS_TOKEN": "abc" })), &CancellationToken::new())
            .await;

        match result {
            Err(error @ ProvisionError::UpstreamProvisioning(_)) => {
                assert!(error.to_string().contains("quota exceeded"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fake.calls(), [1, 1, 1, 0]);
    }

    #[tokio::test]
    async fn missing_address_is_unresolved() {
        let fake = Arc::new(FakeCloud {
            address: None,
            ..Default::default()
        });

        let result = provisioner(&fake, configured())
            .provision(&payload(json!({ "SRCDS_TOKEN": "abc" })), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ProvisionError::AddressUnresolved(_))));
        assert_eq!(fake.calls(), [1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn cancellation_stops_waiting_for_submit() {
        let fake = Arc::new(FakeCloud {
            submit: Submit::Hang,
            ..Default::default()
        });
        let provisioner = provisioner(&fake, configured());
        let cancel = CancellationToken::new();
        let body = payload(json!({ "SRCDS_TOKEN": "abc" }));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            provisioner.provision(&body, &cancel),
        )
        .await
        .expect("provision kept waiting after cancellation");

        assert!(matches!(result, Err(ProvisionError::Cancelled)));
        assert_eq!(fake.calls(), [1, 1, 1, 0]);
    }

    #[tokio::test]
    async fn invalid_port_is_bad_request_before_submit() {
        let fake = Arc::new(FakeCloud::default());

        let result = provisioner(&fake, configured())
            .provision(
                &payload(json!({ "SRCDS_TOKEN": "abc", "CS2_PORT": "game" })),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(ProvisionError::BadRequest(_))));
        assert_eq!(fake.calls()[2], 0);
    }
}
