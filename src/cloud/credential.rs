use super::{models::TokenResponse, AccessToken, CredentialProvider};
use crate::{config::Environment, error::CloudError};
use axum::async_trait;
use reqwest::{Client, Response};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";
const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";
const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
// IMDS is unreachable off Azure; fail fast instead of waiting for the client timeout.
const IMDS_TIMEOUT: Duration = Duration::from_secs(3);

/// Sources tried in order. Developer-machine sources (CLI, IDE caches,
/// interactive browser login) are never consulted.
#[derive(Debug, Clone, Copy)]
enum CredentialSource {
    ClientSecret,
    AppServiceIdentity,
    InstanceMetadata,
}

impl CredentialSource {
    const CHAIN: [CredentialSource; 3] = [
        CredentialSource::ClientSecret,
        CredentialSource::AppServiceIdentity,
        CredentialSource::InstanceMetadata,
    ];

    fn name(self) -> &'static str {
        match self {
            CredentialSource::ClientSecret => "client secret",
            CredentialSource::AppServiceIdentity => "app service managed identity",
            CredentialSource::InstanceMetadata => "instance metadata managed identity",
        }
    }
}

/// Non-interactive credential chain for a server context.
pub struct ChainedCredential {
    client: Client,
    env: Arc<dyn Environment>,
    imds_endpoint: String,
}

impl ChainedCredential {
    pub fn new(
        client: Client,
        env: Arc<dyn Environment>,
        imds_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            env,
            imds_endpoint: imds_endpoint.into(),
        }
    }

    /// `Ok(None)` when the source is not configured in this environment.
    async fn acquire(&self, source: CredentialSource) -> Result<Option<AccessToken>, CloudError> {
        let response = match source {
            CredentialSource::ClientSecret => {
                let (Some(tenant), Some(client_id), Some(secret)) = (
                    self.env.var("AZURE_TENANT_ID"),
                    self.env.var("AZURE_CLIENT_ID"),
                    self.env.var("AZURE_CLIENT_SECRET"),
                ) else {
                    return Ok(None);
                };

                let authority = self
                    .env
                    .var("AZURE_AUTHORITY_HOST")
                    .unwrap_or_else(|| DEFAULT_AUTHORITY.to_string());

                self.client
                    .post(format!(
                        "{}/{}/oauth2/v2.0/token",
                        authority.trim_end_matches('/'),
                        urlencoding::encode(&tenant)
                    ))
                    .form(&[
                        ("grant_type", "client_credentials"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", secret.as_str()),
                        ("scope", MANAGEMENT_SCOPE),
                    ])
                    .send()
                    .await?
            }
            CredentialSource::AppServiceIdentity => {
                let (Some(endpoint), Some(header)) = (
                    self.env.var("IDENTITY_ENDPOINT"),
                    self.env.var("IDENTITY_HEADER"),
                ) else {
                    return Ok(None);
                };

                let mut query = vec![
                    ("api-version", "2019-08-01".to_string()),
                    ("resource", MANAGEMENT_RESOURCE.to_string()),
                ];
                if let Some(client_id) = self.env.var("AZURE_CLIENT_ID") {
                    query.push(("client_id", client_id));
                }

                self.client
                    .get(endpoint)
                    .query(&query)
                    .header("X-IDENTITY-HEADER", header)
                    .send()
                    .await?
            }
            CredentialSource::InstanceMetadata => {
                let mut query = vec![
                    ("api-version", "2018-02-01".to_string()),
                    ("resource", MANAGEMENT_RESOURCE.to_string()),
                ];
                if let Some(client_id) = self.env.var("AZURE_CLIENT_ID") {
                    query.push(("client_id", client_id));
                }

                self.client
                    .get(&self.imds_endpoint)
                    .query(&query)
                    .header("Metadata", "true")
                    .timeout(IMDS_TIMEOUT)
                    .send()
                    .await?
            }
        };

        let token = token_from(source, response).await?;
        Ok(Some(token))
    }
}

async fn token_from(source: CredentialSource, response: Response) -> Result<AccessToken, CloudError> {
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CloudError::Api {
            operation: source.name(),
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json::<TokenResponse>().await?.into_access_token())
}

#[async_trait]
impl CredentialProvider for ChainedCredential {
    async fn credential(&self) -> Result<AccessToken, CloudError> {
        let mut failures = Vec::new();

        for source in CredentialSource::CHAIN {
            match self.acquire(source).await {
                Ok(Some(token)) => {
                    info!(
                        "Authenticated with {} (expires {:?})",
                        source.name(),
                        token.expires_on
                    );
                    return Ok(token);
                }
                Ok(None) => debug!("Credential source {} not configured", source.name()),
                Err(error) => {
                    debug!("Credential source {} failed: {}", source.name(), error);
                    failures.push(format!("{}: {}", source.name(), error));
                }
            }
        }

        Err(CloudError::CredentialUnavailable(failures.join("; ")))
    }
}
