use super::{
    models::{
        AsyncOperation, ContainerGroupBody, ContainerGroupResponse, ErrorEnvelope,
        ResourceGroupBody, SubscriptionList,
    },
    AccessToken, AddressResolver, ContainerGroupSubmitter, ResourceGroup, ResourceGroupResolver,
};
use crate::{entities::ContainerGroupSpec, error::CloudError};
use axum::async_trait;
use reqwest::{
    header::{HeaderMap, RETRY_AFTER},
    Client, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

pub const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
const SUBSCRIPTIONS_API: &str = "2022-12-01";
const RESOURCE_GROUPS_API: &str = "2021-04-01";
const CONTAINER_INSTANCE_API: &str = "2023-05-01";
const ASYNC_OPERATION: &str = "Azure-AsyncOperation";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Container Instances client over the Azure Resource Manager REST API.
pub struct AzureResourceManager {
    client: Client,
    endpoint: String,
    subscription_id: Option<String>,
    poll_interval: Duration,
}

impl AzureResourceManager {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        subscription_id: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            subscription_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Delay between polls when the platform sends no `Retry-After`.
    #[cfg(test)]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn default_subscription(&self, credential: &AccessToken) -> Result<String, CloudError> {
        if let Some(id) = &self.subscription_id {
            return Ok(id.clone());
        }

        let list: SubscriptionList = self
            .fetch(
                "list subscriptions",
                self.client
                    .get(format!("{}/subscriptions", self.endpoint))
                    .query(&[("api-version", SUBSCRIPTIONS_API)]),
                credential,
            )
            .await?;

        list.value
            .into_iter()
            .find(|subscription| {
                subscription
                    .state
                    .as_deref()
                    .map_or(true, |state| state.eq_ignore_ascii_case("Enabled"))
            })
            .map(|subscription| subscription.subscription_id)
            .ok_or(CloudError::NoSubscription)
    }

    fn group_url(&self, group: &ResourceGroup, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ContainerInstance/containerGroups/{}",
            self.endpoint,
            urlencoding::encode(&group.subscription_id),
            urlencoding::encode(&group.name),
            urlencoding::encode(name),
        )
    }

    async fn container_group(
        &self,
        credential: &AccessToken,
        group: &ResourceGroup,
        name: &str,
    ) -> Result<ContainerGroupResponse, CloudError> {
        self.fetch(
            "get container group",
            self.client
                .get(self.group_url(group, name))
                .query(&[("api-version", CONTAINER_INSTANCE_API)]),
            credential,
        )
        .await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        credential: &AccessToken,
    ) -> Result<T, CloudError> {
        let response = request.bearer_auth(&credential.token).send().await?;

        Ok(check(operation, response).await?.json().await?)
    }

    /// Follows the `Azure-AsyncOperation` monitor until it leaves the
    /// in-progress states.
    async fn await_operation(
        &self,
        credential: &AccessToken,
        url: String,
        mut delay: Duration,
    ) -> Result<(), CloudError> {
        loop {
            tokio::time::sleep(delay).await;

            let response = self
                .client
                .get(&url)
                .bearer_auth(&credential.token)
                .send()
                .await?;
            let response = check("poll operation", response).await?;
            delay = retry_after(response.headers(), self.poll_interval);

            let operation: AsyncOperation = response.json().await?;
            debug!("Operation status {}", operation.status);

            match terminal(&operation.status) {
                Some(Ok(())) => return Ok(()),
                Some(Err(())) => {
                    return Err(CloudError::OperationFailed {
                        message: operation
                            .error
                            .map(|error| error.to_string())
                            .unwrap_or_default(),
                        state: operation.status,
                    })
                }
                None => continue,
            }
        }
    }

    /// Used when the platform returns no operation monitor: polls the group's
    /// own provisioning state.
    async fn await_group(
        &self,
        credential: &AccessToken,
        group: &ResourceGroup,
        name: &str,
        mut state: Option<String>,
    ) -> Result<(), CloudError> {
        loop {
            if let Some(current) = &state {
                debug!("Container group {} is {}", name, current);

                match terminal(current) {
                    Some(Ok(())) => return Ok(()),
                    Some(Err(())) => {
                        return Err(CloudError::OperationFailed {
                            state: current.clone(),
                            message: format!("container group {name} did not provision"),
                        })
                    }
                    None => {}
                }
            }

            tokio::time::sleep(self.poll_interval).await;
            state = self
                .container_group(credential, group, name)
                .await?
                .provisioning_state()
                .map(str::to_string);
        }
    }
}

#[async_trait]
impl ResourceGroupResolver for AzureResourceManager {
    async fn resource_group(
        &self,
        credential: &AccessToken,
        name: &str,
    ) -> Result<ResourceGroup, CloudError> {
        let subscription_id = self.default_subscription(credential).await?;

        let body: ResourceGroupBody = self
            .fetch(
                "get resource group",
                self.client
                    .get(format!(
                        "{}/subscriptions/{}/resourcegroups/{}",
                        self.endpoint,
                        urlencoding::encode(&subscription_id),
                        urlencoding::encode(name)
                    ))
                    .query(&[("api-version", RESOURCE_GROUPS_API)]),
                credential,
            )
            .await?;

        Ok(ResourceGroup {
            subscription_id,
            name: body.name,
            location: body.location,
        })
    }
}

#[async_trait]
impl ContainerGroupSubmitter for AzureResourceManager {
    async fn create_or_update(
        &self,
        credential: &AccessToken,
        group: &ResourceGroup,
        spec: &ContainerGroupSpec,
    ) -> Result<(), CloudError> {
        let response = self
            .client
            .put(self.group_url(group, &spec.name))
            .query(&[("api-version", CONTAINER_INSTANCE_API)])
            .bearer_auth(&credential.token)
            .json(&ContainerGroupBody::from(spec))
            .send()
            .await?;
        let response = check("create container group", response).await?;

        info!("Submitted container group {}", spec.name);

        let monitor = response
            .headers()
            .get(ASYNC_OPERATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let delay = retry_after(response.headers(), self.poll_interval);

        match monitor {
            Some(url) => self.await_operation(credential, url, delay).await,
            None => {
                let body: ContainerGroupResponse = response.json().await.unwrap_or_default();
                let state = body.provisioning_state().map(str::to_string);
                self.await_group(credential, group, &spec.name, state).await
            }
        }
    }
}

#[async_trait]
impl AddressResolver for AzureResourceManager {
    async fn ip_address(
        &self,
        credential: &AccessToken,
        group: &ResourceGroup,
        name: &str,
    ) -> Result<Option<String>, CloudError> {
        Ok(self.container_group(credential, group, name).await?.ip())
    }
}

/// `Some(Ok)` on success, `Some(Err)` on failure, `None` while running.
fn terminal(state: &str) -> Option<Result<(), ()>> {
    match state.to_ascii_lowercase().as_str() {
        "succeeded" => Some(Ok(())),
        "failed" | "canceled" | "cancelled" => Some(Err(())),
        _ => None,
    }
}

fn retry_after(headers: &HeaderMap, default: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_POLL_INTERVAL))
        .unwrap_or(default)
}

async fn check(operation: &'static str, response: Response) -> Result<Response, CloudError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.to_string(),
        Err(_) => body,
    };

    Err(CloudError::Api {
        operation,
        status: status.as_u16(),
        message,
    })
}
