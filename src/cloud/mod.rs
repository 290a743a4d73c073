//! Narrow, mockable boundary to the container platform. The provisioner only
//! ever talks to these traits; `azure` and `credential` implement them
//! against Azure Resource Manager.

mod azure;
mod credential;
mod models;
#[cfg(test)]
pub(crate) mod testing;

pub use azure::{AzureResourceManager, MANAGEMENT_ENDPOINT};
pub use credential::{ChainedCredential, IMDS_ENDPOINT};

use crate::{config::Environment, entities::ContainerGroupSpec, error::CloudError};
use axum::async_trait;
use chrono::{DateTime, Utc};
use std::{fmt, sync::Arc, time::Duration};

const USER_AGENT: &str = concat!("cs2-provisioner/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Bearer token for the management plane.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_on", &self.expires_on)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    pub subscription_id: String,
    pub name: String,
    pub location: String,
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credential(&self) -> Result<AccessToken, CloudError>;
}

#[async_trait]
pub trait ResourceGroupResolver: Send + Sync {
    async fn resource_group(
        &self,
        credential: &AccessToken,
        name: &str,
    ) -> Result<ResourceGroup, CloudError>;
}

/// Creates or updates a container group and returns once the platform
/// reports a terminal state. Dropping the future abandons the wait.
#[async_trait]
pub trait ContainerGroupSubmitter: Send + Sync {
    async fn create_or_update(
        &self,
        credential: &AccessToken,
        group: &ResourceGroup,
        spec: &ContainerGroupSpec,
    ) -> Result<(), CloudError>;
}

#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// `Ok(None)` when the group exists but has no IP assigned yet.
    async fn ip_address(
        &self,
        credential: &AccessToken,
        group: &ResourceGroup,
        name: &str,
    ) -> Result<Option<String>, CloudError>;
}

#[derive(Clone)]
pub struct Capabilities {
    pub credentials: Arc<dyn CredentialProvider>,
    pub resource_groups: Arc<dyn ResourceGroupResolver>,
    pub submitter: Arc<dyn ContainerGroupSubmitter>,
    pub addresses: Arc<dyn AddressResolver>,
}

impl Capabilities {
    pub fn azure(
        subscription_id: Option<String>,
        env: Arc<dyn Environment>,
    ) -> Result<Self, CloudError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let arm = Arc::new(AzureResourceManager::new(
            client.clone(),
            MANAGEMENT_ENDPOINT,
            subscription_id,
        ));

        Ok(Self {
            credentials: Arc::new(ChainedCredential::new(client, env, IMDS_ENDPOINT)),
            resource_groups: arm.clone(),
            submitter: arm.clone(),
            addresses: arm,
        })
    }
}
