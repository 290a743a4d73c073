//! In-memory capabilities for exercising the provisioner without a cloud.

use super::{
    AccessToken, AddressResolver, Capabilities, ContainerGroupSubmitter, CredentialProvider,
    ResourceGroup, ResourceGroupResolver,
};
use crate::{entities::ContainerGroupSpec, error::CloudError};
use axum::async_trait;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

pub enum Submit {
    Succeed,
    Fail(&'static str),
    Hang,
}

pub struct FakeCloud {
    pub auth_error: Option<&'static str>,
    pub submit: Submit,
    pub address: Option<&'static str>,
    pub credential_calls: AtomicUsize,
    pub resolve_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub address_calls: AtomicUsize,
    pub submitted: Mutex<Option<ContainerGroupSpec>>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self {
            auth_error: None,
            submit: Submit::Succeed,
            address: Some("20.1.2.3"),
            credential_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            address_calls: AtomicUsize::new(0),
            submitted: Mutex::new(None),
        }
    }
}

impl FakeCloud {
    pub fn capabilities(self: &Arc<Self>) -> Capabilities {
        Capabilities {
            credentials: self.clone(),
            resource_groups: self.clone(),
            submitter: self.clone(),
            addresses: self.clone(),
        }
    }

    pub fn calls(&self) -> [usize; 4] {
        [
            self.credential_calls.load(Ordering::SeqCst),
            self.resolve_calls.load(Ordering::SeqCst),
            self.submit_calls.load(Ordering::SeqCst),
            self.address_calls.load(Ordering::SeqCst),
        ]
    }

    pub fn submitted(&self) -> Option<ContainerGroupSpec> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl CredentialProvider for FakeCloud {
    async fn credential(&self) -> Result<AccessToken, CloudError> {
        self.credential_calls.fetch_add(1, Ordering::SeqCst);

        match self.auth_error {
            Some(message) => Err(CloudError::CredentialUnavailable(message.to_string())),
            None => Ok(AccessToken {
                token: "token".to_string(),
                expires_on: None,
            }),
        }
    }
}

#[async_trait]
impl ResourceGroupResolver for FakeCloud {
    async fn resource_group(
        &self,
        _credential: &AccessToken,
        name: &str,
    ) -> Result<ResourceGroup, CloudError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);

        Ok(ResourceGroup {
            subscription_id: "subscription".to_string(),
            name: name.to_string(),
            location: "eastus".to_string(),
        })
    }
}

#[async_trait]
impl ContainerGroupSubmitter for FakeCloud {
    async fn create_or_update(
        &self,
        _credential: &AccessToken,
        _group: &ResourceGroup,
        spec: &ContainerGroupSpec,
    ) -> Result<(), CloudError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.submitted.lock() = Some(spec.clone());

        match self.submit {
            Submit::Succeed => Ok(()),
            Submit::Fail(message) => Err(CloudError::OperationFailed {
                state: "Failed".to_string(),
                message: message.to_string(),
            }),
            Submit::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl AddressResolver for FakeCloud {
    async fn ip_address(
        &self,
        _credential: &AccessToken,
        _group: &ResourceGroup,
        _name: &str,
    ) -> Result<Option<String>, CloudError> {
        self.address_calls.fetch_add(1, Ordering::SeqCst);

        Ok(self.address.map(str::to_string))
    }
}
