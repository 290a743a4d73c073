//! Azure Resource Manager wire formats.

use super::AccessToken;
use crate::entities::{
    ContainerGroupSpec, EnvironmentVariable, PortSpec, Protocol, RestartPolicy, CONTAINER_NAME,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ContainerGroupBody<'a> {
    location: &'a str,
    properties: ContainerGroupProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContainerGroupProperties<'a> {
    containers: Vec<Container<'a>>,
    os_type: &'static str,
    restart_policy: &'static str,
    ip_address: IpAddress,
    volumes: Vec<Volume<'a>>,
}

#[derive(Debug, Serialize)]
struct Container<'a> {
    name: &'static str,
    properties: ContainerProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContainerProperties<'a> {
    image: &'a str,
    resources: Resources,
    ports: Vec<Port>,
    environment_variables: Vec<EnvVar<'a>>,
    volume_mounts: Vec<VolumeMount<'a>>,
}

#[derive(Debug, Serialize)]
struct Resources {
    requests: ResourceRequests,
}

#[derive(Debug, Serialize)]
struct ResourceRequests {
    cpu: f64,
    #[serde(rename = "memoryInGB")]
    memory_in_gb: f64,
}

#[derive(Debug, Serialize)]
struct Port {
    port: u16,
    protocol: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvVar<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secure_value: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct IpAddress {
    #[serde(rename = "type")]
    kind: &'static str,
    ports: Vec<Port>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Volume<'a> {
    name: &'a str,
    azure_file: AzureFileVolume<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AzureFileVolume<'a> {
    share_name: &'a str,
    storage_account_name: &'a str,
    storage_account_key: &'a str,
    read_only: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VolumeMount<'a> {
    name: &'a str,
    mount_path: &'a str,
    read_only: bool,
}

impl From<&PortSpec> for Port {
    fn from(spec: &PortSpec) -> Self {
        Self {
            port: spec.port,
            protocol: match spec.protocol {
                Protocol::Udp => "UDP",
                Protocol::Tcp => "TCP",
            },
        }
    }
}

impl<'a> From<&'a EnvironmentVariable> for EnvVar<'a> {
    fn from(variable: &'a EnvironmentVariable) -> Self {
        let value = Some(variable.value.as_str());

        if variable.secure {
            Self {
                name: variable.name,
                value: None,
                secure_value: value,
            }
        } else {
            Self {
                name: variable.name,
                value,
                secure_value: None,
            }
        }
    }
}

impl<'a> From<&'a ContainerGroupSpec> for ContainerGroupBody<'a> {
    fn from(spec: &'a ContainerGroupSpec) -> Self {
        let container = Container {
            name: CONTAINER_NAME,
            properties: ContainerProperties {
                image: &spec.image,
                resources: Resources {
                    requests: ResourceRequests {
                        cpu: spec.cpu,
                        memory_in_gb: spec.memory_gb,
                    },
                },
                ports: spec.ports.iter().map(Port::from).collect(),
                environment_variables: spec.environment.iter().map(EnvVar::from).collect(),
                volume_mounts: vec![VolumeMount {
                    name: spec.volume.name,
                    mount_path: spec.volume.mount_path,
                    read_only: false,
                }],
            },
        };

        Self {
            location: &spec.location,
            properties: ContainerGroupProperties {
                containers: vec![container],
                os_type: "Linux",
                restart_policy: match spec.restart_policy {
                    RestartPolicy::Never => "Never",
                },
                ip_address: IpAddress {
                    kind: "Public",
                    ports: spec.ports.iter().map(Port::from).collect(),
                },
                volumes: vec![Volume {
                    name: spec.volume.name,
                    azure_file: AzureFileVolume {
                        share_name: &spec.volume.share_name,
                        storage_account_name: &spec.volume.storage_account_name,
                        storage_account_key: &spec.volume.storage_account_key,
                        read_only: false,
                    },
                }],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionList {
    #[serde(default)]
    pub value: Vec<Subscription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceGroupBody {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContainerGroupResponse {
    #[serde(default)]
    pub properties: Option<ContainerGroupState>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerGroupState {
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub ip_address: Option<IpAddressState>,
}

#[derive(Debug, Deserialize)]
pub struct IpAddressState {
    #[serde(default)]
    pub ip: Option<String>,
}

impl ContainerGroupResponse {
    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties.as_ref()?.provisioning_state.as_deref()
    }

    pub fn ip(&self) -> Option<String> {
        self.properties
            .as_ref()?
            .ip_address
            .as_ref()?
            .ip
            .clone()
            .filter(|ip| !ip.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct AsyncOperation {
    pub status: String,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Token endpoints disagree on expiry fields: AAD sends `expires_in` as a
/// number, managed identity sends `expires_on` as a string of epoch seconds.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
    #[serde(default)]
    expires_on: Option<Value>,
}

impl TokenResponse {
    pub fn into_access_token(self) -> AccessToken {
        let expires_on = self
            .expires_on
            .as_ref()
            .and_then(seconds)
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
            .or_else(|| {
                self.expires_in
                    .as_ref()
                    .and_then(seconds)
                    .map(|secs| Utc::now() + Duration::seconds(secs))
            });

        AccessToken {
            token: self.access_token,
            expires_on,
        }
    }
}

fn seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
