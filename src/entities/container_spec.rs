use super::ServerConfiguration;
use crate::{
    config::{Settings, DATA_MOUNT_PATH},
    error::ConfigError,
};
use std::fmt;

/// Variables submitted as secure values, hidden when the group is read back.
const SECURE_VARIABLES: [&str; 4] = ["SRCDS_TOKEN", "CS2_PW", "TV_PW", "TV_RELAY_PW"];

pub const CONTAINER_NAME: &str = "cs2-container";
pub const VOLUME_NAME: &str = "cs2data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub port: u16,
    pub protocol: Protocol,
}

#[derive(Clone, PartialEq, Eq)]
pub struct EnvironmentVariable {
    pub name: &'static str,
    pub value: String,
    pub secure: bool,
}

impl fmt::Debug for EnvironmentVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.secure {
            "<redacted>"
        } else {
            self.value.as_str()
        };

        f.debug_struct("EnvironmentVariable")
            .field("name", &self.name)
            .field("value", &value)
            .field("secure", &self.secure)
            .finish()
    }
}

/// Azure Files share mounted into the container for persistent game data.
#[derive(Clone, PartialEq, Eq)]
pub struct FileShareVolume {
    pub name: &'static str,
    pub share_name: String,
    pub storage_account_name: String,
    pub storage_account_key: String,
    pub mount_path: &'static str,
}

impl fmt::Debug for FileShareVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileShareVolume")
            .field("name", &self.name)
            .field("share_name", &self.share_name)
            .field("storage_account_name", &self.storage_account_name)
            .field("mount_path", &self.mount_path)
            .finish_non_exhaustive()
    }
}

/// Failed servers are not restarted by the platform; callers provision again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    Never,
}

/// Everything submitted to create one container group.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerGroupSpec {
    pub name: String,
    pub location: String,
    pub image: String,
    pub cpu: f64,
    pub memory_gb: f64,
    pub ports: Vec<PortSpec>,
    pub environment: Vec<EnvironmentVariable>,
    pub volume: FileShareVolume,
    pub restart_policy: RestartPolicy,
}

impl ContainerGroupSpec {
    pub fn compose(
        name: String,
        location: String,
        config: &ServerConfiguration,
        settings: &Settings,
        storage_key: String,
    ) -> Result<Self, ConfigError> {
        let ports = vec![
            PortSpec {
                port: config.game_port()?,
                protocol: Protocol::Udp,
            },
            PortSpec {
                port: config.tv_port()?,
                protocol: Protocol::Udp,
            },
            PortSpec {
                port: config.rcon_port()?,
                protocol: Protocol::Tcp,
            },
        ];

        let environment = config
            .to_environment()
            .into_iter()
            .map(|(name, value)| EnvironmentVariable {
                name,
                value,
                secure: SECURE_VARIABLES.contains(&name),
            })
            .collect();

        Ok(Self {
            name,
            location,
            image: settings.image.clone(),
            cpu: settings.cpu,
            memory_gb: settings.memory_gb,
            ports,
            environment,
            volume: FileShareVolume {
                name: VOLUME_NAME,
                share_name: settings.file_share.clone(),
                storage_account_name: settings.storage_account.clone(),
                storage_account_key: storage_key,
                mount_path: DATA_MOUNT_PATH,
            },
            restart_policy: RestartPolicy::Never,
        })
    }

    #[cfg(test)]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.environment
            .iter()
            .find(|variable| variable.name == name)
            .map(|variable| variable.value.as_str())
    }
}
