use super::Environment;
use crate::error::ConfigError;
use std::{net::SocketAddr, str::FromStr, time::Duration};

pub const STORAGE_KEY_VAR: &str = "AZURE_STORAGE_KEY";
pub const DATA_MOUNT_PATH: &str = "/home/steam/cs2-dedicated";

/// Non-secret deployment settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub listen_addr: SocketAddr,
    pub provision_timeout: Duration,
    pub resource_group: String,
    pub subscription_id: Option<String>,
    pub location: Option<String>,
    pub image: String,
    pub cpu: f64,
    pub memory_gb: f64,
    pub storage_account: String,
    pub file_share: String,
}

impl Settings {
    pub fn from_env(env: &dyn Environment) -> Result<Self, ConfigError> {
        Ok(Self {
            listen_addr: parse_or(env, "LISTEN_ADDR", "a socket address", || {
                SocketAddr::from(([0, 0, 0, 0], 9000))
            })?,
            provision_timeout: Duration::from_secs(parse_or(
                env,
                "PROVISION_TIMEOUT_SECS",
                "a number of seconds",
                || 900,
            )?),
            resource_group: env
                .var("AZURE_RESOURCE_GROUP")
                .unwrap_or_else(|| "myResourceGroup".to_string()),
            subscription_id: env.var("AZURE_SUBSCRIPTION_ID"),
            location: env.var("AZURE_LOCATION"),
            image: env
                .var("CS2_IMAGE")
                .unwrap_or_else(|| "joedwards32/cs2".to_string()),
            cpu: parse_or(env, "CS2_CPU", "a number of cores", || 2.0)?,
            memory_gb: parse_or(env, "CS2_MEMORY_GB", "a number of GiB", || 2.0)?,
            storage_account: env
                .var("AZURE_STORAGE_ACCOUNT")
                .unwrap_or_else(|| "cs2storage".to_string()),
            file_share: env
                .var("AZURE_FILE_SHARE")
                .unwrap_or_else(|| "cs2data".to_string()),
        })
    }
}

fn parse_or<T: FromStr>(
    env: &dyn Environment,
    key: &'static str,
    expected: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match env.var(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidSetting {
            key,
            expected,
            value,
        }),
        None => Ok(default()),
    }
}
