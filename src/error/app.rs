use super::{CloudError, ConfigError};
use thiserror::Error;

/// Failures that stop the service from starting.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to build cloud client: {0}")]
    Cloud(#[from] CloudError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
