use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingRequiredField(&'static str),
    #[error("{key} must be {expected}, got {value:?}")]
    InvalidSetting {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}
